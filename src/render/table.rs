use std::fmt::Write;

use itertools::Itertools;

use crate::monitor::SegmentRecord;

const DELAYED_LABEL: &str = "Delayed";
const OK_LABEL: &str = "OK";

#[derive(Clone, Debug, PartialEq)]
pub struct SegmentRow {
    pub url: String,
    pub duration: f64,
    pub load_time: f64,
    pub delayed: bool,
}

impl SegmentRow {
    pub fn status_label(&self) -> &'static str {
        if self.delayed { DELAYED_LABEL } else { OK_LABEL }
    }
}

impl From<&SegmentRecord> for SegmentRow {
    fn from(record: &SegmentRecord) -> Self {
        Self {
            url: record.url.clone(),
            duration: record.duration,
            load_time: record.load_time,
            delayed: record.is_delayed,
        }
    }
}

/// Rows of the segment table. Every poll replaces the whole table.
#[derive(Clone, Debug, Default)]
pub struct SegmentTable {
    rows: Vec<SegmentRow>,
}

impl SegmentTable {
    pub fn replace(&mut self, records: &[SegmentRecord]) {
        self.rows.clear();
        self.rows.extend(records.iter().map(SegmentRow::from));
    }

    pub fn rows(&self) -> &[SegmentRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn delayed_count(&self) -> usize {
        self.rows.iter().filter(|row| row.delayed).count()
    }

    /// `<tr>` elements for a table body, one per row, with every value escaped.
    pub fn to_html_rows(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                let class = if row.delayed { r#" class="delayed""# } else { "" };
                let cells = [
                    row.url.clone(),
                    row.duration.to_string(),
                    row.load_time.to_string(),
                    row.status_label().to_string(),
                ]
                .iter()
                .map(|cell| format!("<td>{}</td>", escape_html(cell)))
                .join("");
                format!("<tr{class}>{cells}</tr>")
            })
            .join("\n")
    }
}

/// Escapes the five characters HTML reserves so server-provided text cannot inject markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Standalone HTML page with the current segment table.
pub fn render_html_report(table: &SegmentTable, title: &str) -> String {
    let mut page = String::new();
    let title = escape_html(title);
    // writing into a String cannot fail
    let _ = write!(
        page,
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
table {{ border-collapse: collapse; font-family: sans-serif; }}
td, th {{ border: 1px solid #ccc; padding: 4px 8px; }}
tr.delayed {{ background-color: #f2613f; color: #fff; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>{total} segments, {delayed} delayed</p>
<table id="segmentTable">
<thead><tr><th>URL</th><th>Duration</th><th>Load Time</th><th>Status</th></tr></thead>
<tbody>
{rows}
</tbody>
</table>
</body>
</html>
"#,
        total = table.len(),
        delayed = table.delayed_count(),
        rows = table.to_html_rows(),
    );
    page
}
