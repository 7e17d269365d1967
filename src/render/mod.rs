pub mod chart;
pub mod table;

use log::debug;

use crate::monitor::PollOutput;

pub use chart::{DEFAULT_CHART_WINDOW, LoadTimeChart};
pub use table::{SegmentRow, SegmentTable, escape_html, render_html_report};

/// Everything the dashboard shows, fed one poll output at a time.
#[derive(Clone, Debug, Default)]
pub struct DashboardState {
    table: SegmentTable,
    chart: LoadTimeChart,
    last_applied: Option<(u64, u64)>,
    polls_applied: usize,
    last_captured_at_ms: Option<u64>,
}

impl DashboardState {
    pub fn with_chart_window(chart_window: usize) -> Self {
        Self {
            chart: LoadTimeChart::with_capacity(chart_window),
            ..Default::default()
        }
    }

    /// Renders `output` into the table and the chart.
    ///
    /// Outputs that are not newer than the last applied one, by `(epoch, tick)`, are dropped so
    /// a late response can never overwrite fresher data. Returns whether `output` was applied.
    pub fn apply(&mut self, output: PollOutput) -> bool {
        let position = (output.epoch, output.tick);
        if self.last_applied.is_some_and(|last| position <= last) {
            debug!(
                "Dropping stale poll output {:?}, last applied {:?}",
                position, self.last_applied
            );
            return false;
        }

        self.table.replace(&output.segments);
        self.chart.update(&output.segments);
        self.last_applied = Some(position);
        self.last_captured_at_ms = Some(output.captured_at_ms);
        self.polls_applied += 1;
        true
    }

    pub fn table(&self) -> &SegmentTable {
        &self.table
    }

    pub fn chart(&self) -> &LoadTimeChart {
        &self.chart
    }

    pub fn polls_applied(&self) -> usize {
        self.polls_applied
    }

    pub fn last_captured_at_ms(&self) -> Option<u64> {
        self.last_captured_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::SegmentRecord;

    fn output(epoch: u64, tick: u64, urls: &[&str]) -> PollOutput {
        PollOutput::new(
            epoch,
            tick,
            urls.iter()
                .map(|url| SegmentRecord {
                    url: url.to_string(),
                    duration: 6.,
                    load_time: 0.5,
                    is_delayed: false,
                })
                .collect(),
        )
    }

    #[test]
    fn test_apply_feeds_table_and_chart() {
        let mut state = DashboardState::default();
        assert!(state.apply(output(1, 1, &["https://h/1.ts", "https://h/2.ts"])));
        assert_eq!(state.table().len(), 2);
        assert_eq!(state.chart().len(), 2);
        assert_eq!(state.polls_applied(), 1);
        assert!(state.last_captured_at_ms().is_some());
    }

    #[test]
    fn test_empty_poll_clears_table_but_keeps_chart() {
        let mut state = DashboardState::default();
        state.apply(output(1, 1, &["https://h/1.ts"]));
        assert!(state.apply(output(1, 2, &[])));
        assert!(state.table().is_empty());
        assert_eq!(state.chart().len(), 1);
    }

    #[test]
    fn test_stale_outputs_are_dropped() {
        let mut state = DashboardState::default();
        assert!(state.apply(output(1, 2, &["https://h/2.ts"])));
        assert!(!state.apply(output(1, 1, &["https://h/1.ts"])));
        assert!(!state.apply(output(1, 2, &["https://h/1.ts"])));
        assert_eq!(state.table().rows()[0].url, "https://h/2.ts");
        assert_eq!(state.polls_applied(), 1);
    }

    #[test]
    fn test_new_epoch_restarts_ticks() {
        let mut state = DashboardState::default();
        state.apply(output(1, 7, &["https://h/1.ts"]));
        assert!(state.apply(output(2, 1, &["https://h/9.ts"])));
        // a straggler from the cancelled poller
        assert!(!state.apply(output(1, 8, &["https://h/2.ts"])));
        assert_eq!(state.table().rows()[0].url, "https://h/9.ts");
    }

    #[test]
    fn test_chart_window_is_configurable() {
        let mut state = DashboardState::with_chart_window(1);
        state.apply(output(1, 1, &["https://h/1.ts", "https://h/2.ts"]));
        assert_eq!(state.chart().labels(), vec!["2".to_string()]);
    }
}
