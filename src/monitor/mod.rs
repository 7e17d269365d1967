pub mod client;
pub mod control;
pub mod lifecycle;
pub mod poller;

use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::session::SessionId;

pub use client::{HttpMonitorClient, MonitorApi};
pub use control::{MonitoringControl, PendingStart};
pub use lifecycle::{StopBeacon, send_stop_beacon};
pub use poller::{PollerHandle, spawn_poller};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 6000;

static CHUNK_INDEX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\.ts$").expect("chunk index pattern is a valid regex"));

/// One segment fetch measured by the monitoring server.
///
/// The canonical wire casing is `URL`/`Duration`/`LoadTime`/`IsDelayed`. The lower case names
/// served by the deprecated global endpoint are accepted when reading.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SegmentRecord {
    #[serde(rename = "URL", alias = "url")]
    pub url: String,
    /// Opaque to the client, seconds of media for HLS segments
    #[serde(rename = "Duration", alias = "duration")]
    pub duration: f64,
    /// Seconds the server took to fetch the segment
    #[serde(rename = "LoadTime", alias = "load_time")]
    pub load_time: f64,
    /// Set by the server when the fetch exceeded its delay threshold
    #[serde(rename = "IsDelayed", alias = "isDelayed")]
    pub is_delayed: bool,
}

impl SegmentRecord {
    pub fn chunk_index(&self) -> &str {
        chunk_index(&self.url)
    }
}

/// Extracts the digits right before a trailing `.ts`, falling back to the whole URL.
pub fn chunk_index(url: &str) -> &str {
    CHUNK_INDEX_REGEX
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map_or(url, |index| index.as_str())
}

/// Which `/monitor` contract the poller speaks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollMode {
    /// `/monitor?id=<session>`, only after the server accepted `/startMonitoring`
    Session(SessionId),
    /// Deprecated `/monitor` without a session, polled from startup
    Global,
}

impl PollMode {
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::Session(session_id) => Some(session_id),
            Self::Global => None,
        }
    }
}

/// A successful poll, as sent from the poller thread to the dashboard and to recordings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PollOutput {
    /// Identifies the poller that produced this output. Restarting monitoring bumps it.
    pub epoch: u64,
    /// 1-based poll number within the epoch
    pub tick: u64,
    pub captured_at_ms: u64,
    pub segments: Vec<SegmentRecord>,
}

impl PollOutput {
    pub fn new(epoch: u64, tick: u64, segments: Vec<SegmentRecord>) -> Self {
        let captured_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        Self {
            epoch,
            tick,
            captured_at_ms,
            segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_index_from_ts_segment() {
        assert_eq!(chunk_index("https://host/path/42.ts"), "42");
        assert_eq!(chunk_index("https://host/live/segment_00017.ts"), "00017");
    }

    #[test]
    fn test_chunk_index_falls_back_to_url() {
        assert_eq!(chunk_index("https://host/nofile"), "https://host/nofile");
        assert_eq!(chunk_index("https://host/init.mp4"), "https://host/init.mp4");
        assert_eq!(chunk_index("https://host/42.ts?token=1"), "https://host/42.ts?token=1");
    }

    #[test]
    fn test_decodes_canonical_casing() {
        let records: Vec<SegmentRecord> = serde_json::from_str(
            r#"[{"URL":"https://host/7.ts","Duration":6.0,"LoadTime":0.25,"IsDelayed":false}]"#,
        )
        .unwrap();
        assert_eq!(
            records,
            vec![SegmentRecord {
                url: "https://host/7.ts".to_string(),
                duration: 6.0,
                load_time: 0.25,
                is_delayed: false,
            }]
        );
        assert_eq!(records[0].chunk_index(), "7");
    }

    #[test]
    fn test_decodes_global_endpoint_casing() {
        let records: Vec<SegmentRecord> = serde_json::from_str(
            r#"[{"url":"https://host/8.ts","duration":4,"load_time":2.5,"isDelayed":true}]"#,
        )
        .unwrap();
        assert_eq!(records[0].url, "https://host/8.ts");
        assert_eq!(records[0].load_time, 2.5);
        assert!(records[0].is_delayed);
    }

    #[test]
    fn test_encodes_canonical_casing() {
        let record = SegmentRecord {
            url: "u".to_string(),
            duration: 1.0,
            load_time: 2.0,
            is_delayed: true,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["URL"], "u");
        assert_eq!(value["LoadTime"], 2.0);
        assert_eq!(value["IsDelayed"], true);
    }

    #[test]
    fn test_poll_mode_session_id() {
        let session_id = SessionId::from("abc");
        assert_eq!(
            PollMode::Session(session_id.clone()).session_id(),
            Some(&session_id)
        );
        assert_eq!(PollMode::Global.session_id(), None);
    }
}
