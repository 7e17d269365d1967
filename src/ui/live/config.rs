use std::path::{Path, PathBuf};

use egui::Pos2;
use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::SegwatchError;
use crate::monitor::{
    DEFAULT_POLL_INTERVAL_MS,
    client::{DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SERVER_URL},
    lifecycle::DEFAULT_STOP_GRACE_MS,
};
use crate::render::DEFAULT_CHART_WINDOW;

const CONFIG_DIR_NAME: &str = "segwatch";
const CONFIG_FILE_NAME: &str = "config.json";

pub const MIN_POLL_INTERVAL_MS: u64 = 500;
pub const MAX_CHART_WINDOW: usize = 10_000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WindowPosition {
    pub x: f32,
    pub y: f32,
}

impl Default for WindowPosition {
    fn default() -> Self {
        Self { x: 0., y: 0. }
    }
}

impl From<WindowPosition> for Pos2 {
    fn from(value: WindowPosition) -> Self {
        Pos2::new(value.x, value.y)
    }
}

impl From<Pos2> for WindowPosition {
    fn from(value: Pos2) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub chart_window: usize,
    pub stop_grace_ms: u64,
    pub last_manifest_url: String,
    pub window_position: WindowPosition,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            chart_window: DEFAULT_CHART_WINDOW,
            stop_grace_ms: DEFAULT_STOP_GRACE_MS,
            last_manifest_url: String::new(),
            window_position: WindowPosition::default(),
        }
    }
}

impl AppConfig {
    fn default_path() -> Option<PathBuf> {
        Some(
            dirs::config_dir()?
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        )
    }

    pub fn from_local_file() -> Option<Self> {
        Self::from_path(&Self::default_path()?)
    }

    /// Reads a config file. Missing or unreadable files yield `None`, the latter with an error log.
    pub fn from_path(config_path: &Path) -> Option<Self> {
        if !config_path.exists() {
            return None;
        }
        let file = std::fs::File::open(config_path)
            .map_err(|e| error!("Could not open config file {:?}: {}", config_path, e))
            .ok()?;
        serde_json::from_reader(file)
            .map_err(|e| warn!("Ignoring unparsable config file {:?}: {}", config_path, e))
            .ok()
    }

    /// Pulls values from the config file or the command line back into a usable range: the
    /// poll interval has a floor so the server is never polled back to back, and the chart
    /// window is between 1 and [`MAX_CHART_WINDOW`].
    pub fn sanitized(mut self) -> Self {
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            warn!(
                "Poll interval of {} ms is too short, using {} ms",
                self.poll_interval_ms, MIN_POLL_INTERVAL_MS
            );
            self.poll_interval_ms = MIN_POLL_INTERVAL_MS;
        }
        let chart_window = self.chart_window.clamp(1, MAX_CHART_WINDOW);
        if chart_window != self.chart_window {
            warn!(
                "Chart window of {} is out of range, using {}",
                self.chart_window, chart_window
            );
            self.chart_window = chart_window;
        }
        self
    }

    pub fn save(&self) -> Result<(), SegwatchError> {
        let config_path = Self::default_path().ok_or(SegwatchError::NoConfigDir)?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), SegwatchError> {
        if let Some(config_dir) = config_path.parent()
            && !config_dir.exists()
        {
            std::fs::create_dir_all(config_dir)
                .map_err(|e| SegwatchError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| SegwatchError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| SegwatchError::ConfigSerializeError { source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = AppConfig {
            server_url: "http://monitor.example.com:8080".to_string(),
            poll_interval_ms: 1000,
            last_manifest_url: "https://example.com/stream.m3u8".to_string(),
            window_position: WindowPosition { x: 10., y: 20. },
            ..Default::default()
        };

        config.save_to(&config_path).unwrap();
        assert_eq!(AppConfig::from_path(&config_path), Some(config));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        let mut file = std::fs::File::create(&config_path).unwrap();
        write!(file, r#"{{"chart_window": 20}}"#).unwrap();

        let config = AppConfig::from_path(&config_path).unwrap();
        assert_eq!(config.chart_window, 20);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_unparsable_or_missing_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        assert_eq!(AppConfig::from_path(&config_path), None);

        std::fs::write(&config_path, "{ not json").unwrap();
        assert_eq!(AppConfig::from_path(&config_path), None);
    }

    #[test]
    fn test_sanitized_clamps_interval_and_window() {
        let config = AppConfig {
            poll_interval_ms: 0,
            chart_window: usize::MAX,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.poll_interval_ms, MIN_POLL_INTERVAL_MS);
        assert_eq!(config.chart_window, MAX_CHART_WINDOW);

        let config = AppConfig {
            chart_window: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.chart_window, 1);
        assert_eq!(AppConfig::default().sanitized(), AppConfig::default());
    }
}
