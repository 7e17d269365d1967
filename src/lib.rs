// Library interface for segwatch
// This allows integration tests to access internal modules

pub mod errors;
pub mod loader;
pub mod monitor;
pub mod render;
pub mod session;
pub mod ui;
pub mod validation;
pub mod writer;

// Re-export commonly used types
pub use errors::SegwatchError;
pub use monitor::{
    HttpMonitorClient, MonitorApi, MonitoringControl, PollMode, PollOutput, SegmentRecord,
};
pub use render::{DashboardState, LoadTimeChart, SegmentTable};
pub use session::SessionId;
