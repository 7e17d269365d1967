use std::{
    sync::{Arc, mpsc},
    thread,
    time::Duration,
};

use log::{info, warn};

use crate::session::SessionId;

use super::MonitorApi;

pub const DEFAULT_STOP_GRACE_MS: u64 = 500;

/// Pending stop notification sent with [`send_stop_beacon`].
pub struct StopBeacon {
    done_rx: mpsc::Receiver<()>,
}

impl StopBeacon {
    /// Gives the notification up to `grace` to finish. Returns whether the attempt completed,
    /// successfully or not.
    pub fn wait(&self, grace: Duration) -> bool {
        self.done_rx.recv_timeout(grace).is_ok()
    }
}

/// Fire-and-forget `/stopMonitoring` for `session_id` on a detached thread.
///
/// Nothing is retried and the response is not inspected beyond logging.
pub fn send_stop_beacon(api: Arc<dyn MonitorApi>, session_id: SessionId) -> StopBeacon {
    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        match api.stop_monitoring(&session_id) {
            Ok(()) => info!("Stopped monitoring session {}", session_id),
            Err(e) => warn!("Could not stop monitoring session {}: {}", session_id, e),
        }
        let _ = done_tx.send(());
    });
    StopBeacon { done_rx }
}
