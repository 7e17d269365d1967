use std::{
    sync::{
        Arc,
        mpsc::{self, RecvTimeoutError, Sender},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, error, info};

use crate::SegwatchError;

use super::{MonitorApi, PollMode, PollOutput};

/// Handle to a running poller thread.
///
/// Dropping the handle cancels the poller as well: the loop notices the closed cancellation
/// channel at its next wait.
pub struct PollerHandle {
    epoch: u64,
    cancel_tx: Sender<()>,
    join_handle: JoinHandle<Result<(), SegwatchError>>,
}

impl PollerHandle {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Asks the poller to stop. Does not wait for an in-flight request.
    pub fn cancel(&self) {
        // the poller may already have exited
        let _ = self.cancel_tx.send(());
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }

    /// Cancels the poller and waits for its thread to exit.
    pub fn join(self) -> Result<(), SegwatchError> {
        self.cancel();
        self.join_handle.join().unwrap_or_else(|_| {
            error!("Poller thread panicked");
            Ok(())
        })
    }
}

/// Starts polling on a new thread: one request right away, then one every `interval`.
///
/// Requests never overlap. The wait before the next tick is `interval` minus the time the
/// previous request took, so a slow request delays the next tick instead of stacking a second
/// one behind it. Failed ticks are logged and skipped; the schedule is unaffected.
pub fn spawn_poller(
    api: Arc<dyn MonitorApi>,
    mode: PollMode,
    epoch: u64,
    interval: Duration,
    output_sender: Sender<PollOutput>,
    writer_sender: Option<Sender<PollOutput>>,
) -> PollerHandle {
    let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
    let join_handle = thread::spawn(move || -> Result<(), SegwatchError> {
        info!("Polling {:?} every {:?} (epoch {})", mode, interval, epoch);
        let mut tick: u64 = 0;
        loop {
            tick += 1;
            let started = Instant::now();
            match api.fetch_segments(&mode) {
                Ok(segments) => {
                    debug!("Tick {}: fetched {} segments", tick, segments.len());
                    let output = PollOutput::new(epoch, tick, segments);
                    if let Some(ref writer_sender) = writer_sender
                        && let Err(e) = writer_sender.send(output.clone())
                    {
                        error!("Could not send poll output to recorder: {}", e);
                    }
                    output_sender.send(output).map_err(|e| {
                        error!("Dashboard is gone, stopping poller: {}", e);
                        SegwatchError::from(e)
                    })?;
                }
                Err(e) => error!("Tick {} failed: {}", tick, e),
            }

            let wait = interval.saturating_sub(started.elapsed());
            match cancel_rx.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("Poller for epoch {} stopped after {} ticks", epoch, tick);
                    return Ok(());
                }
            }
        }
    });

    PollerHandle {
        epoch,
        cancel_tx,
        join_handle,
    }
}
