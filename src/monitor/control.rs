use std::{
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender, TryRecvError},
    },
    thread,
    time::Duration,
};

use log::{error, info};

use crate::{SegwatchError, session::SessionId, validation::is_valid_url};

use super::{MonitorApi, PollMode, PollOutput, PollerHandle, send_stop_beacon, spawn_poller};

/// A start request sent with [`MonitoringControl::start_monitoring_in_background`].
pub struct PendingStart {
    manifest_url: String,
    result_rx: Receiver<Result<(), SegwatchError>>,
}

impl PendingStart {
    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    /// The server's answer, or `None` while the request is in flight. Never blocks.
    pub fn try_result(&self) -> Option<Result<(), SegwatchError>> {
        match self.result_rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SegwatchError::StartRequestLost {
                url: self.manifest_url.clone(),
            })),
        }
    }
}

/// Starts monitoring sessions on the server and owns the poller that follows them.
///
/// A control in session mode generates its session id once, at construction, and uses it for
/// every start, poll and stop request. A control in global mode never talks to
/// `/startMonitoring` or `/stopMonitoring`.
pub struct MonitoringControl {
    api: Arc<dyn MonitorApi>,
    mode: PollMode,
    poll_interval: Duration,
    output_sender: Sender<PollOutput>,
    writer_sender: Option<Sender<PollOutput>>,
    poller: Option<PollerHandle>,
    epoch: u64,
}

impl MonitoringControl {
    pub fn new(
        api: Arc<dyn MonitorApi>,
        poll_interval: Duration,
        output_sender: Sender<PollOutput>,
        writer_sender: Option<Sender<PollOutput>>,
    ) -> Self {
        Self::with_mode(
            api,
            PollMode::Session(SessionId::generate()),
            poll_interval,
            output_sender,
            writer_sender,
        )
    }

    /// A control for the deprecated `/monitor` endpoint without sessions.
    pub fn global(
        api: Arc<dyn MonitorApi>,
        poll_interval: Duration,
        output_sender: Sender<PollOutput>,
        writer_sender: Option<Sender<PollOutput>>,
    ) -> Self {
        Self::with_mode(
            api,
            PollMode::Global,
            poll_interval,
            output_sender,
            writer_sender,
        )
    }

    pub fn with_mode(
        api: Arc<dyn MonitorApi>,
        mode: PollMode,
        poll_interval: Duration,
        output_sender: Sender<PollOutput>,
        writer_sender: Option<Sender<PollOutput>>,
    ) -> Self {
        Self {
            api,
            mode,
            poll_interval,
            output_sender,
            writer_sender,
            poller: None,
            epoch: 0,
        }
    }

    pub fn mode(&self) -> &PollMode {
        &self.mode
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.mode.session_id()
    }

    pub fn api(&self) -> Arc<dyn MonitorApi> {
        self.api.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .as_ref()
            .is_some_and(|poller| !poller.is_finished())
    }

    /// Checks that a session can be started for `manifest_url` and returns the trimmed URL with
    /// the session id to send.
    fn start_request(&self, manifest_url: &str) -> Result<(String, SessionId), SegwatchError> {
        let PollMode::Session(session_id) = &self.mode else {
            error!("Cannot start a monitoring session in global polling mode");
            return Err(SegwatchError::UnsupportedInGlobalMode);
        };

        let manifest_url = manifest_url.trim();
        if !is_valid_url(manifest_url) {
            error!("Refusing to monitor invalid manifest URL '{}'", manifest_url);
            return Err(SegwatchError::InvalidManifestUrl {
                url: manifest_url.to_string(),
            });
        }
        Ok((manifest_url.to_string(), session_id.clone()))
    }

    /// Asks the server to monitor `manifest_url` and, once it accepts, polls for results.
    ///
    /// Invalid URLs are rejected before any request is made. A failed start leaves any poller
    /// from an earlier successful start untouched and establishes no new one. Blocks for the
    /// duration of the request, see [`Self::start_monitoring_in_background`] for the UI path.
    pub fn start_monitoring(&mut self, manifest_url: &str) -> Result<(), SegwatchError> {
        let (manifest_url, session_id) = self.start_request(manifest_url)?;
        self.api
            .start_monitoring(&manifest_url, &session_id)
            .inspect_err(|e| error!("Could not start monitoring {}: {}", manifest_url, e))?;
        self.accept_start(&manifest_url);
        Ok(())
    }

    /// Same checks as [`Self::start_monitoring`], but the request runs on its own thread.
    ///
    /// Nothing changes until the caller sees a successful [`PendingStart::try_result`] and
    /// hands the URL to [`Self::accept_start`].
    pub fn start_monitoring_in_background(
        &self,
        manifest_url: &str,
    ) -> Result<PendingStart, SegwatchError> {
        let (manifest_url, session_id) = self.start_request(manifest_url)?;
        let (result_tx, result_rx) = mpsc::channel();
        let api = self.api.clone();
        let request_url = manifest_url.clone();
        thread::spawn(move || {
            let result = api
                .start_monitoring(&request_url, &session_id)
                .inspect_err(|e| error!("Could not start monitoring {}: {}", request_url, e));
            // nobody is waiting if the start was superseded
            let _ = result_tx.send(result);
        });
        Ok(PendingStart {
            manifest_url,
            result_rx,
        })
    }

    /// Follows a session the server accepted: replaces any running poller with a new one.
    pub fn accept_start(&mut self, manifest_url: &str) {
        if let Some(session_id) = self.mode.session_id() {
            info!("Monitoring {} with session {}", manifest_url, session_id);
        }
        self.restart_poller();
    }

    /// Polls the deprecated global endpoint from now on. No start request is made.
    pub fn start_global_polling(&mut self) -> Result<(), SegwatchError> {
        if self.mode != PollMode::Global {
            return Err(SegwatchError::UnsupportedInSessionMode);
        }
        self.restart_poller();
        Ok(())
    }

    fn restart_poller(&mut self) {
        if let Some(previous) = self.poller.take() {
            previous.cancel();
        }
        self.epoch += 1;
        self.poller = Some(spawn_poller(
            self.api.clone(),
            self.mode.clone(),
            self.epoch,
            self.poll_interval,
            self.output_sender.clone(),
            self.writer_sender.clone(),
        ));
    }

    /// Teardown: cancels polling and, in session mode, notifies the server.
    ///
    /// The notification is attempted whether or not a session was ever started. Waits at most
    /// `grace` for it and returns whether the attempt completed in time.
    pub fn shutdown(&mut self, grace: Duration) -> bool {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        match &self.mode {
            PollMode::Session(session_id) => {
                send_stop_beacon(self.api.clone(), session_id.clone()).wait(grace)
            }
            PollMode::Global => true,
        }
    }
}
