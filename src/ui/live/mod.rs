pub mod config;
mod segments_view;

use std::{
    sync::mpsc::Receiver,
    time::{Duration, Instant},
};

use config::AppConfig;
use log::{error, warn};

use crate::{
    monitor::{MonitoringControl, PendingStart, PollOutput},
    render::DashboardState,
};

use super::default_visuals;

const REPAINT_INTERVAL_MS: u64 = 250;
const MAX_OUTPUTS_PER_REFRESH: usize = 10;
const MAX_TIME_PER_REFRESH_MS: u128 = 50;

/// `LiveMonitorApp` shows the segments a monitoring server reports, as a table and a load-time
/// chart.
///
/// In live mode it owns the [`MonitoringControl`] and drains the poll outputs the poller sends
/// over `output_receiver`. In replay mode both are absent and the dashboard is shown as loaded.
pub struct LiveMonitorApp {
    output_receiver: Option<Receiver<PollOutput>>,
    control: Option<MonitoringControl>,
    pending_start: Option<PendingStart>,
    dashboard: DashboardState,
    manifest_url: String,
    status: Option<String>,
    app_config: AppConfig,
    title: String,
}

impl LiveMonitorApp {
    pub fn new(
        control: MonitoringControl,
        output_receiver: Receiver<PollOutput>,
        app_config: AppConfig,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        cc.egui_ctx.set_visuals(default_visuals());
        Self::live(control, output_receiver, app_config)
    }

    pub fn replay(
        dashboard: DashboardState,
        app_config: AppConfig,
        title: String,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        cc.egui_ctx.set_visuals(default_visuals());
        Self {
            output_receiver: None,
            control: None,
            pending_start: None,
            dashboard,
            manifest_url: String::new(),
            status: None,
            app_config,
            title,
        }
    }

    pub(crate) fn live(
        control: MonitoringControl,
        output_receiver: Receiver<PollOutput>,
        app_config: AppConfig,
    ) -> Self {
        Self {
            output_receiver: Some(output_receiver),
            control: Some(control),
            pending_start: None,
            dashboard: DashboardState::with_chart_window(app_config.chart_window),
            manifest_url: app_config.last_manifest_url.clone(),
            status: None,
            title: "Segwatch".to_string(),
            app_config,
        }
    }

    /// Applies pending poll outputs, a bounded amount per frame so the UI never stalls.
    pub(crate) fn drain_outputs(&mut self) -> usize {
        let Some(receiver) = &self.output_receiver else {
            return 0;
        };

        let start_refresh = Instant::now();
        let mut outputs_processed = 0;
        while let Ok(output) = receiver.try_recv() {
            self.dashboard.apply(output);
            outputs_processed += 1;
            if outputs_processed >= MAX_OUTPUTS_PER_REFRESH
                || start_refresh.elapsed().as_millis() >= MAX_TIME_PER_REFRESH_MS
            {
                break;
            }
        }
        outputs_processed
    }

    /// Sends the start request off the UI thread. The outcome is picked up by
    /// [`Self::check_pending_start`] on a later frame.
    pub(crate) fn start_monitoring(&mut self) {
        let Some(control) = self.control.as_ref() else {
            return;
        };

        // failures are logged by the control
        match control.start_monitoring_in_background(&self.manifest_url) {
            Ok(pending) => {
                self.status = Some(format!("Starting {}", pending.manifest_url()));
                self.pending_start = Some(pending);
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    pub(crate) fn is_starting(&self) -> bool {
        self.pending_start.is_some()
    }

    pub(crate) fn check_pending_start(&mut self) {
        let Some(result) = self
            .pending_start
            .as_ref()
            .and_then(PendingStart::try_result)
        else {
            return;
        };
        let Some(pending) = self.pending_start.take() else {
            return;
        };

        match result {
            Ok(()) => {
                let manifest_url = pending.manifest_url().to_string();
                if let Some(control) = self.control.as_mut() {
                    control.accept_start(&manifest_url);
                }
                self.status = Some(format!("Monitoring {}", manifest_url));
                self.app_config.last_manifest_url = manifest_url;
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }
}

impl eframe::App for LiveMonitorApp {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let Some(control) = self.control.as_mut() else {
            return;
        };

        if !control.shutdown(Duration::from_millis(self.app_config.stop_grace_ms)) {
            warn!("Stop notification still pending at exit");
        }
        if let Err(e) = self.app_config.save() {
            error!("Error while saving config file: {}", e);
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_pending_start();
        self.drain_outputs();

        if let Some(outer_rect) = ctx.input(|is| is.viewport().outer_rect) {
            self.app_config.window_position = outer_rect.min.into();
        }

        self.controls_view(ctx);
        self.segments_view(ctx);

        // poll outputs arrive on another thread, check back for them
        ctx.request_repaint_after(Duration::from_millis(REPAINT_INTERVAL_MS));
    }
}
