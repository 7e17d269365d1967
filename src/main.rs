use std::{
    path::PathBuf,
    sync::{Arc, mpsc},
    thread,
    time::Duration,
};

use clap::{Args as ClapArgs, Parser, Subcommand};
use egui::Vec2;
use log::{error, info, warn};
use segwatch::{
    HttpMonitorClient, MonitoringControl, PollOutput, SegwatchError,
    loader::replay_recording,
    monitor::{MonitorApi, send_stop_beacon},
    render::render_html_report,
    ui::live::{LiveMonitorApp, config::AppConfig},
    writer,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Monitor a stream live through a segment monitoring server
    Live(LiveArgs),
    /// Show a recording made with `live --output`
    Load {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Write the last segment table of a recording as an HTML page
    Export {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
struct LiveArgs {
    /// Base URL of the monitoring server
    #[arg(short, long)]
    server: Option<String>,

    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Number of chunks kept on the load-time chart
    #[arg(short, long)]
    chart_window: Option<usize>,

    /// Manifest to start monitoring right away
    #[arg(short, long)]
    manifest: Option<String>,

    /// Record every poll to this JSON lines file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Poll the deprecated session-less endpoint instead of starting sessions
    #[arg(long, default_value_t = false)]
    global: bool,
}

fn app_config_with(args: &LiveArgs) -> AppConfig {
    let mut app_config = AppConfig::from_local_file().unwrap_or_default();
    if let Some(server) = &args.server {
        app_config.server_url = server.clone();
    }
    if let Some(interval_ms) = args.interval_ms {
        app_config.poll_interval_ms = interval_ms;
    }
    if let Some(chart_window) = args.chart_window {
        app_config.chart_window = chart_window;
    }
    app_config.sanitized()
}

fn live(args: LiveArgs) -> Result<(), SegwatchError> {
    let mut app_config = app_config_with(&args);
    let api: Arc<dyn MonitorApi> = Arc::new(HttpMonitorClient::new(
        &app_config.server_url,
        Duration::from_millis(app_config.request_timeout_ms),
    )?);
    let poll_interval = Duration::from_millis(app_config.poll_interval_ms);

    let (output_tx, output_rx) = mpsc::channel::<PollOutput>();

    // when recording, the poller sends every output to the writer channel as well
    let writer_tx = args.output.map(|output_file| {
        let (writer_tx, writer_rx) = mpsc::channel::<PollOutput>();
        thread::spawn(move || {
            if let Err(e) = writer::write_poll_outputs(&output_file, writer_rx) {
                error!("Recording to {:?} stopped: {}", output_file, e);
            }
        });
        writer_tx
    });

    let mut control = if args.global {
        let mut control = MonitoringControl::global(api, poll_interval, output_tx, writer_tx);
        control.start_global_polling()?;
        if args.manifest.is_some() {
            warn!("Ignoring --manifest, the global endpoint has no sessions");
        }
        control
    } else {
        MonitoringControl::new(api, poll_interval, output_tx, writer_tx)
    };

    if let Some(manifest_url) = args.manifest.filter(|_| !args.global) {
        if let Err(e) = control.start_monitoring(&manifest_url) {
            warn!("Starting without an active session: {}", e);
        }
        app_config.last_manifest_url = manifest_url;
    }

    let stop_grace = Duration::from_millis(app_config.stop_grace_ms);
    let interrupt_api = control.api();
    let interrupt_session = control.session_id().cloned();
    ctrlc::set_handler(move || {
        if let Some(session_id) = &interrupt_session
            && !send_stop_beacon(interrupt_api.clone(), session_id.clone()).wait(stop_grace)
        {
            warn!("Stop notification still pending at exit");
        }
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_inner_size(Vec2::new(900., 600.))
        .with_position(app_config.window_position.clone());

    eframe::run_native(
        "Segwatch",
        native_options,
        Box::new(|cc| {
            Ok(Box::new(LiveMonitorApp::new(
                control, output_rx, app_config, cc,
            )))
        }),
    )
    .expect("could not start app");
    Ok(())
}

fn recording_title(input: &PathBuf) -> String {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("Segwatch {}", file_name)
}

fn load(input: &PathBuf) -> Result<(), SegwatchError> {
    let app_config = AppConfig::from_local_file().unwrap_or_default().sanitized();
    let dashboard = replay_recording(input, app_config.chart_window)?;
    let title = recording_title(input);
    let app_name = title.clone();

    eframe::run_native(
        &app_name,
        eframe::NativeOptions::default(),
        Box::new(|cc| {
            Ok(Box::new(LiveMonitorApp::replay(
                dashboard, app_config, title, cc,
            )))
        }),
    )
    .expect("could not start app");
    Ok(())
}

fn export(input: &PathBuf, output: &PathBuf) -> Result<(), SegwatchError> {
    let dashboard = replay_recording(input, 1)?;
    let report = render_html_report(dashboard.table(), &recording_title(input));
    std::fs::write(output, report).map_err(|e| SegwatchError::ExportError { source: e })?;
    info!(
        "Exported {} segments from {:?} to {:?}",
        dashboard.table().len(),
        input,
        output
    );
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    match cli.command {
        Commands::Load { input } => {
            load(&input).expect("Error while loading recording");
        }
        Commands::Export { input, output } => {
            export(&input, &output).expect("Error while exporting recording");
        }
        Commands::Live(args) => live(args).expect("Error while monitoring"),
    };
}
