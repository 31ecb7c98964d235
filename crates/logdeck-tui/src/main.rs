/*
[INPUT]:  CLI arguments, optional YAML configuration file, tracing events
[OUTPUT]: Interactive log viewer over the in-process log recorder
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use logdeck_core::{
    ItemTextPane, JsonPreferenceStore, LogFormatter, LogRecorder, LoggingPanel, UiQueue,
};
use logdeck_tui::{RecorderLayer, ViewerConfig, demo, tui};

const TEST_EXIT_AFTER_TICKS_ENV: &str = "LOGDECK_TUI_TEST_EXIT_AFTER_TICKS";

#[derive(Parser, Debug)]
#[command(name = "logdeck", version, about = "Live, filterable view over in-process logs")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Number of demo producer threads (overrides the config file)
    #[arg(long = "demo", value_name = "N")]
    demo: Option<usize>,
    /// Preference file for the log view settings
    #[arg(long = "prefs", value_name = "PATH")]
    prefs: Option<PathBuf>,
    #[arg(long = "record-call-sites")]
    record_call_sites: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let mut config = match &args.config_path {
        Some(path) => ViewerConfig::from_file(path).context("load config")?,
        None => ViewerConfig::default(),
    };
    if let Some(count) = args.demo {
        config.demo_producers = count;
    }
    if let Some(path) = args.prefs.clone() {
        config.preferences_path = Some(path);
    }
    config.record_calling_class |= args.record_call_sites;

    let recorder = LogRecorder::new();
    recorder.set_record_calling_class(config.record_calling_class);
    let _file_guard = init_tracing(&args.log_level, &recorder, &config)?;

    info!(
        config_path = ?args.config_path,
        demo_producers = config.demo_producers,
        record_calling_class = config.record_calling_class,
        "starting logdeck"
    );

    let formatter = Arc::new(build_formatter(&config));
    let (ui, queue) = UiQueue::new();
    let pane = ItemTextPane::new(tokio::runtime::Handle::current(), ui);
    let panel = LoggingPanel::new(recorder.clone(), formatter, pane);

    let shutdown = CancellationToken::new();
    let producers = demo::spawn_producers(&recorder, config.demo_producers, shutdown.clone());

    let exit_after_ticks = exit_after_ticks_from_env()?;
    let result = tui::run_tui(
        panel,
        queue,
        Duration::from_millis(config.tick_ms.max(1)),
        exit_after_ticks,
    )
    .await;

    shutdown.cancel();
    for handle in producers {
        if handle.join().is_err() {
            warn!("demo producer panicked");
        }
    }
    info!("logdeck stopped");
    result
}

/// Routes tracing into the recorder, plus a copy into `log_file` when set.
fn init_tracing(
    log_level: &str,
    recorder: &LogRecorder,
    config: &ViewerConfig,
) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .context("invalid log level")?;

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("log_file must name a file: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(RecorderLayer::new(recorder.clone()))
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

fn build_formatter(config: &ViewerConfig) -> LogFormatter {
    match config.resolved_preferences_path() {
        Some(path) => {
            info!(path = %path.display(), "using preference file");
            let store = Arc::new(JsonPreferenceStore::new(path));
            LogFormatter::with_preferences(store, config.preferences_key.clone())
        }
        None => {
            warn!("no preference location available; view settings are session-only");
            LogFormatter::new()
        }
    }
}

fn exit_after_ticks_from_env() -> Result<Option<u64>> {
    match std::env::var(TEST_EXIT_AFTER_TICKS_ENV) {
        Ok(value) => {
            let ticks = value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{TEST_EXIT_AFTER_TICKS_ENV} must be a number"))?;
            Ok(Some(ticks))
        }
        Err(_) => Ok(None),
    }
}
