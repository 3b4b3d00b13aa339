//! Structured tracing for the native client and the test server
//!
//! Traces are written as bunyan JSON, one object per line, so a run can be
//! inspected with `bunyan` or `jq`.

use anyhow::Context;
use chrono::{DateTime, Local};
use std::{
    fs::{create_dir_all, File},
    path::PathBuf,
};
use tracing::{subscriber::set_global_default, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, EnvFilter, Registry};

/// Used by the client when `RUST_LOG` is not set. The windowing stack is
/// only of interest when it warns.
pub const CLIENT_FILTER: &str =
    "info,car_notes_client_core=debug,eframe=warn,egui_glow=warn,winit=warn,zbus=warn";

/// Used by the test server when `RUST_LOG` is not set
pub const TEST_SERVER_FILTER: &str = "info,actix_server=warn,car_notes_test_helper=debug";

const TRACE_FOLDER: &str = "traces";

/// `RUST_LOG` if set and valid, otherwise `default_directives`
///
/// For the accepted directives see <https://docs.rs/tracing-subscriber/0.3.19/tracing_subscriber/filter/struct.EnvFilter.html#directives>
pub fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// Subscriber writing bunyan JSON tagged with `app_name` to `sink`
pub fn json_subscriber<Sink>(
    app_name: &str,
    default_directives: &str,
    sink: Sink,
) -> impl Subscriber + Sync + Send
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    Registry::default()
        .with(env_filter(default_directives))
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(app_name.to_string(), sink))
}

/// Sets the global subscriber and forwards `log` records to it
///
/// Fails if called more than once per process
pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) -> anyhow::Result<()> {
    LogTracer::init().context("failed to forward log records")?;
    set_global_default(subscriber).context("failed to set global subscriber")?;
    Ok(())
}

/// The file the traces of one run are written to
#[derive(Debug)]
pub struct TraceFile {
    pub file: File,
    pub path: PathBuf,
}

impl TraceFile {
    /// Creates `traces/<app_name>/<start time>_<process id>.jsonl`
    pub fn create(app_name: &str) -> anyhow::Result<Self> {
        let path = trace_file_path(app_name, Local::now(), std::process::id());
        if let Some(folder) = path.parent() {
            create_dir_all(folder)
                .with_context(|| format!("failed to create trace folder {folder:?}"))?;
        }
        let file = File::create(&path)
            .with_context(|| format!("failed to create trace file {path:?}"))?;
        Ok(Self { file, path })
    }
}

fn trace_file_path(app_name: &str, started: DateTime<Local>, process_id: u32) -> PathBuf {
    PathBuf::from(TRACE_FOLDER).join(app_name).join(format!(
        "{}_{process_id}.jsonl",
        started.format("%Y-%m-%d_%H-%M-%S")
    ))
}
