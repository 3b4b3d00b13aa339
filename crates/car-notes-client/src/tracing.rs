//! Native runs write traces to a file unless `--stdout` is passed. If the
//! file cannot be created the traces go to stdout instead.

#[cfg(not(target_arch = "wasm32"))]
const APP_NAME: &str = "car-notes-client";

#[cfg(not(target_arch = "wasm32"))]
pub fn init(cli: &super::cli::Cli) -> anyhow::Result<()> {
    use anyhow::anyhow;
    use car_notes_shared::telemetry::{self, TraceFile, CLIENT_FILTER};

    if !cli.is_to_std_out {
        let to_file = TraceFile::create(APP_NAME).and_then(|trace| {
            let subscriber = telemetry::json_subscriber(APP_NAME, CLIENT_FILTER, trace.file);
            telemetry::init_subscriber(subscriber)?;
            Ok(trace.path)
        });
        match to_file {
            Ok(path) => {
                println!("Writing traces to {path:?}");
                return Ok(());
            }
            Err(e) => eprintln!("Failed to start tracing to file, using stdout: {e:#}"),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(telemetry::env_filter(CLIENT_FILTER))
        .try_init()
        .map_err(|e| anyhow!("Failed to start tracing. Error: {e}"))
}
