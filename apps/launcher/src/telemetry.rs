use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::paths::{ensure_dir, log_path};

pub const LOG_ENV: &str = "MELON_LOG";
const DEFAULT_FILTER: &str = "info";

/// Log lines go to `melon_client.log` under the melon home. Stderr gets a copy
/// with `--verbose`, or everything when the file cannot be opened.
pub fn init(verbose: bool) {
    let filter = build_filter(std::env::var(LOG_ENV).ok().as_deref());
    let (file_layer, file_error) = match open_log_file() {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(err) => (None, Some(err)),
    };
    let stderr_layer = (verbose || file_layer.is_none()).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    if let Some(err) = file_error {
        warn!("logging to stderr only: {err}");
    }
}

fn build_filter(raw: Option<&str>) -> EnvFilter {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

fn open_log_file() -> Result<File, String> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|err| format!("Failed to open {}: {err}", path.display()))
}
