//! Shared helpers for the blobport binary.

pub mod progress;

use std::fs::File;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing with a console layer and a per-run file layer.
///
/// The returned guard must stay alive for the duration of the process or the
/// tail of the file log is lost.
pub fn init_tracing(log_path: &Path) -> std::io::Result<WorkerGuard> {
    let file = File::create(log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();

    Ok(guard)
}
