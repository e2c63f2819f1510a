//! Subscriber setup: human-readable lines to stdout, plus an optional
//! daily-rolling file sink so a long-running walk still has a record
//! after the terminal scrolls away. Mirrors the stack `florestad`
//! carries (`tracing` + `tracing-subscriber` with `env-filter` +
//! `tracing-appender`), not its (unavailable) call site.

use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Returned guard must be held for the process lifetime: dropping it
/// stops the non-blocking file writer from flushing.
pub fn init(quiet: bool, log_dir: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if quiet { "warn" } else { "info" }));

    let stdout_layer = fmt::layer().with_target(false);

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "chain-pipeline.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);
            tracing_subscriber::registry().with(filter).with(stdout_layer).with(file_layer).init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stdout_layer).init();
            None
        }
    }
}
