//! Tracing setup: console layer plus an optional JSON-lines file layer.

use crate::cli::FILE_GUARD;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Install the global subscriber. `RUST_LOG` overrides `level` when set.
pub fn init(level: &str, json_console: bool, file: Option<&str>) -> eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| eyre::eyre!("invalid log level {level:?}: {e}"))?;

    let console = if json_console {
        fmt::layer().json().with_target(false).boxed()
    } else {
        fmt::layer().compact().with_target(false).boxed()
    };

    let file_layer = match file {
        Some(path) => {
            let appender = tracing_appender::rolling::never(
                std::path::Path::new(path)
                    .parent()
                    .unwrap_or_else(|| std::path::Path::new(".")),
                std::path::Path::new(path)
                    .file_name()
                    .unwrap_or_else(|| std::ffi::OsStr::new("winch.log")),
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_writer(writer).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();
    Ok(())
}
