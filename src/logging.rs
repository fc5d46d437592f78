use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{MedleyError, Result};

/// Initialize logging with console output and optional daily file rotation.
///
/// `RUST_LOG` wins over the configured level. File logging is enabled when
/// `MEDLEY_LOG_DIR` points at a writable directory.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,medley={}", config.level)));

    // `rolling::daily` panics if it can't create its first file, so check writability first
    let file_layer = match std::env::var("MEDLEY_LOG_DIR") {
        Ok(log_dir) => match writable_dir(&log_dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(&log_dir, "medley.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                // Keep the guard alive for the rest of the process
                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not write to log directory {} ({}), file logging disabled",
                    log_dir, e
                );
                None
            }
        },
        Err(_) => None,
    };

    let (json_layer, plain_layer) = if config.json {
        (
            Some(tracing_subscriber::fmt::layer().json().with_target(true)),
            None,
        )
    } else {
        (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            ),
        )
    };

    let file_logging_enabled = file_layer.is_some();
    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(plain_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| MedleyError::Internal(format!("logging already initialized: {}", e)))?;

    if file_logging_enabled {
        tracing::debug!("file logging enabled");
    }
    Ok(())
}

/// Minimal logging for quick CLI commands
pub fn init_logging_simple() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

fn writable_dir(dir: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let marker = std::path::Path::new(dir).join(".medley_write_test");
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&marker)?;
    std::fs::remove_file(&marker)
}
