//! Structured logging to a daily rolling file.
//!
//! The terminal belongs to the interface while dbv runs, so events only go
//! to `<cache>/dbv/logs/dbv.log.<date>`. `RUST_LOG` overrides the configured
//! level, e.g. `RUST_LOG=dbv::filter=debug`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::cache::CacheManager;

pub const LOG_FILE: &str = "dbv.log";

/// Level used when `RUST_LOG` is unset: `debug` forces debug, otherwise the
/// configured level.
pub fn effective_level(configured: &str, debug: bool) -> String {
    if debug {
        "debug".to_string()
    } else {
        configured.to_string()
    }
}

/// Install the global subscriber. Failure to create the log directory is
/// reported on stderr and logging is skipped.
pub fn init(cache: &CacheManager, level: &str, debug: bool) {
    let level = effective_level(level, debug);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let file_layer = match cache.ensure_log_dir() {
        Ok(logs_dir) => {
            let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE);
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(filter),
            )
        }
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {}", e);
            None
        }
    };

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry().with(file_layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_level() {
        assert_eq!(effective_level("warn", false), "warn");
        assert_eq!(effective_level("warn", true), "debug");
    }
}
