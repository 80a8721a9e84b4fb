use anyhow::Result;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// 0 = info, 1 = debug with HTTP internals quieted, 2+ = trace.
/// RUST_LOG overrides the level unless --quiet is given.
fn level_filter(verbose_level: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    let default = match verbose_level {
        0 => "info",
        1 => "debug,hyper=warn,reqwest=info",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

// JSON when RUST_LOG_JSON=true, or when stdout is not a terminal (containers, pipes)
fn wants_json() -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| !io::stdout().is_terminal())
}

/// Logs always go to stderr or a file; stdout belongs to command output
pub fn init_logging_with_file(verbose_level: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let registry = Registry::default().with(level_filter(verbose_level, quiet));
    let json = wants_json();

    match log_file {
        Some(path) => {
            let appender = rolling_appender(&path)?;
            if json {
                registry
                    .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()).with_writer(appender))
                    .init();
            } else {
                registry
                    .with(
                        fmt::layer()
                            .with_timer(ChronoUtc::rfc_3339())
                            .with_ansi(false)
                            .with_writer(appender),
                    )
                    .init();
            }
        }
        None if json => {
            registry
                .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr))
                .init();
        }
        None => {
            registry
                .with(fmt::layer().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr))
                .init();
        }
    }

    Ok(())
}

/// Daily rotation: reviewgate.log becomes reviewgate.2026-10-18 and so on
fn rolling_appender(path: &Path) -> Result<RollingFileAppender> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    let prefix = file_name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file_name);

    Ok(RollingFileAppender::new(Rotation::DAILY, dir, prefix))
}
