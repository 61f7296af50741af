use anyhow::Result;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter directives for the given verbosity. `RUST_LOG` wins unless `quiet` is set.
fn filter_directives(verbose_level: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose_level {
        0 => "info",
        // HTTP connection chatter drowns out the cycle logs at debug
        1 => "debug,hyper=warn,reqwest=info,rustls=warn",
        _ => "trace",
    }
}

fn json_requested() -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| !io::stdout().is_terminal())
}

/// Split `logs/watchcast.log` into the directory and the rotation prefix `watchcast`
fn rotation_target(log_path: &Path) -> Result<(PathBuf, String)> {
    let dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    let prefix = file_name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file_name);
    Ok((dir.to_path_buf(), prefix.to_string()))
}

/// Install the global subscriber. With `log_file` set, output goes to a daily
/// rotating file (`watchcast.2024-05-01` style) instead of stderr.
pub fn init_logging_with_file(verbose_level: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new(filter_directives(verbose_level, quiet))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_directives(verbose_level, quiet)))
    };
    let json = json_requested();
    let registry = Registry::default().with(filter);

    match log_file {
        Some(log_path) => {
            let (dir, prefix) = rotation_target(&log_path)?;
            std::fs::create_dir_all(&dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, prefix);

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
        None => {
            if json {
                registry
                    .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr))
                    .init();
            } else {
                registry
                    .with(fmt::layer().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr))
                    .init();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert_eq!(filter_directives(0, false), "info");
        assert!(filter_directives(1, false).starts_with("debug"));
        assert_eq!(filter_directives(3, false), "trace");
        assert_eq!(filter_directives(2, true), "error");
    }

    #[test]
    fn test_rotation_target() {
        let (dir, prefix) = rotation_target(Path::new("/app/logs/watchcast.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/app/logs"));
        assert_eq!(prefix, "watchcast");

        let (_, prefix) = rotation_target(Path::new("/tmp/plain")).unwrap();
        assert_eq!(prefix, "plain");
    }
}
