use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use req_upgrade::config::LOG_ENV;

/// Where diagnostics are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target<'a> {
    Stderr,
    File(&'a Path),
}

/// Install the global tracing subscriber
///
/// `REQ_UPGRADE_LOG` overrides the default level (`warn`, or `debug` when
/// `verbose`). The returned guard must be held until exit so buffered file
/// output is flushed.
pub(crate) fn setup_logging(
    verbose: bool,
    json: bool,
    target: Target<'_>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose);

    match target {
        Target::Stderr => {
            if json {
                builder.json().with_writer(std::io::stderr).init();
            } else {
                builder.with_writer(std::io::stderr).init();
            }
            Ok(None)
        }
        Target::File(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            fs::create_dir_all(directory).with_context(|| {
                format!("Failed to create log directory {}", directory.display())
            })?;
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            if json {
                builder.json().with_writer(writer).with_ansi(false).init();
            } else {
                builder.with_writer(writer).with_ansi(false).init();
            }
            Ok(Some(guard))
        }
    }
}
