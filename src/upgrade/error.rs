use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure to read or rewrite the requirements file; aborts the whole run
#[derive(Debug, Error)]
pub enum LockFileError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Package {name} not found in {path}")]
    PackageMissing { name: String, path: PathBuf },
}

/// Why a validation run did not succeed; every variant counts as a failed validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("command {}", describe_exit(.code))]
    Failed { code: Option<i32> },

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to start command: {0}")]
    Spawn(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}
