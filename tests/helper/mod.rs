//! Shared helpers for integration tests

pub mod registry;

pub use registry::MockRegistry;

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Write `content` to a fresh `requirements.txt` in a temporary directory
pub fn requirements_file(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("requirements.txt");
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}
