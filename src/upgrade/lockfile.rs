//! In-place rewriting of a single requirement pin
//!
//! Every mutation re-reads the file, replaces the constraint of exactly one
//! line and writes the result through a temporary file in the same
//! directory followed by a rename, so an interrupted write never leaves a
//! truncated requirements file behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::parser::requirements::{parse_requirements, split_requirement_line};
use crate::parser::types::Requirement;
use crate::upgrade::error::LockFileError;
use crate::version::legacy::LegacyVersion;

/// Undo token returned by [`LockFile::set_pin`]
///
/// Holds the exact constraint text that was replaced, so reverting restores
/// the original operators (e.g. `>=1.2,<2.0`) rather than a fabricated pin.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pin change must be reverted if the new pin is rejected"]
pub struct PinChange {
    name: String,
    previous: String,
}

impl PinChange {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constraint text before the change
    pub fn previous(&self) -> &str {
        &self.previous
    }
}

/// A requirements file on disk
#[derive(Debug, Clone)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<String, LockFileError> {
        fs::read_to_string(&self.path).map_err(|source| LockFileError::Read {
            path: self.path.clone(),
            source,
        })
    }

    pub fn requirements(&self) -> Result<Vec<Requirement>, LockFileError> {
        Ok(parse_requirements(&self.read()?))
    }

    /// Pin `name` to exactly `version`, returning the undo token
    pub fn set_pin(&self, name: &str, version: &LegacyVersion) -> Result<PinChange, LockFileError> {
        let previous = self.replace_constraint(name, &format!("=={}", version))?;
        Ok(PinChange {
            name: name.to_string(),
            previous,
        })
    }

    /// Restore the constraint text captured by `change`
    pub fn revert(&self, change: PinChange) -> Result<(), LockFileError> {
        self.replace_constraint(&change.name, &change.previous)?;
        Ok(())
    }

    fn replace_constraint(&self, name: &str, constraint: &str) -> Result<String, LockFileError> {
        let content = self.read()?;

        let (updated, previous) = rewrite_constraint(&content, name, constraint).ok_or_else(|| {
            LockFileError::PackageMissing {
                name: name.to_string(),
                path: self.path.clone(),
            }
        })?;

        write_atomic(&self.path, &updated).map_err(|source| LockFileError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            "Rewrote {} in {}: '{}' -> '{}'",
            name,
            self.path.display(),
            previous,
            constraint
        );

        Ok(previous)
    }
}

/// Replace the constraint of the first requirement line named `name`
///
/// Returns the new content and the constraint text that was replaced, or
/// `None` if no line names the package. All other lines, line endings and
/// the extras, marker and comment of the target line are kept verbatim.
pub fn rewrite_constraint(content: &str, name: &str, constraint: &str) -> Option<(String, String)> {
    let mut output = String::with_capacity(content.len() + constraint.len());
    let mut previous = None;

    for line in content.split_inclusive('\n') {
        if previous.is_none() {
            let (body, ending) = match line.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (line, ""),
            };

            if let Some(parts) = split_requirement_line(body).filter(|p| p.name == name) {
                previous = Some(parts.constraint().to_string());
                output.push_str(&parts.with_constraint(constraint));
                output.push_str(ending);
                continue;
            }
        }
        output.push_str(line);
    }

    previous.map(|previous| (output, previous))
}

/// Write `data` to `path` atomically using a temporary file and atomic rename.
fn write_atomic(path: &Path, data: &str) -> std::io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(data.as_bytes())?;
    temp_file.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp_file.path(), metadata.permissions())?;
    }

    temp_file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
