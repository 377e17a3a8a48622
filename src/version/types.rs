//! Registry data types

use serde::Deserialize;

use crate::version::legacy::LegacyVersion;

/// Metadata of a release, taken from its first published distribution file
///
/// Every field is optional because the index does not always publish them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReleaseMetadata {
    pub filename: Option<String>,
    pub upload_time: Option<String>,
    pub requires_python: Option<String>,
    pub yanked: bool,
}

/// A published version of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: LegacyVersion,
    /// `None` when the release has no distribution files
    pub metadata: Option<ReleaseMetadata>,
}

impl Release {
    pub fn new(version: &str, metadata: Option<ReleaseMetadata>) -> Self {
        Self {
            version: LegacyVersion::parse(version),
            metadata,
        }
    }

    pub fn is_yanked(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.yanked)
    }
}

/// Snapshot of every release of a package, fetched once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPackage {
    pub name: String,
    /// Releases sorted ascending, without duplicate versions
    releases: Vec<Release>,
}

impl RegistryPackage {
    pub fn new(name: impl Into<String>, mut releases: Vec<Release>) -> Self {
        releases.sort_by(|a, b| a.version.cmp(&b.version));
        releases.dedup_by(|a, b| a.version == b.version);

        Self {
            name: name.into(),
            releases,
        }
    }

    /// Releases in ascending version order
    pub fn releases(&self) -> &[Release] {
        &self.releases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sorts_releases_ascending() {
        let package = RegistryPackage::new(
            "foo",
            vec![
                Release::new("1.10", None),
                Release::new("1.2", None),
                Release::new("1.9", None),
            ],
        );

        let versions: Vec<&str> = package
            .releases()
            .iter()
            .map(|r| r.version.as_str())
            .collect();
        assert_eq!(versions, vec!["1.2", "1.9", "1.10"]);
    }

    #[test]
    fn new_keeps_first_of_equivalent_versions() {
        let package = RegistryPackage::new(
            "foo",
            vec![Release::new("1.0", None), Release::new("1.0.0", None)],
        );

        assert_eq!(package.releases().len(), 1);
        assert_eq!(package.releases()[0].version.as_str(), "1.0");
    }

    #[test]
    fn is_yanked_reads_metadata() {
        let yanked = Release::new(
            "1.0",
            Some(ReleaseMetadata {
                yanked: true,
                ..Default::default()
            }),
        );

        assert!(yanked.is_yanked());
        assert!(!Release::new("1.0", None).is_yanked());
    }
}
