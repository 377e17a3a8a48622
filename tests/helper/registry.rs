//! Registry test utilities

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use req_upgrade::version::error::RegistryError;
use req_upgrade::version::registry::Registry;
use req_upgrade::version::types::{RegistryPackage, Release, ReleaseMetadata};

/// In-memory registry; unknown packages are reported as not found
#[derive(Default)]
pub struct MockRegistry {
    versions: HashMap<String, Vec<Release>>,
    unavailable: Vec<String>,
    requested: Mutex<Vec<String>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(mut self, package: &str, versions: Vec<&str>) -> Self {
        self.versions.insert(
            package.to_string(),
            versions.into_iter().map(|v| Release::new(v, None)).collect(),
        );
        self
    }

    pub fn with_yanked(mut self, package: &str, version: &str) -> Self {
        let metadata = ReleaseMetadata {
            yanked: true,
            ..Default::default()
        };
        self.versions
            .entry(package.to_string())
            .or_default()
            .push(Release::new(version, Some(metadata)));
        self
    }

    /// Make every fetch of `package` fail with a server error
    pub fn with_unavailable(mut self, package: &str) -> Self {
        self.unavailable.push(package.to_string());
        self
    }

    /// Package names fetched so far, in request order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn fetch_package(&self, package_name: &str) -> Result<RegistryPackage, RegistryError> {
        self.requested.lock().unwrap().push(package_name.to_string());

        if self.unavailable.iter().any(|p| p == package_name) {
            return Err(RegistryError::InvalidResponse(format!(
                "PyPI API returned status 503 for {package_name}"
            )));
        }

        match self.versions.get(package_name) {
            Some(releases) => Ok(RegistryPackage::new(package_name, releases.clone())),
            None => Err(RegistryError::NotFound(package_name.to_string())),
        }
    }
}
