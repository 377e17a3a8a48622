//! Registry trait for fetching package releases

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::RegistryPackage;

/// Trait for fetching package releases from a package index
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches every published release of a package
    ///
    /// # Arguments
    /// * `package_name` - The bare package name, without extras (e.g., "requests")
    ///
    /// # Returns
    /// * `Ok(RegistryPackage)` - All releases, with their metadata when published
    /// * `Err(RegistryError::NotFound)` - The index does not know the package
    /// * `Err(RegistryError)` - Any other failure talking to the index
    async fn fetch_package(&self, package_name: &str) -> Result<RegistryPackage, RegistryError>;
}
