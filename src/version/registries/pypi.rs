//! PyPI registry client for fetching Python package releases

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::FETCH_TIMEOUT_MS;
use crate::version::error::RegistryError;
use crate::version::registry::Registry;
use crate::version::types::{RegistryPackage, Release, ReleaseMetadata};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// PyPI registry client
pub struct PypiRegistry {
    client: Client,
    base_url: String,
}

impl PypiRegistry {
    /// Creates a client for the index at `base_url` with the default fetch timeout
    pub fn new(base_url: &str) -> Result<Self, RegistryError> {
        Self::with_timeout(base_url, Duration::from_millis(FETCH_TIMEOUT_MS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// PyPI JSON API response structure
#[derive(Debug, Deserialize)]
struct PypiResponse {
    /// Version string -> distribution files of that release (possibly empty)
    releases: HashMap<String, Vec<ReleaseMetadata>>,
}

#[async_trait]
impl Registry for PypiRegistry {
    async fn fetch_package(&self, package_name: &str) -> Result<RegistryPackage, RegistryError> {
        let url = format!("{}/pypi/{}/json", self.base_url, package_name);
        debug!("Fetching PyPI package: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(RegistryError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("PyPI API returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "PyPI API returned status {}",
                status
            )));
        }

        let pypi_response: PypiResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse PyPI response for {}: {}", package_name, e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        // Some releases have no files and therefore no metadata
        let releases: Vec<Release> = pypi_response
            .releases
            .into_iter()
            .map(|(version, files)| Release::new(&version, files.into_iter().next()))
            .collect();

        debug!(
            "Found {} releases for package {}",
            releases.len(),
            package_name
        );

        Ok(RegistryPackage::new(package_name, releases))
    }
}
