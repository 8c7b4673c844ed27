//! npm registry client.

use crate::error::CostError;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Default npm registry URL.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

/// Environment variable to override the registry URL.
pub const REGISTRY_ENV: &str = "HEFT_NPM_REGISTRY";

/// Tarball download timeout in seconds.
const DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Registry client for fetching package metadata and tarball streams.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: Url,
    http: Client,
}

impl RegistryClient {
    /// Create a new registry client with the given base URL.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// created.
    pub fn new(base_url: &str) -> Result<Self, CostError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CostError::registry(format!("Invalid registry URL '{base_url}': {e}")))?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("heft/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CostError::registry(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { base_url, http })
    }

    /// Create a client using the registry URL from environment or default.
    ///
    /// # Errors
    /// Returns an error if the client cannot be created.
    pub fn from_env() -> Result<Self, CostError> {
        let url = std::env::var(REGISTRY_ENV).unwrap_or_else(|_| DEFAULT_REGISTRY.to_string());
        Self::new(&url)
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the packument (package metadata) for a package.
    ///
    /// # Errors
    /// Returns an error if the request fails or the package is not found.
    pub async fn fetch_packument(&self, name: &str) -> Result<serde_json::Value, CostError> {
        // URL-encode the name for scoped packages
        let encoded_name = if name.starts_with('@') {
            name.replace('/', "%2F")
        } else {
            name.to_string()
        };

        let url = self
            .base_url
            .join(&encoded_name)
            .map_err(|e| CostError::registry(format!("Failed to build URL for '{name}': {e}")))?;

        let response = self.http.get(url.as_str()).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CostError::not_found(name));
        }

        if !response.status().is_success() {
            return Err(CostError::registry(format!(
                "Registry returned status {} for '{name}'",
                response.status()
            )));
        }

        let json: serde_json::Value = response.json().await?;
        Ok(json)
    }

    /// Start a streaming tarball download.
    ///
    /// The body is not read here; the caller consumes it as a stream.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    pub async fn fetch_tarball(&self, url: &str) -> Result<reqwest::Response, CostError> {
        let response = self
            .http
            .get(url)
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CostError::registry(format!(
                "Tarball download failed with status {} for '{url}'",
                response.status()
            )));
        }

        Ok(response)
    }
}

/// Extract the latest version from a packument.
#[must_use]
pub fn get_latest_version(packument: &serde_json::Value) -> Option<&str> {
    packument.get("dist-tags")?.get("latest")?.as_str()
}

/// Extract the tarball URL for a specific version.
#[must_use]
pub fn get_tarball_url<'a>(packument: &'a serde_json::Value, version: &str) -> Option<&'a str> {
    packument
        .get("versions")?
        .get(version)?
        .get("dist")?
        .get("tarball")?
        .as_str()
}

/// Tarball URL for an exact version, falling back to the `latest` tag.
///
/// Returns `None` when the packument carries no usable tarball reference at
/// all; the caller treats that unit as contributing nothing.
#[must_use]
pub fn tarball_url_for<'a>(packument: &'a serde_json::Value, version: &str) -> Option<&'a str> {
    get_tarball_url(packument, version).or_else(|| {
        let latest = get_latest_version(packument)?;
        get_tarball_url(packument, latest)
    })
}
