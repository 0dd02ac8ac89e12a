use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

use crate::protocol;

/// Client configuration module
/// This module handles the client configuration including loading and
/// validating connection settings and the identity sent in the User-Agent.
/// Represents the client configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClientConfig {
    /// SubDB endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the application using the client
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Version of the application using the client
    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// Home page of the application using the client
    #[serde(default = "default_client_url")]
    pub client_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            client_name: default_client_name(),
            client_version: default_client_version(),
            client_url: default_client_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://api.thesubdb.com/".to_string()
}

fn default_sandbox_url() -> String {
    "http://sandbox.thesubdb.com/".to_string()
}

fn default_client_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_client_url() -> String {
    "https://github.com/subdb-rs/subdb".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    /// Create a configuration for the production endpoint
    pub fn new(
        client_name: impl Into<String>,
        client_version: impl Into<String>,
        client_url: impl Into<String>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            client_version: client_version.into(),
            client_url: client_url.into(),
            ..Self::default()
        }
    }

    /// Configuration pointing at the SubDB sandbox
    pub fn sandbox() -> Self {
        Self {
            base_url: default_sandbox_url(),
            ..Self::default()
        }
    }

    /// Set the endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to load config file: {:?}", path))
    }

    /// Parse a configuration from a JSON string and validate it
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(content).context("Failed to parse client configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url()?;

        if self.client_name.trim().is_empty() {
            return Err(anyhow!("Client name is required"));
        }
        if self.client_version.trim().is_empty() {
            return Err(anyhow!("Client version is required"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("Timeout must be at least one second"));
        }

        Ok(())
    }

    /// The endpoint as a URL; only http and https are accepted
    pub fn parsed_base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base URL: {}", self.base_url))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(anyhow!("Unsupported URL scheme '{}' in {}", scheme, self.base_url)),
        }
    }

    /// User-Agent value identifying this client to the service
    pub fn user_agent(&self) -> String {
        protocol::user_agent(&self.client_name, &self.client_version, &self.client_url)
    }
}
