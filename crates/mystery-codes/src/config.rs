//! Injected configuration: endpoints, shared secret, headers, promotion table.
//!
//! Nothing here is embedded as a literal. Deployments supply a JSON file,
//! and `MYSTERY_CODES_BASE_URL` can override the endpoint.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;
use crate::types::{Choice, CodesError, CodesResult};

/// Environment variable that overrides [`ApiConfig::base_url`].
pub const BASE_URL_ENV: &str = "MYSTERY_CODES_BASE_URL";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_PIPELINE_DEADLINE_MS: u64 = 120_000;

/// Everything the pipeline needs to talk to the remote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root, e.g. `https://api.example.com/public`. No trailing slash needed.
    pub base_url: String,
    /// Secret appended to the device id before hashing.
    pub shared_secret: String,
    #[serde(default)]
    pub headers: ClientHeaders,
    pub promotions: PromotionTable,
    pub target: TargetOffer,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_pipeline_deadline_ms")]
    pub pipeline_deadline_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_pipeline_deadline_ms() -> u64 {
    DEFAULT_PIPELINE_DEADLINE_MS
}

/// The fixed client header set. `x-device` is added per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientHeaders {
    pub host: Option<String>,
    pub accept: String,
    pub application: String,
    pub version: String,
    pub platform: String,
    pub user_agent: String,
    pub accept_language: String,
    pub connection: String,
}

impl Default for ClientHeaders {
    fn default() -> Self {
        Self {
            host: None,
            accept: "application/json, text/plain, */*".to_string(),
            application: "WEBSITE".to_string(),
            version: "10.19.0".to_string(),
            platform: "APP_IOS".to_string(),
            user_agent: "Mobile/1639457264 CFNetwork/3826.400.120 Darwin/24.3.0".to_string(),
            accept_language: "fr-FR,fr;q=0.9".to_string(),
            connection: "keep-alive".to_string(),
        }
    }
}

/// Promotion id confirmed for each [`Choice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionTable {
    pub beef: String,
    pub veggie: String,
}

impl PromotionTable {
    pub fn promotion_id(&self, choice: Choice) -> &str {
        match choice {
            Choice::Beef => &self.beef,
            Choice::Veggie => &self.veggie,
        }
    }
}

/// The operation the pipeline looks for. Either field matching is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOffer {
    pub name: String,
    pub code: String,
}

impl ApiConfig {
    /// Load from a JSON file, apply the env override, and validate.
    pub fn from_file(path: &Path) -> CodesResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&raw)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse without touching the environment or validating.
    pub fn from_json(raw: &str) -> CodesResult<Self> {
        serde_json::from_str(raw).map_err(|e| CodesError::Config(format!("Invalid config: {e}")))
    }

    /// Replace `base_url` from [`BASE_URL_ENV`] when set.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!("Using {BASE_URL_ENV} override: {url}");
                self.base_url = url;
            }
        }
    }

    pub fn validate(&self) -> CodesResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(CodesError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.shared_secret.is_empty() {
            return Err(CodesError::Config("shared_secret is empty".to_string()));
        }
        if self.promotions.beef.is_empty() || self.promotions.veggie.is_empty() {
            return Err(CodesError::Config(
                "promotions.beef and promotions.veggie are required".to_string(),
            ));
        }
        if self.target.code.is_empty() {
            return Err(CodesError::Config(
                "target.code is required to build the confirmation path".to_string(),
            ));
        }
        if self.target.name.is_empty() {
            return Err(CodesError::Config("target.name is required".to_string()));
        }
        Ok(())
    }

    /// `base_url` joined with `path`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn pipeline_deadline(&self) -> Duration {
        Duration::from_millis(self.pipeline_deadline_ms)
    }

    /// Copy with the secret masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            shared_secret: "********".to_string(),
            ..self.clone()
        }
    }
}
