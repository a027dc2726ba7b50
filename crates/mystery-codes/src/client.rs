//! Async API client wrapping reqwest.
//!
//! Knows the header set, the three endpoints, and how to turn a response
//! status into a [`CodesError`]. Retrying is left to the callers.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::{ApiConfig, ClientHeaders};
use crate::identity::{ClientIdentity, SessionContext};
use crate::types::{Choice, CodesError, CodesResult, Operation};

const INITIALIZE_PATH: &str = "app/initialize";
const OPERATIONS_PATH: &str = "operation-device/all";

/// HTTP client for the promotions API.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Build a client with the configured per-request timeout.
    pub fn new(config: ApiConfig) -> CodesResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Handshake. Any 2xx is success.
    pub async fn initialize(&self, identity: &ClientIdentity) -> CodesResult<()> {
        let url = self.config.endpoint(INITIALIZE_PATH);
        let resp = self
            .client
            .get(&url)
            .headers(device_headers(&self.config.headers, identity)?)
            .send()
            .await?;
        ensure_success(resp.status().as_u16(), &url)
    }

    /// Fetch all active operations for this session.
    pub async fn fetch_operations(&self, context: &SessionContext) -> CodesResult<Vec<Operation>> {
        let url = self.config.endpoint(OPERATIONS_PATH);
        let resp = self
            .client
            .post(&url)
            .headers(device_headers(&self.config.headers, &context.identity)?)
            .json(&context.signed_body())
            .send()
            .await?;
        ensure_success(resp.status().as_u16(), &url)?;

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            CodesError::MalformedResponse(format!("operation list from {url}: {e}"))
        })
    }

    /// Confirm `choice` for one coupon.
    ///
    /// Transient statuses come back as errors so they can be retried. Any
    /// other status is returned for the caller to judge.
    pub async fn confirm_choice(
        &self,
        context: &SessionContext,
        coupon_code: &str,
        choice: Choice,
    ) -> CodesResult<u16> {
        let url = self.confirm_url();
        let promotion_id = self.config.promotions.promotion_id(choice);
        let resp = self
            .client
            .post(&url)
            .headers(device_headers(&self.config.headers, &context.identity)?)
            .query(&[("couponCode", coupon_code), ("promotionId", promotion_id)])
            .json(&context.signed_body())
            .send()
            .await?;

        let status = resp.status().as_u16();
        if matches!(status, 500 | 503) {
            return Err(CodesError::HttpStatus { status, url });
        }
        Ok(status)
    }

    fn confirm_url(&self) -> String {
        self.config.endpoint(&format!(
            "operation-device/{}/confirm-choice",
            self.config.target.code
        ))
    }
}

fn ensure_success(status: u16, url: &str) -> CodesResult<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(CodesError::HttpStatus {
            status,
            url: url.to_string(),
        })
    }
}

/// The fixed header set plus `x-device` for this identity.
pub fn device_headers(headers: &ClientHeaders, identity: &ClientIdentity) -> CodesResult<HeaderMap> {
    let mut pairs: Vec<(&'static str, &str)> = vec![
        ("accept", headers.accept.as_str()),
        ("x-application", headers.application.as_str()),
        ("x-version", headers.version.as_str()),
        ("accept-language", headers.accept_language.as_str()),
        ("user-agent", headers.user_agent.as_str()),
        ("connection", headers.connection.as_str()),
        ("x-platform", headers.platform.as_str()),
        ("content-type", "application/json"),
        ("x-device", identity.id()),
    ];
    if let Some(host) = &headers.host {
        pairs.push(("host", host.as_str()));
    }

    let mut map = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let value = HeaderValue::from_str(value)
            .map_err(|e| CodesError::Config(format!("Invalid value for header {name}: {e}")))?;
        map.insert(HeaderName::from_static(name), value);
    }
    Ok(map)
}
