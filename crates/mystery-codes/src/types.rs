//! Core data types for the acquisition pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A promotional campaign as returned by operation discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
    /// Fields the pipeline does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A redeemable coupon nested under an [`Operation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    #[serde(rename = "restaurantCode")]
    pub restaurant_code: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The consumer's choice, confirmed against each coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Beef,
    Veggie,
}

impl Choice {
    /// Single-letter tag written over the first character of a coupon code.
    pub fn tag(self) -> char {
        match self {
            Choice::Beef => 'B',
            Choice::Veggie => 'V',
        }
    }

    /// Human-readable label, also used as the history type.
    pub fn label(self) -> &'static str {
        match self {
            Choice::Beef => "beef",
            Choice::Veggie => "veggie",
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Choice {
    type Err = CodesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beef" | "b" => Ok(Choice::Beef),
            "veggie" | "v" => Ok(Choice::Veggie),
            other => Err(CodesError::InvalidInput(format!(
                "Unknown choice: {other}. Use 'beef' or 'veggie'."
            ))),
        }
    }
}

/// The two codes produced by one successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCodePair {
    pub first_code: String,
    pub second_code: String,
}

impl GeneratedCodePair {
    /// Both codes, in order.
    pub fn codes(&self) -> [&str; 2] {
        [&self.first_code, &self.second_code]
    }
}

/// Errors that can occur in the acquisition pipeline.
#[derive(thiserror::Error, Debug)]
pub enum CodesError {
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Gave up after {attempts} attempts (last status {last_status})")]
    RetriesExhausted { attempts: u32, last_status: u16 },

    #[error("Offer not available: {0}")]
    OfferNotAvailable(String),

    #[error("Confirmation failed for coupon {coupon_code}: HTTP {status}")]
    ConfirmationFailed { coupon_code: String, status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Challenge resolution failed: {0}")]
    ChallengeResolutionFailed(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Pipeline deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodesError {
    /// HTTP status carried by the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CodesError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 500 and 503 are rate-limit/availability blips worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self.status(), Some(500) | Some(503))
    }

    /// The target promotion is currently inactive.
    pub fn is_offer_not_available(&self) -> bool {
        matches!(self, CodesError::OfferNotAvailable(_))
    }
}

/// Convenience result type.
pub type CodesResult<T> = Result<T, CodesError>;
