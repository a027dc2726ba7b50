//! Mystery Codes — acquisition pipeline for promotional redemption codes.
//!
//! One call to [`Pipeline::generate`] creates a signed device identity,
//! obtains a challenge token, discovers the target operation, and confirms
//! the consumer's choice against two coupons.

pub mod challenge;
pub mod client;
pub mod config;
pub mod confirm;
pub mod discovery;
pub mod extract;
pub mod identity;
pub mod pipeline;
pub mod retry;
pub mod types;

pub use challenge::{ChallengeResolver, CommandResolver, StaticTokenResolver};
pub use client::ApiClient;
pub use config::{ApiConfig, ClientHeaders, PromotionTable, TargetOffer};
pub use confirm::{confirm_and_synthesize, synthesize_code};
pub use discovery::{fetch_operations, initialize_session};
pub use extract::{extract_coupons, CODES_PER_RUN};
pub use identity::{sign, ClientIdentity, SessionContext};
pub use pipeline::{Pipeline, PipelineOutcome, Stage};
pub use retry::{with_retry, RetryPolicy};
pub use types::*;
