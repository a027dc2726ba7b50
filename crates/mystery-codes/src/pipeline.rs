//! End-to-end orchestration: identity → challenge → handshake → discovery →
//! extraction → confirmation.
//!
//! Stages run strictly in order. Retries happen only inside individual
//! network calls; the first error that escapes a stage ends the run.

use std::sync::Arc;

use crate::challenge::ChallengeResolver;
use crate::client::ApiClient;
use crate::config::ApiConfig;
use crate::confirm::confirm_and_synthesize;
use crate::discovery::{fetch_operations, initialize_session};
use crate::extract::extract_coupons;
use crate::identity::{ClientIdentity, SessionContext};
use crate::types::{Choice, CodesError, CodesResult, GeneratedCodePair};

/// Progress markers of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    IdentityCreated,
    ChallengeResolved,
    SessionInitialized,
    OperationsFetched,
    CouponsExtracted,
    ConfirmationsIssued,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::IdentityCreated => "identity_created",
            Stage::ChallengeResolved => "challenge_resolved",
            Stage::SessionInitialized => "session_initialized",
            Stage::OperationsFetched => "operations_fetched",
            Stage::CouponsExtracted => "coupons_extracted",
            Stage::ConfirmationsIssued => "confirmations_issued",
        };
        f.write_str(name)
    }
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed(GeneratedCodePair),
    /// `stage` is the last stage reached before the error.
    Failed { stage: Stage, error: CodesError },
}

impl PipelineOutcome {
    pub fn into_result(self) -> CodesResult<GeneratedCodePair> {
        match self {
            PipelineOutcome::Completed(pair) => Ok(pair),
            PipelineOutcome::Failed { error, .. } => Err(error),
        }
    }
}

/// The acquisition pipeline. Holds no per-run state, so one instance can
/// serve any number of sequential or concurrent runs.
#[derive(Clone)]
pub struct Pipeline {
    client: ApiClient,
    resolver: Arc<dyn ChallengeResolver>,
}

impl Pipeline {
    pub fn new(config: ApiConfig, resolver: Arc<dyn ChallengeResolver>) -> CodesResult<Self> {
        Ok(Self {
            client: ApiClient::new(config)?,
            resolver,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        self.client.config()
    }

    /// Acquire one pair of codes, both for `choice`.
    pub async fn generate(&self, choice: Choice) -> CodesResult<GeneratedCodePair> {
        self.run(choice).await.into_result()
    }

    /// Like [`Pipeline::generate`], but reports the stage a failure happened at.
    pub async fn run(&self, choice: Choice) -> PipelineOutcome {
        let identity = ClientIdentity::generate(&self.config().shared_secret);
        self.run_with_identity(identity, choice).await
    }

    /// Run with a caller-supplied identity.
    pub async fn run_with_identity(&self, identity: ClientIdentity, choice: Choice) -> PipelineOutcome {
        let deadline = self.config().pipeline_deadline();
        let mut stage = Stage::Start;

        let result = tokio::time::timeout(deadline, self.execute(identity, choice, &mut stage)).await;
        let outcome = match result {
            Ok(Ok(pair)) => PipelineOutcome::Completed(pair),
            Ok(Err(error)) => PipelineOutcome::Failed { stage, error },
            Err(_) => PipelineOutcome::Failed {
                stage,
                error: CodesError::DeadlineExceeded(deadline),
            },
        };

        match &outcome {
            PipelineOutcome::Completed(pair) => {
                tracing::info!(
                    "Generated {choice} codes {} and {}",
                    pair.first_code,
                    pair.second_code
                );
            }
            PipelineOutcome::Failed { stage, error } => {
                tracing::error!("Pipeline failed after stage {stage}: {error}");
            }
        }
        outcome
    }

    async fn execute(
        &self,
        identity: ClientIdentity,
        choice: Choice,
        stage: &mut Stage,
    ) -> CodesResult<GeneratedCodePair> {
        let config = self.config();
        advance(stage, Stage::IdentityCreated);

        let token = self.resolver.resolve().await?;
        let context = SessionContext::new(identity, token);
        advance(stage, Stage::ChallengeResolved);

        initialize_session(&self.client, &context.identity, &config.retry).await?;
        advance(stage, Stage::SessionInitialized);

        let operations = fetch_operations(&self.client, &context, &config.retry).await?;
        advance(stage, Stage::OperationsFetched);

        let coupons = extract_coupons(&operations, &config.target)?;
        advance(stage, Stage::CouponsExtracted);

        let pair =
            confirm_and_synthesize(&self.client, &coupons, [choice, choice], &context, &config.retry)
                .await?;
        advance(stage, Stage::ConfirmationsIssued);

        Ok(pair)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    tracing::debug!("Pipeline stage {stage} -> {next}");
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::StaticTokenResolver;

    struct FailingResolver;

    #[async_trait::async_trait]
    impl ChallengeResolver for FailingResolver {
        async fn resolve(&self) -> CodesResult<String> {
            Err(CodesError::ChallengeResolutionFailed("solver offline".into()))
        }
    }

    fn config() -> ApiConfig {
        ApiConfig::from_json(
            r#"{
                "base_url": "http://127.0.0.1:9",
                "shared_secret": "pepper",
                "promotions": { "beef": "1", "veggie": "2" },
                "target": { "name": "Mystery", "code": "mystery" }
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_challenge_failure_stops_before_network() {
        let pipeline = Pipeline::new(config(), Arc::new(FailingResolver)).unwrap();
        match pipeline.run(Choice::Beef).await {
            PipelineOutcome::Failed { stage, error } => {
                assert_eq!(stage, Stage::IdentityCreated);
                assert!(matches!(error, CodesError::ChallengeResolutionFailed(_)));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_into_result() {
        let pair = GeneratedCodePair {
            first_code: "B1".into(),
            second_code: "B2".into(),
        };
        assert_eq!(
            PipelineOutcome::Completed(pair.clone()).into_result().unwrap(),
            pair
        );
        let failed = PipelineOutcome::Failed {
            stage: Stage::CouponsExtracted,
            error: CodesError::OfferNotAvailable("none".into()),
        };
        assert!(failed.into_result().unwrap_err().is_offer_not_available());
    }

    #[test]
    fn test_pipeline_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
        let _ = Pipeline::new(config(), Arc::new(StaticTokenResolver::new("tok"))).unwrap();
    }
}
