//! Subcommand implementations for the `mystery-codes` binary.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use mystery_codes::{
    ApiConfig, ChallengeResolver, Choice, CommandResolver, Pipeline, StaticTokenResolver,
};

use crate::batch::{describe_failure, run_batch};
use crate::config::CHALLENGE_TOKEN_ENV;
use crate::history::{group_by_kind, HistoryStore};

/// Where the challenge token comes from.
#[derive(Debug, Clone, Default)]
pub struct ChallengeSource {
    pub token: Option<String>,
    /// Program followed by its arguments.
    pub command: Vec<String>,
}

impl ChallengeSource {
    /// Token flag, then token env var, then command.
    pub fn into_resolver(self) -> Result<Arc<dyn ChallengeResolver>> {
        let env_token = std::env::var(CHALLENGE_TOKEN_ENV).ok();
        self.resolve_with(env_token)
    }

    fn resolve_with(self, env_token: Option<String>) -> Result<Arc<dyn ChallengeResolver>> {
        let token = self
            .token
            .filter(|t| !t.is_empty())
            .or(env_token.filter(|t| !t.is_empty()));
        if let Some(token) = token {
            return Ok(Arc::new(StaticTokenResolver::new(token)));
        }

        let mut parts = self.command.into_iter();
        if let Some(program) = parts.next().filter(|p| !p.trim().is_empty()) {
            return Ok(Arc::new(CommandResolver::new(program, parts.collect())));
        }

        bail!(
            "No challenge source: pass --challenge-token, set {CHALLENGE_TOKEN_ENV}, \
             or give a command after --"
        )
    }
}

/// Options for `generate`.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub choice: Choice,
    pub count: usize,
    pub pause: Duration,
    pub json: bool,
    pub save: bool,
}

/// Load and validate the API config.
pub fn load_config(path: &Path) -> Result<ApiConfig> {
    ApiConfig::from_file(path).with_context(|| format!("Loading config {}", path.display()))
}

/// Exit code for a batch stopped by an unavailable offer.
pub const EXIT_OFFER_NOT_AVAILABLE: i32 = 2;
/// Exit code for a batch stopped by any other error.
pub const EXIT_FAILURE: i32 = 1;

/// Generate a batch of codes, print them, and record them in history.
///
/// Returns the process exit code: 0 when the batch completed.
pub async fn generate(
    config: ApiConfig,
    challenge: ChallengeSource,
    history: &HistoryStore,
    options: GenerateOptions,
) -> Result<i32> {
    let resolver = challenge.into_resolver()?;
    let pipeline = Pipeline::new(config, resolver)?;

    tracing::info!(
        "Generating {} {} codes ({} runs)",
        options.count,
        options.choice,
        options.count / mystery_codes::CODES_PER_RUN
    );

    let report = run_batch(options.choice, options.count, options.pause, || {
        pipeline.generate(options.choice)
    })
    .await;

    if options.save && !report.codes.is_empty() {
        let total = history.prepend(&report.codes)?;
        tracing::info!("History now holds {total} codes ({})", history.path().display());
    }

    if options.json {
        let out = serde_json::json!({
            "codes": report.codes,
            "complete": report.is_complete(),
            "error": report.error.as_ref().map(|e| e.to_string()),
            "offer_not_available": report.error.as_ref().is_some_and(|e| e.is_offer_not_available()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for code in &report.codes {
            println!("{}  ({})", code.value, code.kind);
        }
    }

    match report.error {
        Some(error) => {
            eprintln!("{}", describe_failure(&error));
            Ok(if error.is_offer_not_available() {
                EXIT_OFFER_NOT_AVAILABLE
            } else {
                EXIT_FAILURE
            })
        }
        None => Ok(0),
    }
}

/// Print stored codes grouped by type, or clear them.
pub fn history(history: &HistoryStore, json: bool, clear: bool) -> Result<()> {
    if clear {
        history.clear()?;
        println!("History cleared: {}", history.path().display());
        return Ok(());
    }

    let codes = history.load()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&codes)?);
        return Ok(());
    }

    if codes.is_empty() {
        println!("No codes yet.");
        return Ok(());
    }
    for (kind, values) in group_by_kind(&codes) {
        println!("{kind} ({})", values.len());
        for value in values {
            println!("  - {value}");
        }
    }
    Ok(())
}

/// Validate the config and print it with the secret masked.
pub fn config_check(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    println!("Valid config: {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_token_wins() {
        let source = ChallengeSource {
            token: Some("tok".into()),
            command: vec!["never-run".into()],
        };
        assert!(source.resolve_with(None).is_ok());
    }

    #[test]
    fn test_env_token_used_when_flag_empty() {
        let source = ChallengeSource {
            token: Some(String::new()),
            command: Vec::new(),
        };
        assert!(source.resolve_with(Some("from-env".into())).is_ok());
    }

    #[test]
    fn test_no_source_is_rejected() {
        let source = ChallengeSource {
            token: Some(String::new()),
            command: vec!["   ".into()],
        };
        assert!(source.resolve_with(Some(String::new())).is_err());
        assert!(ChallengeSource::default().resolve_with(None).is_err());
    }

    #[tokio::test]
    async fn test_command_arguments_keep_spaces() {
        let source = ChallengeSource {
            token: None,
            command: vec!["echo".into(), "tok with spaces".into()],
        };
        let resolver = source.resolve_with(None).unwrap();
        assert_eq!(resolver.resolve().await.unwrap(), "tok with spaces");
    }

    #[test]
    fn test_history_command_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        history(&store, false, false).unwrap();
        history(&store, true, true).unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
