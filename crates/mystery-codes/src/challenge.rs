//! Anti-automation challenge collaborator.
//!
//! The pipeline only needs a token string. How it is obtained is up to the
//! resolver; failures are never retried by the pipeline.

use async_trait::async_trait;

use crate::types::{CodesError, CodesResult};

/// Supplies a one-time challenge token.
#[async_trait]
pub trait ChallengeResolver: Send + Sync {
    async fn resolve(&self) -> CodesResult<String>;
}

/// Returns a token handed over up-front.
#[derive(Debug, Clone)]
pub struct StaticTokenResolver {
    token: String,
}

impl StaticTokenResolver {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl ChallengeResolver for StaticTokenResolver {
    async fn resolve(&self) -> CodesResult<String> {
        if self.token.is_empty() {
            return Err(CodesError::ChallengeResolutionFailed(
                "empty challenge token".to_string(),
            ));
        }
        Ok(self.token.clone())
    }
}

/// Runs an external program and takes its trimmed stdout as the token.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    program: String,
    args: Vec<String>,
}

impl CommandResolver {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl ChallengeResolver for CommandResolver {
    async fn resolve(&self) -> CodesResult<String> {
        tracing::debug!("Resolving challenge via {}", self.program);
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                CodesError::ChallengeResolutionFailed(format!(
                    "failed to run {}: {e}",
                    self.program
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CodesError::ChallengeResolutionFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(CodesError::ChallengeResolutionFailed(format!(
                "{} produced no token",
                self.program
            )));
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let resolver = StaticTokenResolver::new("tok");
        assert_eq!(resolver.resolve().await.unwrap(), "tok");
    }

    #[tokio::test]
    async fn test_static_empty_token_fails() {
        let resolver = StaticTokenResolver::new("");
        assert!(matches!(
            resolver.resolve().await,
            Err(CodesError::ChallengeResolutionFailed(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_resolver_trims_stdout() {
        let resolver = CommandResolver::new("echo", vec!["  tok-123  ".to_string()]);
        assert_eq!(resolver.resolve().await.unwrap(), "tok-123");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_resolver_nonzero_exit() {
        let resolver = CommandResolver::new("false", Vec::new());
        assert!(matches!(
            resolver.resolve().await,
            Err(CodesError::ChallengeResolutionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_command_resolver_missing_program() {
        let resolver = CommandResolver::new("definitely-not-a-real-program-xyz", Vec::new());
        assert!(matches!(
            resolver.resolve().await,
            Err(CodesError::ChallengeResolutionFailed(_))
        ));
    }
}
