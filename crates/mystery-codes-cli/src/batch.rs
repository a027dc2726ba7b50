//! Repeated pipeline runs for a requested number of codes.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;

use mystery_codes::{Choice, CodesError, CodesResult, GeneratedCodePair, CODES_PER_RUN};

use crate::history::StoredCode;

/// Code counts a user may ask for in one batch.
pub const ALLOWED_COUNTS: &[usize] = &[2, 4, 6, 8, 10, 20];

/// Default pause between two pipeline runs.
pub const DEFAULT_PAUSE_MS: u64 = 1000;

/// What a batch produced before it finished or stopped.
#[derive(Debug)]
pub struct BatchReport {
    pub codes: Vec<StoredCode>,
    pub error: Option<CodesError>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Check that `count` is one of [`ALLOWED_COUNTS`].
pub fn validate_count(count: usize) -> Result<usize, String> {
    if ALLOWED_COUNTS.contains(&count) {
        Ok(count)
    } else {
        Err(format!(
            "count must be one of {}",
            ALLOWED_COUNTS
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }
}

/// Parse a command-line count and check it.
pub fn parse_count(raw: &str) -> Result<usize, String> {
    let count: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    validate_count(count)
}

/// Run `generate` until `count` codes exist, pausing between runs.
///
/// Stops at the first error; codes generated before it are kept in the report.
pub async fn run_batch<F, Fut>(
    choice: Choice,
    count: usize,
    pause: Duration,
    mut generate: F,
) -> BatchReport
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CodesResult<GeneratedCodePair>>,
{
    let runs = count / CODES_PER_RUN;
    let mut codes = Vec::with_capacity(count);

    for run in 0..runs {
        match generate().await {
            Ok(pair) => {
                tracing::info!("Run {}/{runs}: {} {}", run + 1, pair.first_code, pair.second_code);
                codes.extend(StoredCode::from_pair(&pair, choice, Utc::now()));
            }
            Err(error) => {
                tracing::warn!("Run {}/{runs} failed: {error}", run + 1);
                return BatchReport {
                    codes,
                    error: Some(error),
                };
            }
        }
        if run + 1 < runs && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    BatchReport { codes, error: None }
}

/// The message shown to the user for a failed batch.
pub fn describe_failure(error: &CodesError) -> String {
    if error.is_offer_not_available() {
        "The offer is not available right now, come back later.".to_string()
    } else {
        format!("An error occurred:\n{error}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pair(n: usize) -> GeneratedCodePair {
        GeneratedCodePair {
            first_code: format!("B{n}a"),
            second_code: format!("B{n}b"),
        }
    }

    #[test]
    fn test_validate_count() {
        for count in ALLOWED_COUNTS {
            assert_eq!(validate_count(*count), Ok(*count));
        }
        assert!(validate_count(3).is_err());
        assert!(validate_count(0).is_err());
        assert_eq!(parse_count("10"), Ok(10));
        assert!(parse_count("ten").is_err());
        assert!(parse_count("5").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_runs_count_over_two_times() {
        let calls = AtomicUsize::new(0);
        let start = tokio::time::Instant::now();

        let report = run_batch(Choice::Beef, 6, Duration::from_millis(1000), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CodesError>(pair(n))
        })
        .await;

        assert!(report.is_complete());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let values: Vec<_> = report.codes.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["B0a", "B0b", "B1a", "B1b", "B2a", "B2b"]);
        assert!(report.codes.iter().all(|c| c.kind == "beef"));
        // two pauses between three runs
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2000));
        assert!(elapsed < Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_batch_stops_at_first_error_and_keeps_codes() {
        let calls = AtomicUsize::new(0);

        let report = run_batch(Choice::Veggie, 8, Duration::ZERO, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 1 {
                Err(CodesError::OfferNotAvailable("gone".into()))
            } else {
                Ok(pair(n))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.codes.len(), 2);
        assert!(report.error.as_ref().unwrap().is_offer_not_available());
    }

    #[test]
    fn test_describe_failure() {
        let offer = describe_failure(&CodesError::OfferNotAvailable("none".into()));
        assert!(offer.contains("not available"));

        let generic = describe_failure(&CodesError::ConfirmationFailed {
            coupon_code: "R1".into(),
            status: 400,
        });
        assert!(generic.starts_with("An error occurred"));
        assert!(generic.contains("R1"));
    }
}
