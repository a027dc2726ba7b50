//! Concurrent choice confirmation and final code synthesis.

use crate::client::ApiClient;
use crate::extract::CODES_PER_RUN;
use crate::identity::SessionContext;
use crate::retry::{with_retry, RetryPolicy};
use crate::types::{Choice, CodesError, CodesResult, GeneratedCodePair};

/// Confirm both coupons concurrently, then derive the user-facing codes.
///
/// Both requests always run to completion before either outcome is
/// inspected. A pair is produced only when both returned exactly 200.
/// A non-200 status wins over an error from the other call.
pub async fn confirm_and_synthesize(
    client: &ApiClient,
    coupons: &[String],
    choices: [Choice; 2],
    context: &SessionContext,
    policy: &RetryPolicy,
) -> CodesResult<GeneratedCodePair> {
    let [first, second] = coupons else {
        return Err(CodesError::InvalidInput(format!(
            "confirmation needs exactly {CODES_PER_RUN} coupon codes, got {}",
            coupons.len()
        )));
    };
    if let Some(empty) = coupons.iter().position(|c| c.is_empty()) {
        return Err(CodesError::InvalidInput(format!(
            "coupon code #{} is empty",
            empty + 1
        )));
    }

    let (first_outcome, second_outcome) = tokio::join!(
        confirm_one(client, context, first, choices[0], policy),
        confirm_one(client, context, second, choices[1], policy),
    );

    let outcomes = [(first, &first_outcome), (second, &second_outcome)];
    for (coupon_code, outcome) in outcomes {
        if let Ok(status) = outcome {
            if *status != 200 {
                tracing::warn!("Confirmation of {coupon_code} returned HTTP {status}");
                return Err(CodesError::ConfirmationFailed {
                    coupon_code: coupon_code.clone(),
                    status: *status,
                });
            }
        }
    }
    first_outcome?;
    second_outcome?;

    Ok(GeneratedCodePair {
        first_code: synthesize_code(first, choices[0])?,
        second_code: synthesize_code(second, choices[1])?,
    })
}

async fn confirm_one(
    client: &ApiClient,
    context: &SessionContext,
    coupon_code: &str,
    choice: Choice,
    policy: &RetryPolicy,
) -> CodesResult<u16> {
    let status = with_retry(policy, || client.confirm_choice(context, coupon_code, choice)).await?;
    tracing::debug!("Confirmed {choice} for {coupon_code}: HTTP {status}");
    Ok(status)
}

/// Overwrite the first character of `raw` with the choice tag.
pub fn synthesize_code(raw: &str, choice: Choice) -> CodesResult<String> {
    let mut chars = raw.chars();
    if chars.next().is_none() {
        return Err(CodesError::InvalidInput(
            "cannot synthesize from an empty coupon code".to_string(),
        ));
    }
    let mut code = String::with_capacity(raw.len());
    code.push(choice.tag());
    code.push_str(chars.as_str());
    Ok(code)
}
