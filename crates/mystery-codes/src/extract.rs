//! Coupon extraction from discovered operations.

use crate::config::TargetOffer;
use crate::types::{CodesError, CodesResult, Operation};

/// Number of coupon codes one pipeline run confirms.
pub const CODES_PER_RUN: usize = 2;

/// Collect up to two coupon codes from operations matching `target`.
///
/// An operation matches on name OR code; an empty target field never
/// matches. Matching operations are drained in
/// received order until at least two codes are collected; extras are dropped.
pub fn extract_coupons(operations: &[Operation], target: &TargetOffer) -> CodesResult<Vec<String>> {
    let mut codes = Vec::new();

    for operation in operations {
        let by_name = !target.name.is_empty() && operation.name == target.name;
        let by_code = !target.code.is_empty() && operation.code == target.code;
        if by_name || by_code {
            codes.extend(
                operation
                    .coupons
                    .iter()
                    .map(|coupon| coupon.restaurant_code.clone()),
            );
            if codes.len() >= CODES_PER_RUN {
                break;
            }
        }
    }

    if codes.is_empty() {
        return Err(CodesError::OfferNotAvailable(format!(
            "no coupons found for '{}'",
            target.code
        )));
    }

    codes.truncate(CODES_PER_RUN);
    Ok(codes)
}
