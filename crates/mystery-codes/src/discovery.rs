//! Session handshake and operation discovery.

use crate::client::ApiClient;
use crate::identity::{ClientIdentity, SessionContext};
use crate::retry::{with_retry, RetryPolicy};
use crate::types::{CodesResult, Operation};

/// Handshake that must precede every other call for this identity.
pub async fn initialize_session(
    client: &ApiClient,
    identity: &ClientIdentity,
    policy: &RetryPolicy,
) -> CodesResult<()> {
    with_retry(policy, || client.initialize(identity)).await?;
    tracing::debug!("Session initialized for device {}", identity.id());
    Ok(())
}

/// Fetch the currently active operations.
pub async fn fetch_operations(
    client: &ApiClient,
    context: &SessionContext,
    policy: &RetryPolicy,
) -> CodesResult<Vec<Operation>> {
    let operations = with_retry(policy, || client.fetch_operations(context)).await?;
    tracing::debug!("Discovered {} operations", operations.len());
    Ok(operations)
}
