//! The invocation engine contract.

use async_trait::async_trait;

use crate::invocation::Invocation;
use crate::outcome::Outcome;

/// Executes parsed invocations.
///
/// The returned [`Outcome`] is the complete answer: command failures
/// ride inside it rather than surfacing as `Err`, and live output
/// keeps flowing through the outcome's stream or channel after this
/// call returns.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, invocation: Invocation) -> Outcome;
}
