use std::time::Duration;

use async_trait::async_trait;

use crate::{Result, Translation, TranslationRequest};

/// Carries out a single translation attempt.
///
/// Implementations do not retry; the translator decides whether to call
/// [`Transport::dispatch`] again based on the failure's
/// [`FailureKind`](crate::FailureKind).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and waits for its result for at most `timeout`.
    ///
    /// The returned text is raw; post-processing is applied by the caller.
    async fn dispatch(&self, request: &TranslationRequest, timeout: Duration)
        -> Result<Translation>;

    /// Releases pooled resources. Called once by
    /// [`Translator::shutdown`](crate::Translator::shutdown).
    async fn shutdown(&self) {}
}
