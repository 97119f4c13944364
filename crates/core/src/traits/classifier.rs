//! Intent classifier capability

use async_trait::async_trait;

use crate::conversation::Turn;
use crate::error::CallError;
use crate::intent::Classification;

/// Maps an utterance to one of the fixed intents
///
/// Implementations may be remote models or deterministic keyword tables.
/// The caller enforces the response-time budget; an implementation that
/// cannot answer should return [`CallError::ClassificationUnavailable`].
///
/// # Example
///
/// ```ignore
/// struct AlwaysUnclear;
///
/// #[async_trait]
/// impl IntentClassifier for AlwaysUnclear {
///     async fn classify(&self, _: &str, _: &[Turn]) -> Result<Classification, CallError> {
///         Ok(Classification::unclear())
///     }
///     fn name(&self) -> &str { "always-unclear" }
/// }
/// ```
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify `text`, using `history` (oldest first) for disambiguation
    async fn classify(&self, text: &str, history: &[Turn]) -> Result<Classification, CallError>;

    /// Classifier name for logging
    fn name(&self) -> &str;
}
