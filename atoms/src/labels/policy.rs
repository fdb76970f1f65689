use crate::error::TaskError;

/// What to do when label detection fails.
///
/// The dedicated process-image endpoint runs `Strict`; the client-side
/// create/update-with-image flow runs `Tolerant`. The two differ on purpose
/// and are kept as separate named policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPolicy {
    /// Failures propagate to the caller.
    Strict,
    /// Failures are logged at warn level and become an empty label list.
    Tolerant,
}

impl LabelPolicy {
    pub fn apply(
        self,
        key: &str,
        result: Result<Vec<String>, TaskError>,
    ) -> Result<Vec<String>, TaskError> {
        match (self, result) {
            (_, Ok(labels)) => Ok(labels),
            (LabelPolicy::Strict, Err(e)) => Err(e),
            (LabelPolicy::Tolerant, Err(e)) => {
                tracing::warn!("Image processing failed for {}: {}", key, e);
                Ok(Vec::new())
            }
        }
    }
}
