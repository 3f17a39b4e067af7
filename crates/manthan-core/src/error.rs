use thiserror::Error;

/// Error taxonomy for the pipeline.
///
/// Only `Validation` surfaces to callers as a per-item failure; the other
/// variants are recovered or reported as explicit empty results upstream.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Malformed input rejected per-item; never aborts a batch.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The pluggable classifier failed or timed out. Recovered locally via
    /// the lexicon fallback, never surfaced to the caller as failure.
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// Linking was requested before any draft was loaded.
    #[error("no active draft")]
    DraftMissing,

    /// The active draft was replaced while a linking request was in flight
    /// against the old snapshot.
    #[error("draft changed during linking")]
    IndexStale,

    #[error("comment not found: {0}")]
    CommentNotFound(uuid::Uuid),

    /// The embedding backend rejected the input.
    #[error("embedding failed: {0}")]
    Embedding(String),
}
