pub mod analytics;
pub mod dedup;
pub mod index;
pub mod linker;
pub mod normalizer;
pub mod pipeline;
pub mod router;

pub use index::{ClauseIndex, DraftSlot};
pub use pipeline::{
    BatchOutcome, ClusterSummary, CommentFilter, Pipeline, ProcessedComment, RawRecord,
};
