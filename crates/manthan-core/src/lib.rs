pub mod clause_ref;
pub mod config;
pub mod draft;
pub mod error;
pub mod types;

pub use clause_ref::{extract_references, normalize_reference};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use types::{
    AnalyticsSnapshot, Classification, Clause, ClauseLink, Comment, Draft, DuplicateCluster,
    LinkCandidate, Method, Sentiment, Stance,
};
