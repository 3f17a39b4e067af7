//! Pipeline tuning knobs with the deployment defaults baked in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the comment-processing pipeline.
///
/// Defaults match the production deployment: classifications under 0.7
/// confidence are flagged for review, comments within 0.92 cosine similarity
/// of a cluster representative are merged, and at most 5 clause candidates
/// are kept per comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Classifications strictly below this confidence are `needs_review`.
    pub confidence_threshold: f32,
    /// Minimum cosine similarity to join an existing duplicate cluster.
    pub similarity_threshold: f32,
    /// Clause candidates kept per comment after scoring.
    pub max_clause_candidates: usize,
    /// Candidates with a combined score below this floor are dropped.
    pub link_score_floor: f32,
    /// Weight of the lexical score in the combined link score.
    pub lexical_weight: f32,
    /// Weight of the semantic (cosine) score in the combined link score.
    pub semantic_weight: f32,
    /// Hard timeout for a single classifier call before the lexicon
    /// fallback takes over.
    pub classifier_timeout: Duration,
    /// Bound on concurrently processed comments during bulk ingestion.
    pub ingest_workers: usize,
    /// Clauses reported in the analytics top-clause ranking.
    pub top_clauses: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            similarity_threshold: 0.92,
            max_clause_candidates: 5,
            link_score_floor: 0.2,
            lexical_weight: 0.4,
            semantic_weight: 0.6,
            classifier_timeout: Duration::from_secs(10),
            ingest_workers: 8,
            top_clauses: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.confidence_threshold, 0.7);
        assert_eq!(cfg.similarity_threshold, 0.92);
        assert_eq!(cfg.max_clause_candidates, 5);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(r#"{"confidence_threshold": 0.8}"#).unwrap();
        assert_eq!(cfg.confidence_threshold, 0.8);
        assert_eq!(cfg.similarity_threshold, 0.92);
    }
}
