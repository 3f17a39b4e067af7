//! Data model for the comment-processing pipeline.
//!
//! Drafts own their clauses; comments reference a draft by id. Everything
//! downstream of a comment (links, classification, cluster assignment) is
//! keyed by the comment's id.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A numbered section/sub-section of a draft, the atomic linking target.
///
/// The embedding for a clause is owned by the clause index, not the clause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
    /// Normalised numbering token, e.g. `4` or `5(3)`.
    pub reference: String,
    /// Zero-based position in the draft. Ties in link scoring break on this.
    pub index: usize,
    pub text: String,
}

/// An immutable draft legal document with its ordered clauses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub title: String,
    pub clauses: Vec<Clause>,
}

/// A public comment after normalisation.
///
/// `metadata` is an open string-keyed map: organisation, region, role and
/// whatever else the upload carried, all treated as free-form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub raw_text: String,
    pub normalized_text: String,
    pub language: String,
    pub metadata: HashMap<String, String>,
    /// Draft the comment was processed against, if one was active.
    pub draft_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One clause candidate produced by the linker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCandidate {
    pub clause_reference: String,
    /// Combined lexical/semantic score in `[0, 1]`.
    pub score: f32,
}

/// Ordered clause candidates for a comment, scores non-increasing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClauseLink {
    pub candidates: Vec<LinkCandidate>,
}

impl ClauseLink {
    /// Empty link result, a normal outcome rather than a failure.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Best-scoring clause reference, if any candidate survived the floor.
    pub fn top(&self) -> Option<&LinkCandidate> {
        self.candidates.first()
    }
}

/// Sentiment polarity of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

/// Whether the comment supports or opposes the draft, distinct from polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Supports,
    Opposes,
    Neutral,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supports => "supports",
            Self::Opposes => "opposes",
            Self::Neutral => "neutral",
        }
    }
}

/// How a classification was produced, so analytics can separate ML-derived
/// from fallback-derived confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// The pluggable model produced the prediction.
    Model,
    /// The deterministic keyword fallback produced it.
    Lexicon,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Lexicon => "lexicon",
        }
    }
}

/// Classification result for one comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub sentiment: Sentiment,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    pub stance: Stance,
    /// Closed-set aspect tags, zero or many.
    pub aspects: Vec<String>,
    pub method: Method,
    /// Set when confidence fell strictly below the configured threshold.
    pub needs_review: bool,
}

/// A near-duplicate cluster. Every processed comment belongs to exactly one;
/// a comment with no near-duplicate sits in its own singleton cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCluster {
    pub cluster_id: u64,
    /// The exemplar whose embedding anchors the cluster.
    pub representative_comment_id: Uuid,
    pub member_comment_ids: HashSet<Uuid>,
}

impl DuplicateCluster {
    pub fn size(&self) -> usize {
        self.member_comment_ids.len()
    }
}

/// A pure projection over all processed comments; recomputable at any time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    /// Every comment handed to the pipeline, including failed ones.
    pub total_received: u64,
    pub processed: u64,
    pub failed: u64,
    pub sentiment_distribution: BTreeMap<String, u64>,
    pub stance_distribution: BTreeMap<String, u64>,
    pub language_distribution: BTreeMap<String, u64>,
    /// Counts per classification method (model vs lexicon fallback).
    pub method_distribution: BTreeMap<String, u64>,
    pub needs_review: u64,
    pub mean_confidence: f64,
    /// Most mentioned clauses, `(reference, mentions)`, descending.
    pub top_clauses: Vec<(String, u64)>,
    pub cluster_count: u64,
}
