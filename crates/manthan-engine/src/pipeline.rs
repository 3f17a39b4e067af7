//! Pipeline orchestration: one comment in, one fully-analysed comment out.
//!
//! `process` runs one comment through normalisation, embedding, linking,
//! classification, and clustering, then stores the result. `ingest_batch`
//! runs the same
//! chain over many records with bounded concurrency; a bad row fails alone
//! and never aborts the batch. Draft replacement swaps the clause index
//! atomically and clears all comment-scoped state, so stored analysis never
//! mixes two drafts.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use manthan_ai::{Embedder, SentimentModel};
use manthan_core::config::PipelineConfig;
use manthan_core::error::PipelineError;
use manthan_core::types::{
    AnalyticsSnapshot, Classification, ClauseLink, Comment, Draft, DuplicateCluster, Sentiment,
};

use crate::analytics::Aggregator;
use crate::dedup::DedupClusterer;
use crate::index::{ClauseIndex, DraftSlot};
use crate::linker;
use crate::normalizer;
use crate::router::ClassifierRouter;

/// One row of a bulk upload. Unknown fields become metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub text: String,
    #[serde(flatten)]
    pub metadata: HashMap<String, String>,
}

/// Per-row result of a bulk ingestion, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum RecordOutcome {
    Processed { comment_id: Uuid },
    Failed { reason: String },
}

/// Summary of one bulk ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub outcomes: Vec<RecordOutcome>,
    pub processed: usize,
    pub failed: usize,
}

/// A duplicate cluster joined with its representative's masked text, for
/// listing clusters to a reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster_id: u64,
    pub representative_comment_id: Uuid,
    /// Normalised (PII-masked) text of the representative comment.
    pub representative_text: String,
    pub size: usize,
}

/// A comment with everything the pipeline derived for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedComment {
    pub comment: Comment,
    pub link: ClauseLink,
    pub classification: Classification,
    pub cluster_id: u64,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// Filters for listing processed comments; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub sentiment: Option<Sentiment>,
    /// Matches comments with this clause among their link candidates.
    pub clause: Option<String>,
    pub cluster: Option<u64>,
}

pub struct Pipeline {
    config: PipelineConfig,
    embedder: Arc<dyn Embedder>,
    router: ClassifierRouter,
    slot: DraftSlot,
    dedup: DedupClusterer,
    analytics: Aggregator,
    store: RwLock<HashMap<Uuid, ProcessedComment>>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        embedder: Arc<dyn Embedder>,
        model: Option<Arc<dyn SentimentModel>>,
    ) -> Self {
        let router = ClassifierRouter::new(
            model,
            config.classifier_timeout,
            config.confidence_threshold,
        );
        let dedup = DedupClusterer::new(config.similarity_threshold);
        Self {
            config,
            embedder,
            router,
            slot: DraftSlot::new(),
            dedup,
            analytics: Aggregator::new(),
            store: RwLock::new(HashMap::new()),
        }
    }

    fn store_write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, ProcessedComment>> {
        match self.store.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn store_read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, ProcessedComment>> {
        match self.store.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Load a new active draft, discarding every comment-scoped result so
    /// analysis of the old draft cannot bleed into the new one.
    ///
    /// Replace between ingestion runs: a comment still in flight keeps its
    /// old-draft snapshot for linking and records its analytics outcome
    /// after the counters were cleared.
    pub fn replace_draft(&self, draft: Draft) -> anyhow::Result<()> {
        let index = self.slot.replace(draft, self.embedder.as_ref())?;
        self.store_write().clear();
        self.dedup.clear();
        self.analytics.reset();
        info!(
            draft_id = %index.draft().id,
            clauses = index.clause_count(),
            "active draft replaced"
        );
        Ok(())
    }

    pub fn current_draft(&self) -> Option<Arc<Draft>> {
        self.slot.snapshot().map(|ix| Arc::clone(ix.draft()))
    }

    /// Run one comment through the full chain and store the result.
    ///
    /// Empty text is accepted: it classifies neutral, links to nothing, and
    /// sits in its own cluster. Processing without an active draft is also
    /// accepted and yields an empty link.
    pub async fn process(
        &self,
        raw_text: &str,
        metadata: HashMap<String, String>,
    ) -> Result<ProcessedComment, PipelineError> {
        self.analytics.record_received();

        let normalized = normalizer::normalize(raw_text);
        let embedding = match self.embedder.embed(&normalized.text) {
            Ok(v) => v,
            Err(err) => {
                self.analytics.record_failed();
                return Err(PipelineError::Embedding(err.to_string()));
            }
        };

        let (link, draft_id) = self.link_with_retry(&normalized.text, &embedding);
        let classification = self.router.classify(&normalized.text).await;

        let comment_id = Uuid::new_v4();

        // Cluster assignment and store insertion happen under the store
        // write lock so a concurrent recluster cannot observe the one
        // without the other.
        let processed = {
            let mut store = self.store_write();
            let cluster_id = self.dedup.assign(comment_id, &embedding);
            let processed = ProcessedComment {
                comment: Comment {
                    id: comment_id,
                    raw_text: raw_text.to_string(),
                    normalized_text: normalized.text,
                    language: normalized.language,
                    metadata,
                    draft_id,
                    created_at: Utc::now(),
                },
                link,
                classification,
                cluster_id,
                embedding,
            };
            store.insert(comment_id, processed.clone());
            processed
        };

        self.analytics.record_processed(
            &processed.classification,
            &processed.comment.language,
            &processed.link,
        );
        debug!(
            comment_id = %comment_id,
            cluster_id = processed.cluster_id,
            sentiment = processed.classification.sentiment.as_str(),
            top_clause = processed.link.top().map(|c| c.clause_reference.as_str()),
            "comment processed"
        );
        Ok(processed)
    }

    fn link_with_retry(&self, text: &str, embedding: &[f32]) -> (ClauseLink, Option<String>) {
        self.link_from_snapshot(self.slot.snapshot(), text, embedding)
    }

    /// Link against the given index snapshot. If the draft is swapped while
    /// linking, retry once against the new snapshot; a second swap in that
    /// window keeps the retried result, which was computed against a single
    /// consistent snapshot.
    fn link_from_snapshot(
        &self,
        mut snapshot: Option<Arc<ClauseIndex>>,
        text: &str,
        embedding: &[f32],
    ) -> (ClauseLink, Option<String>) {
        for attempt in 0..2 {
            let Some(index) = snapshot.take() else {
                return (ClauseLink::empty(), None);
            };
            let link = linker::link(&index, text, embedding, &self.config);
            if attempt == 1 || self.slot.current_version() == Some(index.version()) {
                return (link, Some(index.draft().id.clone()));
            }
            debug!(version = index.version(), "index swapped during linking, retrying");
            snapshot = self.slot.snapshot();
        }
        unreachable!("loop always returns by the second attempt")
    }

    /// Process many records with bounded concurrency. Outcomes are returned
    /// in input order; empty rows fail validation without touching the rest.
    pub async fn ingest_batch(&self, records: Vec<RawRecord>) -> BatchOutcome {
        let workers = self.config.ingest_workers.max(1);
        let total = records.len();

        let mut indexed: Vec<(usize, RecordOutcome)> = futures::stream::iter(
            records.into_iter().enumerate().map(|(i, record)| async move {
                if record.text.trim().is_empty() {
                    self.analytics.record_received();
                    self.analytics.record_failed();
                    let reason = PipelineError::Validation("empty text".to_string()).to_string();
                    return (i, RecordOutcome::Failed { reason });
                }
                match self.process(&record.text, record.metadata).await {
                    Ok(p) => (i, RecordOutcome::Processed { comment_id: p.comment.id }),
                    Err(err) => (
                        i,
                        RecordOutcome::Failed {
                            reason: err.to_string(),
                        },
                    ),
                }
            }),
        )
        .buffer_unordered(workers)
        .collect()
        .await;

        indexed.sort_by_key(|(i, _)| *i);
        let outcomes: Vec<RecordOutcome> = indexed.into_iter().map(|(_, o)| o).collect();
        let failed = outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Failed { .. }))
            .count();

        info!(total, failed, processed = total - failed, "batch ingested");
        BatchOutcome {
            processed: total - failed,
            failed,
            outcomes,
        }
    }

    pub fn get_comment(&self, id: Uuid) -> Option<ProcessedComment> {
        self.store_read().get(&id).cloned()
    }

    /// Processed comments matching the filter, oldest first.
    pub fn list_comments(&self, filter: &CommentFilter) -> Vec<ProcessedComment> {
        let store = self.store_read();
        let mut matches: Vec<ProcessedComment> = store
            .values()
            .filter(|p| {
                filter
                    .sentiment
                    .is_none_or(|s| p.classification.sentiment == s)
                    && filter.clause.as_deref().is_none_or(|reference| {
                        p.link
                            .candidates
                            .iter()
                            .any(|c| c.clause_reference == reference)
                    })
                    && filter.cluster.is_none_or(|c| p.cluster_id == c)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            a.comment
                .created_at
                .cmp(&b.comment.created_at)
                .then(a.comment.id.cmp(&b.comment.id))
        });
        matches
    }

    pub fn analytics_snapshot(&self) -> AnalyticsSnapshot {
        self.analytics
            .snapshot(self.config.top_clauses, self.dedup.cluster_count() as u64)
    }

    pub fn clusters(&self) -> Vec<DuplicateCluster> {
        self.dedup.clusters()
    }

    /// Clusters joined with their representative's masked text, largest
    /// first.
    pub fn cluster_summaries(&self) -> Vec<ClusterSummary> {
        let store = self.store_read();
        let mut summaries: Vec<ClusterSummary> = self
            .dedup
            .clusters()
            .into_iter()
            .map(|c| ClusterSummary {
                representative_text: store
                    .get(&c.representative_comment_id)
                    .map(|p| p.comment.normalized_text.clone())
                    .unwrap_or_default(),
                size: c.size(),
                cluster_id: c.cluster_id,
                representative_comment_id: c.representative_comment_id,
            })
            .collect();
        summaries.sort_by(|a, b| b.size.cmp(&a.size).then(a.cluster_id.cmp(&b.cluster_id)));
        summaries
    }

    /// Rebuild the duplicate partition over every stored comment and update
    /// each comment's cluster assignment in place.
    ///
    /// Holds the store write lock for the whole rebuild, so an assignment
    /// landing concurrently is either part of the snapshot or waits for the
    /// new partition; a stored comment is never left outside every cluster.
    pub fn recluster(&self) -> Vec<DuplicateCluster> {
        let mut store = self.store_write();

        let mut ordered: Vec<&ProcessedComment> = store.values().collect();
        ordered.sort_by(|a, b| {
            a.comment
                .created_at
                .cmp(&b.comment.created_at)
                .then(a.comment.id.cmp(&b.comment.id))
        });
        let items: Vec<(Uuid, Vec<f32>)> = ordered
            .into_iter()
            .map(|p| (p.comment.id, p.embedding.clone()))
            .collect();

        let clusters = self.dedup.recluster(&items);

        let assignment: HashMap<Uuid, u64> = clusters
            .iter()
            .flat_map(|c| {
                c.member_comment_ids
                    .iter()
                    .map(move |m| (*m, c.cluster_id))
            })
            .collect();
        for (id, processed) in store.iter_mut() {
            if let Some(cluster_id) = assignment.get(id) {
                processed.cluster_id = *cluster_id;
            }
        }
        clusters
    }

    /// Drop every processed comment, cluster, and counter while keeping the
    /// active draft loaded. Meant for the gap between runs; a comment still
    /// in flight records its analytics outcome after the counters were
    /// cleared.
    pub fn reset(&self) {
        self.store_write().clear();
        self.dedup.clear();
        self.analytics.reset();
        info!("pipeline state reset");
    }
}
