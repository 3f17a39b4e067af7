//! Clause index: one embedding per clause plus lexical candidate scoring,
//! behind a versioned atomic swap.
//!
//! The index is read-mostly. Readers take an `Arc` snapshot and keep using
//! it even if a draft replacement lands mid-request; the version counter
//! lets the caller detect the swap and retry against the new snapshot. Two
//! drafts' clause sets are never mixed.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::info;

use manthan_ai::Embedder;
use manthan_core::clause_ref::extract_references;
use manthan_core::types::Draft;

/// Searchable snapshot of one draft version.
pub struct ClauseIndex {
    draft: Arc<Draft>,
    version: u64,
    clause_tokens: Vec<HashSet<String>>,
    embeddings: Vec<Vec<f32>>,
}

impl ClauseIndex {
    /// Build an index: one embedding call per clause, one token set for
    /// lexical overlap scoring.
    pub fn build(draft: Draft, version: u64, embedder: &dyn Embedder) -> anyhow::Result<Self> {
        let texts: Vec<&str> = draft.clauses.iter().map(|c| c.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts)?;
        let clause_tokens = draft
            .clauses
            .iter()
            .map(|c| tokens(&c.text))
            .collect();

        info!(
            draft_id = %draft.id,
            clauses = draft.clauses.len(),
            version,
            "built clause index"
        );

        Ok(Self {
            draft: Arc::new(draft),
            version,
            clause_tokens,
            embeddings,
        })
    }

    pub fn draft(&self) -> &Arc<Draft> {
        &self.draft
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn clause_count(&self) -> usize {
        self.draft.clauses.len()
    }

    pub fn embedding(&self, clause_index: usize) -> &[f32] {
        &self.embeddings[clause_index]
    }

    /// Lexical candidate scores for every clause, best first (ties break on
    /// clause order).
    ///
    /// A clause whose numbering token is cited verbatim in the text scores
    /// 1.0; otherwise the score is the Jaccard overlap between the comment's
    /// and the clause's token sets.
    pub fn candidates(&self, normalized_text: &str) -> Vec<(usize, f32)> {
        let cited: HashSet<String> = extract_references(normalized_text).into_iter().collect();
        let comment_tokens = tokens(normalized_text);

        let mut scored: Vec<(usize, f32)> = self
            .draft
            .clauses
            .iter()
            .enumerate()
            .map(|(i, clause)| {
                let score = if cited.contains(&clause.reference) {
                    1.0
                } else {
                    jaccard(&comment_tokens, &self.clause_tokens[i])
                };
                (i, score)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

/// Holder of the active clause index with atomic replacement.
///
/// Readers get `Arc` snapshots; a replacement builds the new index off-lock,
/// then swaps under the write lock. In-flight reads finish against their
/// snapshot; new reads see only the new draft.
pub struct DraftSlot {
    inner: RwLock<Option<Arc<ClauseIndex>>>,
    next_version: AtomicU64,
}

impl Default for DraftSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftSlot {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
            next_version: AtomicU64::new(1),
        }
    }

    /// Replace the active draft, discarding the previous index.
    pub fn replace(
        &self,
        draft: Draft,
        embedder: &dyn Embedder,
    ) -> anyhow::Result<Arc<ClauseIndex>> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let index = Arc::new(ClauseIndex::build(draft, version, embedder)?);
        let mut slot = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("draft slot poisoned"))?;
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = None;
        }
    }

    /// Current index snapshot, if a draft is loaded.
    pub fn snapshot(&self) -> Option<Arc<ClauseIndex>> {
        self.inner.read().ok().and_then(|s| s.clone())
    }

    /// Version of the active index, if any. Compare with a snapshot's
    /// version to detect a swap that raced a read.
    pub fn current_version(&self) -> Option<u64> {
        self.inner
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|ix| ix.version()))
    }
}
