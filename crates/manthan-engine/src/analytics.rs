//! Streaming analytics counters and their snapshot projection.
//!
//! Counters are updated once per pipeline outcome and read by projecting an
//! [`AnalyticsSnapshot`]. A snapshot is internally consistent (taken under
//! one read lock) and `processed + failed <= total_received` holds, with
//! equality once no comment is in flight. A reset that races in-flight
//! processing can transiently skew the totals: a comment received before
//! the reset records its outcome after it. Reset between runs, not during
//! ingestion.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use manthan_core::types::{AnalyticsSnapshot, Classification, ClauseLink};

#[derive(Default)]
struct Counters {
    total_received: u64,
    processed: u64,
    failed: u64,
    sentiment: BTreeMap<String, u64>,
    stance: BTreeMap<String, u64>,
    language: BTreeMap<String, u64>,
    method: BTreeMap<String, u64>,
    needs_review: u64,
    confidence_sum: f64,
    clause_mentions: BTreeMap<String, u64>,
}

#[derive(Default)]
pub struct Aggregator {
    counters: RwLock<Counters>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> RwLockWriteGuard<'_, Counters> {
        match self.counters.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Counters> {
        match self.counters.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// A comment entered the pipeline.
    pub fn record_received(&self) {
        self.write().total_received += 1;
    }

    /// A comment completed processing. Each distinct linked clause counts
    /// one mention.
    pub fn record_processed(&self, classification: &Classification, language: &str, link: &ClauseLink) {
        let mut c = self.write();
        c.processed += 1;
        *c.sentiment
            .entry(classification.sentiment.as_str().to_string())
            .or_default() += 1;
        *c.stance
            .entry(classification.stance.as_str().to_string())
            .or_default() += 1;
        *c.language.entry(language.to_string()).or_default() += 1;
        *c.method
            .entry(classification.method.as_str().to_string())
            .or_default() += 1;
        if classification.needs_review {
            c.needs_review += 1;
        }
        c.confidence_sum += classification.confidence as f64;
        for candidate in &link.candidates {
            *c.clause_mentions
                .entry(candidate.clause_reference.clone())
                .or_default() += 1;
        }
    }

    /// A comment failed validation or processing.
    pub fn record_failed(&self) {
        self.write().failed += 1;
    }

    /// Zero every counter.
    pub fn reset(&self) {
        *self.write() = Counters::default();
    }

    /// Project a consistent snapshot. `cluster_count` comes from the
    /// clusterer because cluster membership is not a counter.
    pub fn snapshot(&self, top_n: usize, cluster_count: u64) -> AnalyticsSnapshot {
        let c = self.read();

        let mut top_clauses: Vec<(String, u64)> = c
            .clause_mentions
            .iter()
            .map(|(reference, count)| (reference.clone(), *count))
            .collect();
        top_clauses.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        top_clauses.truncate(top_n);

        let mean_confidence = if c.processed > 0 {
            c.confidence_sum / c.processed as f64
        } else {
            0.0
        };

        AnalyticsSnapshot {
            total_received: c.total_received,
            processed: c.processed,
            failed: c.failed,
            sentiment_distribution: c.sentiment.clone(),
            stance_distribution: c.stance.clone(),
            language_distribution: c.language.clone(),
            method_distribution: c.method.clone(),
            needs_review: c.needs_review,
            mean_confidence,
            top_clauses,
            cluster_count,
        }
    }
}
