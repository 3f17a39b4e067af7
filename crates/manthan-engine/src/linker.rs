//! Clause linking: combine lexical and semantic evidence into ranked
//! clause candidates for one comment.

use std::collections::HashSet;

use manthan_ai::cosine_sim;
use manthan_core::config::PipelineConfig;
use manthan_core::types::{ClauseLink, LinkCandidate};

use crate::index::ClauseIndex;

/// Score the comment against every clause in the index and keep the best
/// candidates.
///
/// An explicit citation of a clause's numbering pins that clause at 1.0.
/// Otherwise the score is a weighted blend of token overlap and embedding
/// cosine similarity; negative cosine is clamped to zero so an unrelated
/// clause cannot drag a partial lexical match below the floor. Candidates
/// under the floor are dropped, and a comment may legitimately link to
/// nothing. The result carries each clause reference at most once; when two
/// clauses share a reference the better-scoring (then earlier) one wins.
pub fn link(
    index: &ClauseIndex,
    normalized_text: &str,
    embedding: &[f32],
    config: &PipelineConfig,
) -> ClauseLink {
    let mut scored: Vec<(usize, f32)> = index
        .candidates(normalized_text)
        .into_iter()
        .map(|(clause_idx, lexical)| {
            let score = if lexical >= 1.0 {
                1.0
            } else {
                let semantic = cosine_sim(embedding, index.embedding(clause_idx)).max(0.0);
                config.lexical_weight * lexical + config.semantic_weight * semantic
            };
            (clause_idx, score)
        })
        .filter(|(_, score)| *score >= config.link_score_floor)
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    let mut seen = HashSet::new();
    scored.retain(|(clause_idx, _)| {
        seen.insert(index.draft().clauses[*clause_idx].reference.clone())
    });
    scored.truncate(config.max_clause_candidates);

    ClauseLink {
        candidates: scored
            .into_iter()
            .map(|(clause_idx, score)| LinkCandidate {
                clause_reference: index.draft().clauses[clause_idx].reference.clone(),
                score,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manthan_ai::{Embedder, HashEmbedder};
    use manthan_core::types::Draft;

    fn index() -> ClauseIndex {
        let draft = Draft::from_clause_texts(
            "d1",
            "Draft Rules",
            vec![
                "1. Short title and commencement".to_string(),
                "4. Every application shall be processed within 15 working days".to_string(),
                "7. Penalties for non-compliance with audit requirements".to_string(),
            ],
        );
        ClauseIndex::build(draft, 1, &HashEmbedder::default()).unwrap()
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn explicit_citation_scores_one() {
        let ix = index();
        let embedder = HashEmbedder::default();
        let text = "section 4 is unworkable";
        let emb = embedder.embed(text).unwrap();
        let link = link(&ix, text, &emb, &config());
        assert_eq!(link.top().unwrap().clause_reference, "4");
        assert_eq!(link.top().unwrap().score, 1.0);
    }

    #[test]
    fn overlapping_text_links_to_related_clause() {
        let ix = index();
        let embedder = HashEmbedder::default();
        let text = "the application processing time of 15 working days is too long";
        let emb = embedder.embed(text).unwrap();
        let link = link(&ix, text, &emb, &config());
        assert_eq!(link.top().unwrap().clause_reference, "4");
        assert!(link.top().unwrap().score < 1.0);
    }

    #[test]
    fn unrelated_comment_links_to_nothing() {
        let ix = index();
        let embedder = HashEmbedder::default();
        let text = "zzzz qqqq xxxx";
        let emb = embedder.embed(text).unwrap();
        let link = link(&ix, text, &emb, &config());
        assert!(link.is_empty());
    }

    #[test]
    fn candidates_sorted_descending() {
        let ix = index();
        let embedder = HashEmbedder::default();
        let text = "the application shall be processed within days, penalties for audit";
        let emb = embedder.embed(text).unwrap();
        let link = link(&ix, text, &emb, &config());
        for pair in link.candidates.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn respects_candidate_cap() {
        let ix = index();
        let embedder = HashEmbedder::default();
        let mut cfg = config();
        cfg.max_clause_candidates = 1;
        cfg.link_score_floor = 0.0;
        let text = "application processing penalties audit title";
        let emb = embedder.embed(text).unwrap();
        let link = link(&ix, text, &emb, &cfg);
        assert_eq!(link.candidates.len(), 1);
    }

    #[test]
    fn shared_references_yield_one_candidate() {
        // A draft whose fallback numbering collides with an explicit one:
        // the unnumbered second clause gets positional reference "2".
        let draft = Draft::from_clause_texts(
            "d1",
            "t",
            vec![
                "2. Fees for registration of applicants".to_string(),
                "unnumbered clause about registration fees".to_string(),
            ],
        );
        let ix = ClauseIndex::build(draft, 1, &HashEmbedder::default()).unwrap();
        let embedder = HashEmbedder::default();
        let text = "section 2 on registration fees";
        let emb = embedder.embed(text).unwrap();

        let link = link(&ix, text, &emb, &config());
        assert_eq!(link.candidates.len(), 1);
        assert_eq!(link.top().unwrap().clause_reference, "2");
        assert_eq!(link.top().unwrap().score, 1.0);
    }

    #[test]
    fn zero_embedding_still_uses_lexical_evidence() {
        let ix = index();
        let zero = vec![0.0; HashEmbedder::default().dim()];
        let mut cfg = config();
        cfg.link_score_floor = 0.05;
        let link = link(&ix, "application shall be processed", &zero, &cfg);
        assert_eq!(link.top().unwrap().clause_reference, "4");
    }
}
