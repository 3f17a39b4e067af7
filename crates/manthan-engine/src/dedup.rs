//! Near-duplicate clustering over comment embeddings.
//!
//! Online assignment compares each new comment against every cluster
//! representative and joins the best match at or above the similarity
//! threshold, otherwise opens a singleton. The check-and-create is a single
//! critical section so two concurrent near-duplicates cannot both open a
//! cluster. `recluster` rebuilds the partition from scratch with
//! single-linkage over all pairs, which can merge clusters the greedy online
//! pass kept apart.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;
use uuid::Uuid;

use manthan_ai::cosine_sim;
use manthan_core::types::DuplicateCluster;

struct ClusterEntry {
    id: u64,
    representative: Uuid,
    embedding: Vec<f32>,
    members: HashSet<Uuid>,
}

#[derive(Default)]
struct State {
    clusters: Vec<ClusterEntry>,
    next_id: u64,
}

pub struct DedupClusterer {
    similarity_threshold: f32,
    state: Mutex<State>,
}

impl DedupClusterer {
    pub fn new(similarity_threshold: f32) -> Self {
        Self {
            similarity_threshold,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Assign a comment to a cluster, returning the cluster id.
    ///
    /// A zero embedding carries no signal and always opens a singleton.
    pub fn assign(&self, comment_id: Uuid, embedding: &[f32]) -> u64 {
        let mut state = self.lock();

        if embedding.iter().any(|&x| x != 0.0) {
            let best = state
                .clusters
                .iter_mut()
                .map(|c| (cosine_sim(embedding, &c.embedding), c))
                .filter(|(sim, _)| *sim >= self.similarity_threshold)
                .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            if let Some((similarity, cluster)) = best {
                cluster.members.insert(comment_id);
                debug!(
                    comment_id = %comment_id,
                    cluster_id = cluster.id,
                    similarity,
                    "joined duplicate cluster"
                );
                return cluster.id;
            }
        }

        let id = state.next_id;
        state.next_id += 1;
        state.clusters.push(ClusterEntry {
            id,
            representative: comment_id,
            embedding: embedding.to_vec(),
            members: HashSet::from([comment_id]),
        });
        id
    }

    pub fn cluster_of(&self, comment_id: Uuid) -> Option<u64> {
        self.lock()
            .clusters
            .iter()
            .find(|c| c.members.contains(&comment_id))
            .map(|c| c.id)
    }

    pub fn clusters(&self) -> Vec<DuplicateCluster> {
        self.lock()
            .clusters
            .iter()
            .map(|c| DuplicateCluster {
                cluster_id: c.id,
                representative_comment_id: c.representative,
                member_comment_ids: c.members.clone(),
            })
            .collect()
    }

    pub fn cluster_count(&self) -> usize {
        self.lock().clusters.len()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.clusters.clear();
    }

    /// Rebuild the partition from scratch with single-linkage over all
    /// pairs, then atomically replace the online state. Cluster ids continue
    /// from where the online counter left off; zero embeddings stay
    /// singletons.
    pub fn recluster(&self, items: &[(Uuid, Vec<f32>)]) -> Vec<DuplicateCluster> {
        let n = items.len();
        let mut parent: Vec<usize> = (0..n).collect();

        fn root(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        for i in 0..n {
            if items[i].1.iter().all(|&x| x == 0.0) {
                continue;
            }
            for j in (i + 1)..n {
                if items[j].1.iter().all(|&x| x == 0.0) {
                    continue;
                }
                if cosine_sim(&items[i].1, &items[j].1) >= self.similarity_threshold {
                    let (ri, rj) = (root(&mut parent, i), root(&mut parent, j));
                    if ri != rj {
                        parent[rj] = ri;
                    }
                }
            }
        }

        let mut state = self.lock();
        let mut clusters: Vec<ClusterEntry> = Vec::new();
        let mut root_to_cluster: Vec<Option<usize>> = vec![None; n];

        for (i, (comment_id, embedding)) in items.iter().enumerate() {
            let r = root(&mut parent, i);
            match root_to_cluster[r] {
                Some(pos) => {
                    clusters[pos].members.insert(*comment_id);
                }
                None => {
                    let id = state.next_id;
                    state.next_id += 1;
                    root_to_cluster[r] = Some(clusters.len());
                    clusters.push(ClusterEntry {
                        id,
                        representative: *comment_id,
                        embedding: embedding.clone(),
                        members: HashSet::from([*comment_id]),
                    });
                }
            }
        }

        debug!(comments = n, clusters = clusters.len(), "reclustered");
        state.clusters = clusters;
        state
            .clusters
            .iter()
            .map(|c| DuplicateCluster {
                cluster_id: c.id,
                representative_comment_id: c.representative,
                member_comment_ids: c.members.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manthan_ai::{Embedder, HashEmbedder};

    fn embed(text: &str) -> Vec<f32> {
        HashEmbedder::default().embed(text).unwrap()
    }

    #[test]
    fn identical_texts_share_a_cluster() {
        let dedup = DedupClusterer::new(0.92);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let e = embed("Excellent initiative, fully support this.");
        assert_eq!(dedup.assign(a, &e), dedup.assign(b, &e));
        assert_eq!(dedup.cluster_count(), 1);
    }

    #[test]
    fn distinct_texts_open_separate_clusters() {
        let dedup = DedupClusterer::new(0.92);
        let a = dedup.assign(Uuid::new_v4(), &embed("Excellent initiative, fully support."));
        let b = dedup.assign(Uuid::new_v4(), &embed("The penalty schedule needs rework."));
        assert_ne!(a, b);
        assert_eq!(dedup.cluster_count(), 2);
    }

    #[test]
    fn punctuation_variants_merge() {
        let dedup = DedupClusterer::new(0.92);
        let a = dedup.assign(Uuid::new_v4(), &embed("Excellent initiative!"));
        let b = dedup.assign(Uuid::new_v4(), &embed("Excellent initiative !!"));
        assert_eq!(a, b);
    }

    #[test]
    fn zero_embedding_is_always_a_singleton() {
        let dedup = DedupClusterer::new(0.92);
        let zero = vec![0.0f32; 384];
        let a = dedup.assign(Uuid::new_v4(), &zero);
        let b = dedup.assign(Uuid::new_v4(), &zero);
        assert_ne!(a, b);
    }

    #[test]
    fn representative_is_first_member() {
        let dedup = DedupClusterer::new(0.92);
        let first = Uuid::new_v4();
        let e = embed("same text");
        dedup.assign(first, &e);
        dedup.assign(Uuid::new_v4(), &e);
        let clusters = dedup.clusters();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].representative_comment_id, first);
        assert_eq!(clusters[0].size(), 2);
    }

    #[test]
    fn cluster_of_finds_membership() {
        let dedup = DedupClusterer::new(0.92);
        let id = Uuid::new_v4();
        let cluster = dedup.assign(id, &embed("some comment"));
        assert_eq!(dedup.cluster_of(id), Some(cluster));
        assert_eq!(dedup.cluster_of(Uuid::new_v4()), None);
    }

    #[test]
    fn clear_empties_state() {
        let dedup = DedupClusterer::new(0.92);
        dedup.assign(Uuid::new_v4(), &embed("a comment"));
        dedup.clear();
        assert_eq!(dedup.cluster_count(), 0);
    }

    #[test]
    fn recluster_rebuilds_partition() {
        let dedup = DedupClusterer::new(0.92);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let dup = embed("Please withdraw this rule immediately.");
        let other = embed("The fee schedule in clause five is fine.");

        let items = vec![(a, dup.clone()), (b, dup.clone()), (c, other.clone())];
        let clusters = dedup.recluster(&items);

        assert_eq!(clusters.len(), 2);
        let dup_cluster = clusters.iter().find(|cl| cl.member_comment_ids.contains(&a)).unwrap();
        assert!(dup_cluster.member_comment_ids.contains(&b));
        assert_eq!(dup_cluster.representative_comment_id, a);
        assert_eq!(dedup.cluster_count(), 2);
    }

    #[test]
    fn recluster_ids_continue_monotonically() {
        let dedup = DedupClusterer::new(0.92);
        dedup.assign(Uuid::new_v4(), &embed("first"));
        dedup.assign(Uuid::new_v4(), &embed("second distinct"));

        let items = vec![(Uuid::new_v4(), embed("third"))];
        let clusters = dedup.recluster(&items);
        assert!(clusters[0].cluster_id >= 2);
    }

    #[test]
    fn concurrent_duplicates_share_one_cluster() {
        use std::sync::Arc;

        let dedup = Arc::new(DedupClusterer::new(0.92));
        let e = embed("identical concurrent comment");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dedup = Arc::clone(&dedup);
                let e = e.clone();
                std::thread::spawn(move || dedup.assign(Uuid::new_v4(), &e))
            })
            .collect();
        let ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.iter().all(|&id| id == ids[0]));
        assert_eq!(dedup.cluster_count(), 1);
    }
}
