//! Text embedding boundary.
//!
//! The pipeline treats embedding as a pluggable black-box function: text in,
//! fixed-length normalised vector out. [`HashEmbedder`] is the default
//! backend, a deterministic token feature-hashing embedder that needs no
//! model files and gives identical vectors for identical token streams. The
//! `onnx` feature adds a sentence-transformers backend with the same
//! contract.

/// A fixed-length text embedding function.
///
/// Implementations must be deterministic for a given input and return unit
/// vectors (or the zero vector for inputs with no signal) so cosine
/// similarity reduces to a dot product.
pub trait Embedder: Send + Sync {
    /// Embedding dimensionality; every returned vector has this length.
    fn dim(&self) -> usize;

    /// Embed a single text, returning a normalised vector.
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Embed a batch of texts, one vector per input.
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Deterministic bag-of-tokens embedder using feature hashing.
///
/// Tokens are lowercased alphanumeric runs; each token's FNV-1a hash picks a
/// bucket and the bucket counts are L2-normalised. Near-identical texts
/// ("Excellent initiative!" vs "Excellent initiative !!") hash to the same
/// buckets and embed identically; unrelated texts share buckets only by
/// collision. Empty or punctuation-only input yields the zero vector.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    /// 384 buckets, matching the dimensionality of the MiniLM family so the
    /// two backends are interchangeable downstream.
    pub const DEFAULT_DIM: usize = 384;

    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0.0f32; self.dim];
        for token in tokens(text) {
            let bucket = (fnv1a(token.as_bytes()) as usize) % self.dim;
            v[bucket] += 1.0;
        }
        normalize(&mut v);
        Ok(v)
    }
}

/// Lowercased alphanumeric token stream.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Cosine similarity of two unit vectors (a plain dot product).
pub fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2-normalize a vector in place.
pub fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_to_unit_norm() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("Every application shall be processed").unwrap();
        assert_eq!(v.len(), 384);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "expected unit norm, got {norm}");
    }

    #[test]
    fn deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("processing timeline").unwrap();
        let b = embedder.embed("processing timeline").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn punctuation_is_ignored() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("Excellent initiative!").unwrap();
        let b = embedder.embed("Excellent initiative !!").unwrap();
        assert!((cosine_sim(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn unrelated_texts_are_distant() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("Excellent initiative!").unwrap();
        let b = embedder
            .embed("The penalty schedule needs complete rework")
            .unwrap();
        assert!(cosine_sim(&a, &b) < 0.5);
    }

    #[test]
    fn shared_tokens_raise_similarity() {
        let embedder = HashEmbedder::default();
        let timeline = embedder.embed("the processing timeline is too long").unwrap();
        let clause = embedder
            .embed("processing timeline within fifteen working days")
            .unwrap();
        let unrelated = embedder.embed("registration fees for small firms").unwrap();
        assert!(cosine_sim(&timeline, &clause) > cosine_sim(&timeline, &unrelated));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("").unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
        let w = embedder.embed("  !! ?? ").unwrap();
        assert!(w.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn batch_matches_single() {
        let embedder = HashEmbedder::default();
        let batch = embedder.embed_batch(&["one text", "another text"]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed("one text").unwrap());
    }
}
