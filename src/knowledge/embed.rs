//! Text embeddings for similarity search.
//!
//! [`HashedEmbedder`] hashes each token with SHA-256 into one of `dim`
//! buckets with a sign taken from the digest, so vectors are stable across
//! processes and builds. Vectors are L2-normalized, making cosine similarity
//! a dot product.

use ndarray::{Array1, Array2};
use sha2::{Digest, Sha256};

/// Maps text to L2-normalized vectors of a fixed dimension.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;

    fn embed(&self, text: &str) -> Array1<f32>;

    /// Embed a batch into a (texts × dim) matrix.
    fn embed_batch(&self, texts: &[String]) -> Array2<f32> {
        let mut matrix = Array2::zeros((texts.len(), self.dim()));
        for (i, text) in texts.iter().enumerate() {
            matrix.row_mut(i).assign(&self.embed(text));
        }
        matrix
    }
}

/// Cosine similarity of one normalized query against every row of `docs`.
pub fn cosine_similarity(query: &Array1<f32>, docs: &Array2<f32>) -> Vec<f32> {
    docs.outer_iter().map(|doc| query.dot(&doc)).collect()
}

#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dim: usize,
}

impl HashedEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    /// Lower-cased alphanumeric runs. Dotted identifiers such as
    /// `java.io.IOException` split into their parts.
    pub fn tokenize(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect()
    }

}

impl Embedder for HashedEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Array1<f32> {
        let mut vector = Array1::<f32>::zeros(self.dim);

        for token in Self::tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut prefix = [0u8; 8];
            prefix.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(prefix) % self.dim as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.dot(&vector).sqrt();
        if norm > 0.0 {
            vector /= norm;
        }
        vector
    }
}
