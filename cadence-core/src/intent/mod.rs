//! Intent classification against a fixed, pre-computed prompt-embedding
//! matrix.

use crate::error::Result;

/// One classification outcome.
#[derive(Debug, Clone)]
pub struct IntentResult {
    pub prompt_id: String,
    pub score: f32,
    pub latency_ms: f64,
}

/// Contract for intent classification. Loads a fixed prompt list and
/// pre-computed embedding matrix at construction time (outside this
/// crate's required surface — the concrete embedding model is an external
/// collaborator); `classify` is deterministic per `(text, config)`.
pub trait IntentClassifier: Send + Sync + 'static {
    fn classify(&self, text: &str) -> Result<IntentResult>;
}

/// Encodes text into a fixed-length embedding vector. Kept separate from
/// [`IntentClassifier`] so the dot-product scoring logic can be tested
/// without a real embedding model.
pub trait TextEmbedder: Send + Sync + 'static {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Classifies by encoding the input and taking the argmax dot product
/// against a fixed prompt-embedding matrix — the row index becomes the
/// `prompt_id`.
pub struct DotProductClassifier<E: TextEmbedder> {
    embedder: E,
    embeddings: Vec<Vec<f32>>,
}

impl<E: TextEmbedder> DotProductClassifier<E> {
    pub fn new(embedder: E, embeddings: Vec<Vec<f32>>) -> Self {
        Self { embedder, embeddings }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

impl<E: TextEmbedder> IntentClassifier for DotProductClassifier<E> {
    fn classify(&self, text: &str) -> Result<IntentResult> {
        let start = std::time::Instant::now();
        let query = self.embedder.embed(text);

        let mut best_idx = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (idx, row) in self.embeddings.iter().enumerate() {
            let score = dot(&query, row);
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }

        Ok(IntentResult {
            prompt_id: best_idx.to_string(),
            score: if self.embeddings.is_empty() { 0.0 } else { best_score },
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

/// A trivial bag-of-characters embedder — deterministic, dependency-free,
/// good enough for tests that only need distinguishable vectors.
pub struct StubEmbedder {
    pub dims: usize,
}

impl TextEmbedder for StubEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dims];
        for (i, byte) in text.bytes().enumerate() {
            v[i % self.dims] += byte as f32;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in v.iter_mut() {
                *x /= norm;
            }
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_selects_the_closest_prompt() {
        let embedder = StubEmbedder { dims: 8 };
        let prompts = vec!["what is your budget", "tell me about your timeline"];
        let embeddings: Vec<Vec<f32>> = prompts.iter().map(|p| embedder.embed(p)).collect();
        let classifier = DotProductClassifier::new(embedder, embeddings);

        let result = classifier.classify("what is your budget").unwrap();
        assert_eq!(result.prompt_id, "0");
        assert!(result.score > 0.9, "exact match should score near 1.0, got {}", result.score);
    }

    #[test]
    fn empty_embedding_matrix_yields_zero_score() {
        let embedder = StubEmbedder { dims: 4 };
        let classifier = DotProductClassifier::new(embedder, vec![]);
        let result = classifier.classify("anything").unwrap();
        assert_eq!(result.prompt_id, "0");
        assert_eq!(result.score, 0.0);
    }
}
