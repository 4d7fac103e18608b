//! TF-IDF retriever over a fixed chunk corpus.
//!
//! The vector space is built once in [`TfIdfIndex::index`] and never
//! mutated afterwards, so one index can be shared behind an `Arc` and
//! queried from any number of sessions at once. A changed corpus means a
//! new index.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use super::store::Chunk;
use super::text::tokenize;

/// Sparse L2-normalised document vector: term id -> weight.
type SparseVector = HashMap<usize, f32>;

/// A chunk together with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Default)]
pub struct TfIdfIndex {
    chunks: Vec<Chunk>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    vectors: Vec<SparseVector>,
}

impl TfIdfIndex {
    /// Build the vector space over `chunks`.
    pub fn index(chunks: Vec<Chunk>) -> Self {
        let tokenized: Vec<Vec<String>> = chunks.iter().map(|c| tokenize(&c.text)).collect();

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen = std::collections::HashSet::new();
            for token in tokens {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(token.clone()).or_insert(next_id);
                if id == doc_freq.len() {
                    doc_freq.push(0);
                }
                if seen.insert(id) {
                    doc_freq[id] += 1;
                }
            }
        }

        // Smoothed IDF: ln((1 + n) / (1 + df)) + 1
        let n = chunks.len() as f32;
        let idf: Vec<f32> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let vectors = tokenized
            .iter()
            .map(|tokens| weigh(tokens, &vocabulary, &idf))
            .collect();

        debug!(
            chunks = chunks.len(),
            terms = vocabulary.len(),
            "Built TF-IDF index"
        );

        Self {
            chunks,
            vocabulary,
            idf,
            vectors,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The `top_n` chunks most similar to `text`, best first.
    pub fn query(&self, text: &str, top_n: usize) -> Vec<Chunk> {
        self.query_scored(text, top_n)
            .into_iter()
            .map(|scored| scored.chunk)
            .collect()
    }

    /// Like [`query`](Self::query) but keeps the similarity scores.
    ///
    /// Ties (including all-zero similarity) keep original chunk order.
    pub fn query_scored(&self, text: &str, top_n: usize) -> Vec<ScoredChunk> {
        if self.chunks.is_empty() || top_n == 0 {
            return Vec::new();
        }

        let query = weigh(&tokenize(text), &self.vocabulary, &self.idf);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, cosine(&query, doc)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(top_n);

        scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect()
    }
}

/// Raw term frequency times IDF, L2-normalised. Terms outside the
/// vocabulary are ignored.
fn weigh(tokens: &[String], vocabulary: &HashMap<String, usize>, idf: &[f32]) -> SparseVector {
    let mut vector = SparseVector::new();
    for token in tokens {
        if let Some(&id) = vocabulary.get(token) {
            *vector.entry(id).or_insert(0.0) += 1.0;
        }
    }
    for (id, weight) in vector.iter_mut() {
        *weight *= idf[*id];
    }

    let norm = vector.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for weight in vector.values_mut() {
            *weight /= norm;
        }
    }
    vector
}

/// Dot product of two unit vectors.
fn cosine(a: &SparseVector, b: &SparseVector) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(id, w)| large.get(id).map(|v| w * v))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(texts: &[&str]) -> TfIdfIndex {
        TfIdfIndex::index(texts.iter().map(|t| Chunk::new(*t)).collect())
    }

    #[test]
    fn claim_question_finds_the_claims_chunk() {
        let index = corpus(&[
            "The policy covers dental.",
            "Claims must be filed within 30 days.",
        ]);
        let hits = index.query("How do I file a claim?", 1);
        assert_eq!(hits, vec![Chunk::new("Claims must be filed within 30 days.")]);
    }

    #[test]
    fn empty_corpus_returns_nothing() {
        let index = TfIdfIndex::index(Vec::new());
        assert!(index.is_empty());
        assert!(index.query("anything at all", 3).is_empty());
    }

    #[test]
    fn top_one_always_returns_a_corpus_chunk() {
        let index = corpus(&["Alpha beta.", "Gamma delta."]);
        for query in ["", "unrelated words", "gamma", "!!!"] {
            let hits = index.query(query, 1);
            assert_eq!(hits.len(), 1, "query {query:?}");
            assert!(index.chunks().contains(&hits[0]));
        }
    }

    #[test]
    fn zero_similarity_ties_keep_corpus_order() {
        let index = corpus(&["First chunk.", "Second chunk.", "Third chunk."]);
        let hits = index.query("nothing matches here", 2);
        assert_eq!(hits, vec![Chunk::new("First chunk."), Chunk::new("Second chunk.")]);
    }

    #[test]
    fn results_are_ranked_by_similarity() {
        let index = corpus(&[
            "Premiums are due monthly.",
            "Travel coverage outside the country lasts six months.",
            "Coverage for travel and premiums together.",
        ]);
        let scored = index.query_scored("travel coverage outside the country", 3);
        assert_eq!(scored.len(), 3);
        assert_eq!(scored[0].chunk.text, "Travel coverage outside the country lasts six months.");
        assert!(scored[0].score >= scored[1].score);
        assert!(scored[1].score >= scored[2].score);
        assert_eq!(scored[2].score, 0.0);
    }

    #[test]
    fn top_n_larger_than_corpus_returns_everything() {
        let index = corpus(&["one thing", "another thing"]);
        assert_eq!(index.query("thing", 10).len(), 2);
        assert!(index.query("thing", 0).is_empty());
    }

    #[test]
    fn identical_text_scores_one() {
        let index = corpus(&["Dental cover applies after six months."]);
        let scored = index.query_scored("Dental cover applies after six months.", 1);
        assert!((scored[0].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn index_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TfIdfIndex>();
    }
}
