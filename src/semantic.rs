//! TF-IDF vector space over the FAQ questions.

use ndarray::{Array1, Array2};
use std::collections::HashMap;

use crate::engine::MatchResult;
use crate::faq::FaqStore;
use crate::text::{compose_response, tokenize, DEFAULT_UNKNOWN_RESPONSE};

/// Vocabulary, IDF weights and one TF-IDF row per FAQ question.
/// Row `i` always corresponds to FAQ entry `i`.
#[derive(Debug, Clone)]
pub struct SemanticIndex {
    vocab: HashMap<String, usize>,
    idf: Array1<f32>,
    matrix: Array2<f32>,
    norms: Array1<f32>,
}

/// Term counts over `tokens` for the ids present in `vocab`, plus how many were counted.
fn term_counts(tokens: &[String], vocab: &HashMap<String, usize>) -> (HashMap<usize, usize>, usize) {
    let mut counts = HashMap::new();
    let mut total = 0;
    for token in tokens {
        if let Some(&idx) = vocab.get(token) {
            *counts.entry(idx).or_insert(0) += 1;
            total += 1;
        }
    }
    (counts, total)
}

impl SemanticIndex {
    pub fn build(faq: &FaqStore) -> Self {
        let docs_tokens: Vec<Vec<String>> = faq.questions().map(tokenize).collect();

        let mut vocab = HashMap::new();
        for token in docs_tokens.iter().flatten() {
            if !vocab.contains_key(token) {
                let len = vocab.len();
                vocab.insert(token.clone(), len);
            }
        }

        let num_docs = docs_tokens.len();
        let mut doc_freq = Array1::<f32>::zeros(vocab.len());
        for tokens in &docs_tokens {
            let (counts, _) = term_counts(tokens, &vocab);
            for idx in counts.keys() {
                doc_freq[*idx] += 1.0;
            }
        }
        let idf = doc_freq.mapv(|df| ((num_docs as f32 + 1.0) / (df + 1.0)).ln() + 1.0);

        let mut matrix = Array2::<f32>::zeros((num_docs, vocab.len()));
        for (row, tokens) in docs_tokens.iter().enumerate() {
            let (counts, total) = term_counts(tokens, &vocab);
            for (idx, count) in counts {
                matrix[[row, idx]] = (count as f32 / total.max(1) as f32) * idf[idx];
            }
        }
        let norms = matrix.map_axis(ndarray::Axis(1), |row| row.dot(&row).sqrt());

        log::info!(
            "Semantic index built: {} questions, {} vocabulary terms",
            num_docs,
            vocab.len()
        );
        Self { vocab, idf, matrix, norms }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.vocab.contains_key(token)
    }

    pub fn vocab_len(&self) -> usize {
        self.vocab.len()
    }

    pub fn idf(&self, token: &str) -> Option<f32> {
        self.vocab.get(token).map(|&idx| self.idf[idx])
    }

    /// TF-IDF vector of `text`. Out-of-vocabulary tokens are ignored;
    /// `None` when nothing in the text is known.
    pub fn vectorize(&self, text: &str) -> Option<Array1<f32>> {
        let tokens = tokenize(text);
        let (counts, total) = term_counts(&tokens, &self.vocab);
        if counts.is_empty() {
            return None;
        }
        let mut vec = Array1::<f32>::zeros(self.vocab.len());
        for (idx, count) in counts {
            vec[idx] = (count as f32 / total.max(1) as f32) * self.idf[idx];
        }
        Some(vec)
    }

    /// Index and cosine similarity of the closest question, `None` when the
    /// query cannot be measured (empty corpus or no known tokens).
    pub fn nearest(&self, text: &str) -> Option<(usize, f32)> {
        if self.matrix.nrows() == 0 || self.vocab.is_empty() {
            return None;
        }
        let vec = self.vectorize(text)?;
        let vec_norm = vec.dot(&vec).sqrt();
        if vec_norm == 0.0 {
            return None;
        }

        let dots = self.matrix.dot(&vec);
        dots.iter()
            .zip(self.norms.iter())
            .map(|(dot, norm)| if *norm == 0.0 { 0.0 } else { dot / (norm * vec_norm) })
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, score)| match best {
                Some((_, best_score)) if score <= best_score => best,
                _ => Some((i, score)),
            })
    }

    /// FAQ answer for the closest question, or the unknown answer when the
    /// similarity is below `min_similarity`. The low score is kept as the
    /// confidence so callers can tell "measured but low" from "unmeasurable".
    pub fn answer(&self, faq: &FaqStore, text: &str, min_similarity: f32) -> MatchResult {
        let Some((idx, score)) = self.nearest(text) else {
            return MatchResult::unknown();
        };
        if score < min_similarity {
            return MatchResult::new(DEFAULT_UNKNOWN_RESPONSE, score);
        }
        match faq.get(idx) {
            Some(entry) => MatchResult::new(compose_response(&[entry.answer.as_str()]), score),
            None => MatchResult::unknown(),
        }
    }
}
