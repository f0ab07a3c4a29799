//! Small feed-forward text classifier trained on the FAQ questions:
//! token ids -> embedding -> mean pooling -> dense ReLU -> softmax over answers.

use ndarray::{Array1, Array2, Axis};
use once_cell::sync::OnceCell;
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use crate::classifier::{Classification, TextClassifier};
use crate::error::{ChatbotError, Result};
use crate::faq::FaqStore;
use crate::settings::ClassifierSettings;
use crate::text::tokenize;

const PAD_ID: usize = 0;
const UNKNOWN_ID: usize = 1;

/// Maps normalised tokens to integer ids. 0 is padding, 1 is out-of-vocabulary.
#[derive(Debug, Clone)]
struct SequenceVectorizer {
    vocab: HashMap<String, usize>,
    sequence_length: usize,
}

impl SequenceVectorizer {
    fn adapt<'a, I: IntoIterator<Item = &'a str>>(texts: I, sequence_length: usize) -> Self {
        let mut vocab = HashMap::new();
        for token in texts.into_iter().flat_map(tokenize) {
            if !vocab.contains_key(&token) {
                let id = vocab.len() + 2;
                vocab.insert(token, id);
            }
        }
        Self { vocab, sequence_length }
    }

    fn vocab_size(&self) -> usize {
        self.vocab.len() + 2
    }

    /// Ids of the first `sequence_length` tokens. Padding is implicit.
    fn encode(&self, text: &str) -> Vec<usize> {
        tokenize(text)
            .iter()
            .take(self.sequence_length)
            .map(|token| *self.vocab.get(token).unwrap_or(&UNKNOWN_ID))
            .collect()
    }
}

fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let exp = logits.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}

fn outer(a: &Array1<f32>, b: &Array1<f32>) -> Array2<f32> {
    a.view().insert_axis(Axis(1)).dot(&b.view().insert_axis(Axis(0)))
}

fn glorot(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f32> {
    let limit = (6.0 / (rows + cols) as f32).sqrt();
    let range = Uniform::new(-limit, limit);
    Array2::from_shape_fn((rows, cols), |_| rng.sample(&range))
}

struct Activations {
    pooled: Array1<f32>,
    hidden_pre: Array1<f32>,
    hidden: Array1<f32>,
    probabilities: Array1<f32>,
}

#[derive(Debug, Clone)]
struct Network {
    embedding: Array2<f32>,
    w_hidden: Array2<f32>,
    b_hidden: Array1<f32>,
    w_out: Array2<f32>,
    b_out: Array1<f32>,
}

impl Network {
    fn new(vocab_size: usize, classes: usize, settings: &ClassifierSettings, rng: &mut StdRng) -> Self {
        let range = Uniform::new(-0.05f32, 0.05);
        let mut embedding =
            Array2::from_shape_fn((vocab_size, settings.embedding_dim), |_| rng.sample(&range));
        embedding.row_mut(PAD_ID).fill(0.0);
        Self {
            embedding,
            w_hidden: glorot(rng, settings.embedding_dim, settings.hidden_dim),
            b_hidden: Array1::zeros(settings.hidden_dim),
            w_out: glorot(rng, settings.hidden_dim, classes),
            b_out: Array1::zeros(classes),
        }
    }

    fn forward(&self, ids: &[usize]) -> Activations {
        let mut pooled = Array1::<f32>::zeros(self.embedding.ncols());
        for &id in ids {
            pooled += &self.embedding.row(id);
        }
        if !ids.is_empty() {
            pooled /= ids.len() as f32;
        }
        let hidden_pre = pooled.dot(&self.w_hidden) + &self.b_hidden;
        let hidden = hidden_pre.mapv(|x| x.max(0.0));
        let logits = hidden.dot(&self.w_out) + &self.b_out;
        Activations {
            pooled,
            hidden_pre,
            hidden,
            probabilities: softmax(&logits),
        }
    }

    /// One SGD step on a single example. Returns its cross-entropy loss.
    fn train_step(&mut self, ids: &[usize], target: usize, learning_rate: f32) -> f32 {
        let act = self.forward(ids);
        let loss = -(act.probabilities[target] + 1e-9).ln();

        let mut grad_logits = act.probabilities.clone();
        grad_logits[target] -= 1.0;
        let grad_hidden = self.w_out.dot(&grad_logits)
            * act.hidden_pre.mapv(|x| if x > 0.0 { 1.0f32 } else { 0.0 });
        let grad_pooled = self.w_hidden.dot(&grad_hidden);

        self.w_out.scaled_add(-learning_rate, &outer(&act.hidden, &grad_logits));
        self.b_out.scaled_add(-learning_rate, &grad_logits);
        self.w_hidden.scaled_add(-learning_rate, &outer(&act.pooled, &grad_hidden));
        self.b_hidden.scaled_add(-learning_rate, &grad_hidden);
        if !ids.is_empty() {
            let step = -learning_rate / ids.len() as f32;
            for &id in ids {
                self.embedding.row_mut(id).scaled_add(step, &grad_pooled);
            }
        }
        loss
    }
}

#[derive(Debug, Clone)]
struct TrainedModel {
    vectorizer: SequenceVectorizer,
    network: Network,
    /// Mean loss per epoch.
    losses: Vec<f32>,
}

impl TrainedModel {
    fn train(faq: &FaqStore, settings: &ClassifierSettings) -> Result<Self> {
        if faq.is_empty() {
            return Err(ChatbotError::Classifier("no FAQ entries to train on".to_string()));
        }
        if settings.embedding_dim == 0 || settings.hidden_dim == 0 || settings.sequence_length == 0 {
            return Err(ChatbotError::Classifier(
                "embedding_dim, hidden_dim and sequence_length must be positive".to_string(),
            ));
        }
        log::info!(
            "Training chatbot classifier on {} examples for {} epochs",
            faq.len(),
            settings.epochs
        );

        let mut rng = StdRng::seed_from_u64(settings.seed);
        let vectorizer = SequenceVectorizer::adapt(faq.questions(), settings.sequence_length);
        let mut network = Network::new(vectorizer.vocab_size(), faq.len(), settings, &mut rng);

        let examples: Vec<(Vec<usize>, usize)> = faq
            .questions()
            .enumerate()
            .map(|(label, question)| (vectorizer.encode(question), label))
            .collect();
        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut losses = Vec::with_capacity(settings.epochs);

        for epoch in 0..settings.epochs {
            order.shuffle(&mut rng);
            let mut total_loss = 0.0;
            for &i in &order {
                let (ids, label) = &examples[i];
                total_loss += network.train_step(ids, *label, settings.learning_rate);
            }
            let mean = total_loss / examples.len() as f32;
            if !mean.is_finite() {
                return Err(ChatbotError::Classifier(format!(
                    "training diverged at epoch {}",
                    epoch + 1
                )));
            }
            log::debug!("Epoch {}/{}, Average Loss: {}", epoch + 1, settings.epochs, mean);
            losses.push(mean);
        }
        log::info!(
            "Chatbot classifier trained, final loss {:.4}",
            losses.last().copied().unwrap_or_default()
        );

        Ok(Self { vectorizer, network, losses })
    }

    fn predict(&self, query: &str) -> Classification {
        let probabilities = self.network.forward(&self.vectorizer.encode(query)).probabilities;
        let (label, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });
        Classification { label, confidence }
    }
}

/// Trained lazily on first use; concurrent first callers wait for the single
/// training run and share its result for the rest of the process. A failed
/// run is kept too, so later calls fail fast instead of training again.
pub struct FeedForwardClassifier {
    settings: ClassifierSettings,
    model: OnceCell<std::result::Result<TrainedModel, String>>,
}

impl FeedForwardClassifier {
    pub fn new(settings: ClassifierSettings) -> Self {
        Self {
            settings,
            model: OnceCell::new(),
        }
    }

    fn model(&self, faq: &FaqStore) -> Result<&TrainedModel> {
        let trained = self.model.get_or_init(|| {
            TrainedModel::train(faq, &self.settings).map_err(|e| {
                log::error!("Chatbot classifier training failed, disabling it: {}", e);
                match e {
                    ChatbotError::Classifier(reason) => reason,
                    other => other.to_string(),
                }
            })
        });
        trained.as_ref().map_err(|reason| ChatbotError::Classifier(reason.clone()))
    }

    /// Per-epoch mean training loss, empty until a training run succeeds.
    pub fn training_losses(&self) -> &[f32] {
        match self.model.get() {
            Some(Ok(model)) => &model.losses,
            _ => &[],
        }
    }
}

impl TextClassifier for FeedForwardClassifier {
    fn classify(&self, faq: &FaqStore, query: &str) -> Result<Classification> {
        Ok(self.model(faq)?.predict(query))
    }

    fn name(&self) -> &'static str {
        "feed-forward"
    }
}
