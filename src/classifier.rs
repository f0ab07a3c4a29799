//! Optional learned classifier mapping a question to one FAQ answer.

use crate::error::{ChatbotError, Result};
use crate::faq::FaqStore;
use crate::settings::ClassifierSettings;

/// Predicted FAQ entry index and its softmax probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: usize,
    pub confidence: f32,
}

pub trait TextClassifier: Send + Sync {
    /// Classifies `query` into one of the entries of `faq`. Implementations
    /// may train on `faq` the first time they are called.
    fn classify(&self, faq: &FaqStore, query: &str) -> Result<Classification>;

    fn name(&self) -> &'static str;
}

/// Stand-in used when no neural backend is available. Every call fails with
/// `ClassifierUnavailable`, which sends the engine to the semantic index.
#[derive(Debug, Clone)]
pub struct NullClassifier {
    hint: String,
}

impl NullClassifier {
    pub fn new<S: Into<String>>(hint: S) -> Self {
        Self { hint: hint.into() }
    }
}

impl TextClassifier for NullClassifier {
    fn classify(&self, _faq: &FaqStore, _query: &str) -> Result<Classification> {
        Err(ChatbotError::ClassifierUnavailable {
            hint: self.hint.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// Picks the classifier once at startup from what was compiled in and configured.
pub fn select_classifier(settings: &ClassifierSettings) -> Box<dyn TextClassifier> {
    if !settings.enabled {
        log::info!("Neural classifier disabled by configuration; answering from the semantic index");
        return Box::new(NullClassifier::new(
            "set `classifier.enabled = true` in the configuration to train the FAQ classifier",
        ));
    }
    build_enabled(settings)
}

#[cfg(feature = "neural")]
fn build_enabled(settings: &ClassifierSettings) -> Box<dyn TextClassifier> {
    Box::new(crate::neural::FeedForwardClassifier::new(settings.clone()))
}

#[cfg(not(feature = "neural"))]
fn build_enabled(_settings: &ClassifierSettings) -> Box<dyn TextClassifier> {
    log::warn!("Neural classifier not compiled in; answering from the semantic index");
    Box::new(NullClassifier::new(
        "rebuild with `--features neural` to enable the FAQ classifier",
    ))
}
