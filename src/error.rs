use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatbotError {
    /// FAQ resource missing or without a single valid pair. Disables the feature.
    #[error("FAQ resource {path:?} is unusable: {reason}")]
    Configuration { path: PathBuf, reason: String },

    /// Neural backend absent or disabled. Callers fall back to the semantic index.
    #[error("neural classifier unavailable: {hint}")]
    ClassifierUnavailable { hint: String },

    #[error("neural classifier failed: {0}")]
    Classifier(String),

    #[error("invalid settings: {0}")]
    Settings(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ChatbotError>;
