//! FAQ chatbot for the EpicAnimes storefront.
//!
//! A query goes through canned replies, the live product catalog and keyword
//! rules before reaching the FAQ stages: an optional neural classifier and a
//! TF-IDF index, arbitrated by confidence. [`ChatbotEngine::answer`] always
//! returns a [`MatchResult`].

pub mod canned;
pub mod catalog;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod faq;
pub mod lexicon;
#[cfg(feature = "neural")]
pub mod neural;
pub mod role;
pub mod rules;
pub mod semantic;
pub mod settings;
pub mod text;

pub use catalog::{Catalog, JsonCatalog, ProductRecord};
pub use classifier::{Classification, NullClassifier, TextClassifier};
pub use engine::{ChatbotEngine, MatchResult};
pub use error::{ChatbotError, Result};
pub use faq::{FaqEntry, FaqStore};
pub use role::Role;
pub use settings::Settings;
