use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::lexicon::Lexicon;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub faq: FaqSettings,
    pub catalog: CatalogSettings,
    pub classifier: ClassifierSettings,
    pub thresholds: Thresholds,
    pub lexicon: Lexicon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqSettings {
    pub path: PathBuf,
}

impl Default for FaqSettings {
    fn default() -> Self {
        Self { path: PathBuf::from("data/chatbot_faq.txt") }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub products_file: PathBuf,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self { products_file: PathBuf::from("data/products.json") }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub enabled: bool,
    pub epochs: usize,
    pub learning_rate: f32,
    pub embedding_dim: usize,
    pub hidden_dim: usize,
    /// Questions longer than this many tokens are truncated.
    pub sequence_length: usize,
    pub seed: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            epochs: 160,
            learning_rate: 0.05,
            embedding_dim: 64,
            hidden_dim: 64,
            sequence_length: 48,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Below this cosine similarity the semantic index answers "unknown".
    pub semantic_min: f32,
    /// Classifier answers under this confidence are ignored.
    pub classifier_min: f32,
    /// Under this confidence the classifier never overrides an unknown semantic result.
    pub classifier_trust: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            semantic_min: 0.25,
            classifier_min: 0.55,
            classifier_trust: 0.75,
        }
    }
}

/// Lexicon tables that can be overridden from the environment as comma-separated lists.
const LIST_KEYS: &[&str] = &[
    "lexicon.greetings",
    "lexicon.small_talk",
    "lexicon.thanks",
    "lexicon.farewells",
    "lexicon.offensive",
    "lexicon.help",
    "lexicon.stopwords",
    "lexicon.recommend_terms",
    "lexicon.price_terms",
    "lexicon.stock_terms",
];

fn environment() -> config::Environment {
    LIST_KEYS.iter().fold(
        config::Environment::with_prefix("CHATBOT")
            .separator("__")
            .list_separator(",")
            .try_parsing(true),
        |env, key| env.with_list_parse_key(key),
    )
}

impl Settings {
    /// Reads `name` (any extension the config crate knows, e.g. `Config.toml`)
    /// and overlays `CHATBOT__SECTION__KEY` environment variables. A missing
    /// file is an error only when `required` is set.
    pub fn load(name: &str, required: bool) -> Result<Self> {
        Self::load_with(name, required, environment())
    }

    fn load_with(name: &str, required: bool, env: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(name).required(required))
            .add_source(env)
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
