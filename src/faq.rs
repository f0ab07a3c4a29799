use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

use crate::error::{ChatbotError, Result};

const QUESTION_PREFIX: &str = "Pregunta:";
const ANSWER_PREFIX: &str = "Respuesta:";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Curated question/answer pairs, in file order. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct FaqStore {
    entries: Vec<FaqEntry>,
}

impl FaqStore {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|e| ChatbotError::Configuration {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let store = Self::parse(&content);
        if store.is_empty() {
            return Err(ChatbotError::Configuration {
                path: path.to_path_buf(),
                reason: "no valid question/answer pairs".to_string(),
            });
        }
        log::info!("Loaded {} FAQ entries from {:?}", store.len(), path);
        Ok(store)
    }

    /// Blocks are separated by blank lines; a block without both a
    /// question and an answer line is skipped.
    pub fn parse(content: &str) -> Self {
        let content = content.replace("\r\n", "\n");
        let entries = content
            .trim()
            .split("\n\n")
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .filter_map(|block| {
                let field = |prefix: &str| {
                    block
                        .lines()
                        .find_map(|line| line.strip_prefix(prefix))
                        .map(|value| value.trim().to_string())
                        .filter(|value| !value.is_empty())
                };
                Some(FaqEntry {
                    question: field(QUESTION_PREFIX)?,
                    answer: field(ANSWER_PREFIX)?,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn from_entries(entries: Vec<FaqEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn get(&self, idx: usize) -> Option<&FaqEntry> {
        self.entries.get(idx)
    }

    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.question.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
