//! Keyword tables used by the matchers. Kept as data so they can be tuned
//! from the config file without touching the matching code.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::text::normalize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Matched as a prefix or as a space-delimited phrase of the cleaned query.
    pub greetings: HashSet<String>,
    /// Substring phrases that trigger a small-talk reply.
    pub small_talk: Vec<String>,
    pub thanks: HashSet<String>,
    /// Substring phrases.
    pub farewells: Vec<String>,
    pub offensive: HashSet<String>,
    pub help: HashSet<String>,
    /// Filler words ignored by the catalog search and the relevance gate.
    pub stopwords: HashSet<String>,
    pub recommend_terms: HashSet<String>,
    /// Any token starting with this stem also counts as a recommendation request.
    pub recommend_stem: String,
    pub price_terms: HashSet<String>,
    pub stock_terms: HashSet<String>,
}

fn set(words: &[&str]) -> HashSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn list(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            greetings: set(&[
                "hola", "hey", "buenas", "saludos", "que tal", "qué tal", "que onda", "qué onda",
                "como estas", "cómo estás",
            ]),
            small_talk: list(&["que tal", "como estas", "como va", "todo bien"]),
            thanks: set(&["gracias"]),
            farewells: list(&["chau", "chao", "adios", "nos vemos", "hasta luego"]),
            offensive: set(&["idiota", "tonto", "estupido", "imbecil", "mierda", "maldito"]),
            help: set(&[
                "ayuda", "ayudame", "ayudar", "orientacion", "orientarme", "orientame", "orienta",
                "orientar", "guiame", "guia", "guiar", "guiarme", "sugerencias", "sugerencia",
                "ideas", "idea",
            ]),
            stopwords: set(&[
                "de", "del", "la", "el", "los", "las", "un", "una", "unos", "unas", "al", "lo",
                "para", "por", "con", "que", "cual", "cuales", "quiero", "quisiera", "saber",
                "informacion", "info", "sobre", "algo", "mas", "me", "donde", "como", "cuanto",
                "cuanta", "precio", "precios", "vale", "cuesta", "tienen", "hay",
            ]),
            recommend_terms: set(&[
                "recomendacion", "recomendaciones", "recomendable", "recomienda", "recomiendas",
                "recomendar", "recomiendame", "recomiendanos", "recomiendate", "recomiendo",
                "recomendarias", "sugerencia", "sugerencias", "sugerir", "sugerirme",
            ]),
            recommend_stem: "recom".to_string(),
            price_terms: set(&["precio", "precios", "cuanto", "vale", "cuesta"]),
            stock_terms: set(&["stock", "disponible", "disponibles", "tienen", "hay"]),
        }
    }
}

impl Lexicon {
    /// Returns a copy with every entry run through the normaliser, so
    /// configured words like "qué tal" compare against normalised queries.
    pub fn normalized(&self) -> Self {
        let norm_set = |s: &HashSet<String>| -> HashSet<String> {
            s.iter().map(|w| normalize(w)).filter(|w| !w.is_empty()).collect()
        };
        let norm_list = |v: &[String]| -> Vec<String> {
            v.iter().map(|w| normalize(w)).filter(|w| !w.is_empty()).collect()
        };
        Self {
            greetings: norm_set(&self.greetings),
            small_talk: norm_list(&self.small_talk),
            thanks: norm_set(&self.thanks),
            farewells: norm_list(&self.farewells),
            offensive: norm_set(&self.offensive),
            help: norm_set(&self.help),
            stopwords: norm_set(&self.stopwords),
            recommend_terms: norm_set(&self.recommend_terms),
            recommend_stem: normalize(&self.recommend_stem),
            price_terms: norm_set(&self.price_terms),
            stock_terms: norm_set(&self.stock_terms),
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// True for explicit recommendation terms and any conjugation sharing the stem.
    pub fn is_recommend_term(&self, token: &str) -> bool {
        self.recommend_terms.contains(token)
            || (!self.recommend_stem.is_empty() && token.starts_with(&self.recommend_stem))
    }
}
