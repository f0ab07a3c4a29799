//! Answer selection: canned replies, catalog, rules, then the learned and
//! semantic stages with confidence arbitration.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::canned::canned_response;
use crate::catalog::{product_answer, Catalog, JsonCatalog};
use crate::classifier::{select_classifier, TextClassifier};
use crate::error::{ChatbotError, Result};
use crate::faq::FaqStore;
use crate::lexicon::Lexicon;
use crate::role::Role;
use crate::rules::RuleSet;
use crate::semantic::SemanticIndex;
use crate::settings::{Settings, Thresholds};
use crate::text::{compose_response, tokenize, DEFAULT_UNKNOWN_RESPONSE};

const EMPTY_QUERY_RESPONSE: &str = "¿Podrías formular tu pregunta? Estoy aquí para ayudarte.";
const FAQ_UNAVAILABLE_RESPONSE: &str =
    "Por ahora no puedo acceder a las preguntas frecuentes. Escríbenos y te ayudaremos manualmente.";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub answer: String,
    /// Always within `[0, 1]`. Canned replies carry 0.
    pub confidence: f32,
}

impl MatchResult {
    pub fn new<S: Into<String>>(answer: S, confidence: f32) -> Self {
        let confidence = if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            answer: answer.into(),
            confidence,
        }
    }

    pub fn unknown() -> Self {
        Self::new(DEFAULT_UNKNOWN_RESPONSE, 0.0)
    }

    pub fn is_unknown(&self) -> bool {
        self.answer == DEFAULT_UNKNOWN_RESPONSE
    }
}

/// FAQ entries and the index built over them, published together.
struct Knowledge {
    faq: FaqStore,
    index: SemanticIndex,
}

impl Knowledge {
    fn new(faq: FaqStore) -> Self {
        let index = SemanticIndex::build(&faq);
        Self { faq, index }
    }
}

pub struct ChatbotEngine {
    faq_path: PathBuf,
    lexicon: Lexicon,
    thresholds: Thresholds,
    catalog: Box<dyn Catalog>,
    classifier: Box<dyn TextClassifier>,
    dialog_rules: RuleSet,
    faq_rules: RuleSet,
    knowledge: OnceCell<Knowledge>,
    fallback_reported: AtomicBool,
}

impl ChatbotEngine {
    pub fn new(
        settings: &Settings,
        catalog: Box<dyn Catalog>,
        classifier: Box<dyn TextClassifier>,
    ) -> Self {
        Self {
            faq_path: settings.faq.path.clone(),
            lexicon: settings.lexicon.normalized(),
            thresholds: settings.thresholds,
            catalog,
            classifier,
            dialog_rules: RuleSet::role_dialog_rules(),
            faq_rules: RuleSet::faq_rules(),
            knowledge: OnceCell::new(),
            fallback_reported: AtomicBool::new(false),
        }
    }

    /// Engine over the configured JSON catalog with the classifier the
    /// build and configuration allow.
    pub fn from_settings(settings: &Settings) -> Self {
        let catalog = JsonCatalog::new(settings.catalog.products_file.clone());
        let classifier = select_classifier(&settings.classifier);
        log::info!("Chatbot engine using the {} classifier", classifier.name());
        Self::new(settings, Box::new(catalog), classifier)
    }

    /// Uses an already loaded FAQ instead of reading the configured file.
    pub fn with_faq_store(mut self, faq: FaqStore) -> Self {
        self.knowledge = OnceCell::with_value(Knowledge::new(faq));
        self
    }

    /// Loads the FAQ and builds the index now. A `Configuration` error here
    /// means the chatbot feature must stay disabled.
    pub fn warm_up(&self) -> Result<()> {
        self.knowledge().map(|_| ())
    }

    fn knowledge(&self) -> Result<&Knowledge> {
        self.knowledge
            .get_or_try_init(|| FaqStore::load(&self.faq_path).map(Knowledge::new))
    }

    /// Never fails: every input ends in a `MatchResult`.
    pub fn answer(&self, query: &str, role: Option<Role>) -> MatchResult {
        let question = query.trim();
        if question.is_empty() {
            return MatchResult::new(EMPTY_QUERY_RESPONSE, 0.0);
        }
        let role = role.unwrap_or_default();
        let tokens = tokenize(question);

        if let Some(reply) = canned_response(question, role, &self.lexicon) {
            return MatchResult::new(reply, 0.0);
        }
        if let Some(result) = self.catalog_answer(&tokens) {
            return result;
        }
        if let Some(result) = self.rule_answer(question, &tokens, role) {
            return result;
        }

        let knowledge = match self.knowledge() {
            Ok(knowledge) => knowledge,
            Err(e) => {
                log::error!("Chatbot cannot reach the FAQ: {}", e);
                return MatchResult::new(FAQ_UNAVAILABLE_RESPONSE, 0.0);
            }
        };
        if !self.relates_to_faq(&tokens, &knowledge.index) {
            return MatchResult::unknown();
        }
        self.arbitrate(knowledge, question)
    }

    fn catalog_answer(&self, tokens: &[String]) -> Option<MatchResult> {
        if tokens.is_empty() {
            return None;
        }
        let products = match self.catalog.list_products() {
            Ok(products) => products,
            Err(e) => {
                log::warn!("Catalog lookup failed, skipping product search: {:#}", e);
                return None;
            }
        };
        product_answer(tokens, &products, &self.lexicon)
    }

    fn rule_answer(&self, question: &str, tokens: &[String], role: Role) -> Option<MatchResult> {
        [&self.dialog_rules, &self.faq_rules].iter().find_map(|rules| {
            rules
                .find(question, tokens, role)
                .map(|reply| MatchResult::new(reply, rules.confidence()))
        })
    }

    /// Relevance gate: at least one non-filler token must be FAQ vocabulary.
    fn relates_to_faq(&self, tokens: &[String], index: &SemanticIndex) -> bool {
        tokens
            .iter()
            .filter(|t| !self.lexicon.is_stopword(t))
            .any(|t| index.contains(t))
    }

    fn arbitrate(&self, knowledge: &Knowledge, question: &str) -> MatchResult {
        let semantic = || knowledge.index.answer(&knowledge.faq, question, self.thresholds.semantic_min);

        let prediction = match self.classifier.classify(&knowledge.faq, question) {
            Ok(prediction) => prediction,
            Err(ChatbotError::ClassifierUnavailable { hint }) => {
                if self.fallback_reported.swap(true, Ordering::Relaxed) {
                    log::debug!("Classifier unavailable ({}), using semantic index", hint);
                } else {
                    log::warn!("Classifier unavailable ({}), using semantic index", hint);
                }
                return semantic();
            }
            Err(e) => {
                log::warn!("Classifier failed, using semantic index: {}", e);
                return semantic();
            }
        };
        if prediction.confidence < self.thresholds.classifier_min {
            return semantic();
        }

        let semantic = semantic();
        if semantic.confidence >= prediction.confidence
            || (semantic.is_unknown() && prediction.confidence < self.thresholds.classifier_trust)
        {
            return semantic;
        }
        match knowledge.faq.get(prediction.label) {
            Some(entry) => MatchResult::new(compose_response(&[entry.answer.as_str()]), prediction.confidence),
            None => {
                log::warn!("Classifier predicted unknown FAQ entry {}", prediction.label);
                semantic
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductRecord;
    use crate::classifier::{Classification, NullClassifier};
    use crate::faq::FaqEntry;
    use std::collections::HashSet;
    use std::io::Write;
    use std::sync::Mutex;

    struct FixedClassifier(Classification);

    impl TextClassifier for FixedClassifier {
        fn classify(&self, _faq: &FaqStore, _query: &str) -> Result<Classification> {
            Ok(self.0)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct BrokenClassifier;

    impl TextClassifier for BrokenClassifier {
        fn classify(&self, _faq: &FaqStore, _query: &str) -> Result<Classification> {
            Err(ChatbotError::Classifier("weights are NaN".to_string()))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    /// Records which FAQ store each call saw.
    #[derive(Default)]
    struct RecordingClassifier {
        stores: Mutex<HashSet<usize>>,
    }

    impl TextClassifier for &'static RecordingClassifier {
        fn classify(&self, faq: &FaqStore, _query: &str) -> Result<Classification> {
            if let Ok(mut stores) = self.stores.lock() {
                stores.insert(faq as *const FaqStore as usize);
            }
            Err(ChatbotError::ClassifierUnavailable { hint: "recording only".to_string() })
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn faq() -> FaqStore {
        let pairs = [
            ("¿Hacen envíos a regiones?", "Sí, enviamos a todo Chile con seguimiento."),
            ("¿Cuánto tarda el despacho?", "Entre 24 y 48 horas hábiles en Santiago."),
            ("¿Cómo cambio mi contraseña?", "Desde Mi cuenta, en la opción Seguridad."),
        ];
        FaqStore::from_entries(
            pairs
                .iter()
                .map(|(q, a)| FaqEntry { question: q.to_string(), answer: a.to_string() })
                .collect(),
        )
    }

    fn engine_with(classifier: Box<dyn TextClassifier>, products: Vec<ProductRecord>) -> ChatbotEngine {
        ChatbotEngine::new(&Settings::default(), Box::new(products), classifier).with_faq_store(faq())
    }

    fn engine(classifier: Box<dyn TextClassifier>) -> ChatbotEngine {
        engine_with(classifier, Vec::new())
    }

    fn unavailable() -> Box<dyn TextClassifier> {
        Box::new(NullClassifier::new("sin backend"))
    }

    fn fixed(label: usize, confidence: f32) -> Box<dyn TextClassifier> {
        Box::new(FixedClassifier(Classification { label, confidence }))
    }

    #[test]
    fn test_empty_query() {
        let result = engine(unavailable()).answer("   ", None);
        assert_eq!(result.answer, EMPTY_QUERY_RESPONSE);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_canned_reply_wins() {
        let result = engine(fixed(0, 0.99)).answer("gracias", None);
        assert!(result.answer.starts_with("¡Gracias a ti!"));
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_catalog_before_rules() {
        let products = vec![ProductRecord {
            id: 9,
            name: "Figura Goku".to_string(),
            description: String::new(),
            category: "Figuras".to_string(),
            price: 29990.0,
            stock_count: Some(2),
            created_date: None,
        }];
        let result = engine_with(unavailable(), products).answer("recomiendame algo", None);
        assert_eq!(result.confidence, 0.85);
        assert!(result.answer.contains("Figura Goku"));

        let result = engine(unavailable()).answer("recomiendame algo", None);
        assert!(result.answer.starts_with("Depende de tus gustos"));
        assert_eq!(result.confidence, 0.4);
    }

    #[test]
    fn test_role_dialog_rules() {
        let result = engine(unavailable()).answer("¿Dónde veo las métricas globales?", Some(Role::Administrator));
        assert!(result.answer.contains("Dashboard Administrador"));
        assert_eq!(result.confidence, 0.35);

        let result = engine(unavailable()).answer("¿Dónde veo las métricas globales?", Some(Role::Buyer));
        assert_eq!(result, MatchResult::unknown());
    }

    #[test]
    fn test_relevance_gate() {
        let result = engine(fixed(0, 0.99)).answer("quiero un unicornio volador", None);
        assert_eq!(result, MatchResult::unknown());
    }

    #[test]
    fn test_semantic_when_classifier_unavailable() {
        let result = engine(unavailable()).answer("¿hacen envíos a regiones?", None);
        assert_eq!(result.answer, "Sí, enviamos a todo Chile con seguimiento.");
        assert!(result.confidence > 0.99);
    }

    #[test]
    fn test_semantic_when_classifier_errors() {
        let result = engine(Box::new(BrokenClassifier)).answer("¿cómo cambio mi contraseña?", None);
        assert_eq!(result.answer, "Desde Mi cuenta, en la opción Seguridad.");
    }

    #[test]
    fn test_low_classifier_confidence_is_ignored() {
        let result = engine(fixed(2, 0.5)).answer("envíos a regiones", None);
        assert_eq!(result.answer, "Sí, enviamos a todo Chile con seguimiento.");
    }

    #[test]
    fn test_semantic_beats_weaker_classifier() {
        // exact question: cosine 1.0 outranks the classifier
        let result = engine(fixed(2, 0.9)).answer("¿Hacen envíos a regiones?", None);
        assert_eq!(result.answer, "Sí, enviamos a todo Chile con seguimiento.");
    }

    #[test]
    fn test_confident_classifier_wins() {
        // "tarda" alone is a weak semantic match
        let result = engine(fixed(2, 0.95)).answer("tarda mucho la clave", None);
        assert_eq!(result.answer, "Desde Mi cuenta, en la opción Seguridad.");
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn test_unknown_semantic_needs_trusted_classifier() {
        let mut settings = Settings::default();
        settings.thresholds.semantic_min = 0.99;
        let engine = ChatbotEngine::new(&settings, Box::new(Vec::<ProductRecord>::new()), fixed(1, 0.7))
            .with_faq_store(faq());
        let result = engine.answer("envíos de la contraseña", None);
        assert!(result.is_unknown());
    }

    #[test]
    fn test_missing_faq_degrades() {
        let mut settings = Settings::default();
        settings.faq.path = PathBuf::from("/nonexistent/chatbot_faq.txt");
        let engine = ChatbotEngine::new(&settings, Box::new(Vec::<ProductRecord>::new()), unavailable());
        assert!(matches!(engine.warm_up(), Err(ChatbotError::Configuration { .. })));

        let result = engine.answer("¿hacen envíos?", None);
        assert_eq!(result.answer, FAQ_UNAVAILABLE_RESPONSE);
        assert_eq!(result.confidence, 0.0);
        assert!(engine.answer("hola", None).answer.contains("Veo tu sesión como comprador"));
    }

    #[test]
    fn test_unavailable_classifier_reported_once() {
        let engine = engine(unavailable());
        assert!(!engine.fallback_reported.load(Ordering::Relaxed));
        engine.answer("¿hacen envíos a regiones?", None);
        assert!(engine.fallback_reported.load(Ordering::Relaxed));
        let result = engine.answer("¿hacen envíos a regiones?", None);
        assert_eq!(result.answer, "Sí, enviamos a todo Chile con seguimiento.");
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChatbotEngine>();
    }

    #[test]
    fn test_concurrent_first_use_builds_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for entry in faq().entries() {
            writeln!(file, "Pregunta: {}\nRespuesta: {}\n", entry.question, entry.answer).unwrap();
        }
        let mut settings = Settings::default();
        settings.faq.path = file.path().to_path_buf();

        let recorder: &'static RecordingClassifier = Box::leak(Box::default());
        let engine = ChatbotEngine::new(&settings, Box::new(Vec::<ProductRecord>::new()), Box::new(recorder));
        assert!(engine.knowledge.get().is_none());

        let results: Vec<MatchResult> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| engine.answer("¿hacen envíos a regiones?", None)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for result in &results {
            assert_eq!(result.answer, "Sí, enviamos a todo Chile con seguimiento.");
        }
        let stores = recorder.stores.lock().unwrap();
        assert_eq!(stores.len(), 1);
        let built = engine.knowledge.get().unwrap();
        assert!(stores.contains(&(&built.faq as *const FaqStore as usize)));
    }

    #[test]
    fn test_match_result_clamps() {
        assert_eq!(MatchResult::new("x", 1.7).confidence, 1.0);
        assert_eq!(MatchResult::new("x", -0.2).confidence, 0.0);
        assert_eq!(MatchResult::new("x", f32::NAN).confidence, 0.0);
    }
}
