use chrono::NaiveDate;
use std::io::Write;

use epicanimes_chatbot::classifier::select_classifier;
use epicanimes_chatbot::settings::ClassifierSettings;
use epicanimes_chatbot::{
    ChatbotEngine, FaqStore, NullClassifier, ProductRecord, Role, Settings, TextClassifier,
};

const FAQ: &str = include_str!("../data/chatbot_faq.txt");
const SHIPPING_ANSWER: &str = "Sí, despachamos a todo Chile con número de seguimiento.";

fn product(id: u64, name: &str, category: &str, stock: i64, created: (i32, u32, u32)) -> ProductRecord {
    ProductRecord {
        id,
        name: name.to_string(),
        description: String::new(),
        category: category.to_string(),
        price: 34990.0,
        stock_count: Some(stock),
        created_date: NaiveDate::from_ymd_opt(created.0, created.1, created.2),
    }
}

fn faq_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FAQ.as_bytes()).unwrap();
    file
}

fn engine(
    faq: &tempfile::NamedTempFile,
    products: Vec<ProductRecord>,
    classifier: Box<dyn TextClassifier>,
) -> ChatbotEngine {
    let mut settings = Settings::default();
    settings.faq.path = faq.path().to_path_buf();
    let engine = ChatbotEngine::new(&settings, Box::new(products), classifier);
    engine.warm_up().unwrap();
    engine
}

fn semantic_only(faq: &tempfile::NamedTempFile) -> ChatbotEngine {
    engine(faq, Vec::new(), Box::new(NullClassifier::new("disabled in tests")))
}

#[test]
fn faq_file_loads_in_order() {
    let store = FaqStore::parse(FAQ);
    assert_eq!(store.len(), 13);
    assert_eq!(store.entries()[0].question, "¿Qué es EpicAnimes?");
    assert_eq!(store.entries()[12].question, "¿Cómo puedo vender en EpicAnimes?");
}

#[test]
fn empty_query_asks_for_a_question() {
    let faq = faq_file();
    let result = semantic_only(&faq).answer("", None);
    assert_eq!(result.confidence, 0.0);
    assert!(result.answer.contains("formular tu pregunta"));
}

#[test]
fn thanks_short_circuits() {
    let faq = faq_file();
    let result = semantic_only(&faq).answer("gracias", None);
    assert_eq!(result.confidence, 0.0);
    assert!(result.answer.starts_with("¡Gracias a ti!"));
}

#[test]
fn greeting_is_stable_per_query() {
    let faq = faq_file();
    let engine = semantic_only(&faq);
    let first = engine.answer("hola, buenas tardes", Some(Role::Seller));
    let second = engine.answer("hola, buenas tardes", Some(Role::Seller));
    assert_eq!(first, second);
    assert!(first.answer.contains("vendedor certificado"));
}

#[test]
fn recommendation_prefers_stock() {
    let faq = faq_file();
    let products = vec![
        product(1, "A", "Figuras", 0, (2024, 1, 1)),
        product(2, "B", "Figuras", 5, (2024, 6, 1)),
    ];
    let engine = engine(&faq, products, Box::new(NullClassifier::new("disabled in tests")));
    let result = engine.answer("recomiendame algo", None);
    assert_eq!(result.confidence, 0.85);
    assert!(result.answer.contains("\"B\""));
}

#[test]
fn keyword_search_picks_best_overlap() {
    let faq = faq_file();
    let products = vec![
        product(1, "Figura Naruto", "Figuras", 3, (2024, 1, 1)),
        product(2, "Taza Naruto", "Accesorios", 10, (2024, 1, 1)),
    ];
    let engine = engine(&faq, products, Box::new(NullClassifier::new("disabled in tests")));
    let result = engine.answer("cuanto cuesta la figura de naruto", None);
    assert_eq!(result.confidence, 0.9);
    assert!(result.answer.contains("\"Figura Naruto\""));
    assert!(result.answer.contains("$34.990 CLP"));
}

#[test]
fn out_of_domain_query_is_gated() {
    let faq = faq_file();
    let result = semantic_only(&faq).answer("quiero un unicornio volador", None);
    assert_eq!(result.confidence, 0.0);
    assert!(result.answer.starts_with("No tengo esa información exacta"));
}

#[test]
fn paraphrase_reaches_faq_answer() {
    let faq = faq_file();
    let result = semantic_only(&faq).answer("¿hacen envíos a regiones del sur?", Some(Role::Buyer));
    assert_eq!(result.answer, SHIPPING_ANSWER);
    assert!(result.confidence >= 0.25);
}

#[test]
fn payment_rule_for_every_role() {
    let faq = faq_file();
    let engine = semantic_only(&faq);
    for role in [Role::Anonymous, Role::Buyer, Role::Seller, Role::Administrator] {
        let result = engine.answer("¿puedo pagar con transferencia?", Some(role));
        assert!(result.answer.contains("MercadoPago"), "role {}", role);
        assert_eq!(result.confidence, 0.4);
    }
}

#[test]
fn disabled_classifier_never_surfaces() {
    let faq = faq_file();
    let settings = ClassifierSettings {
        enabled: false,
        ..Default::default()
    };
    let engine = engine(&faq, Vec::new(), select_classifier(&settings));
    for query in ["¿hacen envíos a regiones?", "horario", "zzz qqq", "ok", "¿¿??", "contraseña olvidada"] {
        let result = engine.answer(query, None);
        assert!(!result.answer.is_empty());
        assert!((0.0..=1.0).contains(&result.confidence));
    }
}

#[test]
fn trained_classifier_agrees_on_exact_questions() {
    let faq = faq_file();
    let settings = ClassifierSettings {
        epochs: 80,
        learning_rate: 0.1,
        embedding_dim: 16,
        hidden_dim: 16,
        ..Default::default()
    };
    let engine = engine(&faq, Vec::new(), select_classifier(&settings));
    let result = engine.answer("¿Hacen envíos a regiones?", None);
    assert_eq!(result.answer, SHIPPING_ANSWER);
}
