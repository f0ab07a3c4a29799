//! Live product lookups: explicit recommendations and keyword search.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::PathBuf;

use crate::engine::MatchResult;
use crate::lexicon::Lexicon;
use crate::text::{compose_response, tokenize};

pub const RECOMMENDATION_CONFIDENCE: f32 = 0.85;
pub const SEARCH_CONFIDENCE: f32 = 0.9;

const PRICE_BONUS: f32 = 0.4;
const STOCK_BONUS: f32 = 0.2;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub stock_count: Option<i64>,
    #[serde(default)]
    pub created_date: Option<NaiveDate>,
}

impl ProductRecord {
    fn stock(&self) -> i64 {
        self.stock_count.unwrap_or(0)
    }

    fn recommendation_key(&self) -> (bool, i64, i32, u64) {
        let date = self.created_date.map(|d| d.num_days_from_ce()).unwrap_or(0);
        (self.stock() > 0, self.stock(), date, self.id)
    }
}

/// Read-only access to the storefront catalog. Called once per query that
/// reaches the catalog stage; results are never cached between calls.
pub trait Catalog: Send + Sync {
    fn list_products(&self) -> Result<Vec<ProductRecord>>;
}

impl Catalog for Vec<ProductRecord> {
    fn list_products(&self) -> Result<Vec<ProductRecord>> {
        Ok(self.clone())
    }
}

/// Catalog backed by a JSON array of products, re-read on every lookup.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl Catalog for JsonCatalog {
    fn list_products(&self) -> Result<Vec<ProductRecord>> {
        let content = read_to_string(&self.path)
            .with_context(|| format!("Failed to read product catalog at {:?}", self.path))?;
        let products: Vec<ProductRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Malformed product catalog at {:?}", self.path))?;
        Ok(products)
    }
}

/// Whole pesos with dots between thousands, e.g. `$34.990 CLP`.
pub fn format_price(value: f64) -> String {
    let amount = value.round() as i64;
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{}${} CLP", sign, grouped)
}

fn content_tokens<'a, I>(tokens: I, lexicon: &Lexicon) -> HashSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    tokens
        .into_iter()
        .filter(|t| t.chars().count() > 2 && !lexicon.is_stopword(t))
        .cloned()
        .collect()
}

/// Best product to suggest when the user only asks for "something":
/// in stock first, then most units, newest, highest id.
pub fn recommend(products: &[ProductRecord]) -> Option<MatchResult> {
    let in_stock: Vec<&ProductRecord> = products.iter().filter(|p| p.stock() > 0).collect();
    let candidates: Vec<&ProductRecord> = if in_stock.is_empty() {
        products.iter().collect()
    } else {
        in_stock
    };
    let top = candidates.into_iter().max_by_key(|p| p.recommendation_key())?;

    let answer = compose_response(&[
        format!(
            "Te recomiendo \"{}\" ({}) por {}.",
            top.name,
            top.category,
            format_price(top.price)
        ),
        format!("Hay {} unidades listas para despacho.", top.stock().max(0)),
        format!("Revísalo aquí: /producto/{}/.", top.id),
    ]);
    Some(MatchResult::new(answer, RECOMMENDATION_CONFIDENCE))
}

/// Answers product questions from the current catalog snapshot.
pub fn product_answer(
    tokens: &[String],
    products: &[ProductRecord],
    lexicon: &Lexicon,
) -> Option<MatchResult> {
    if tokens.is_empty() || products.is_empty() {
        return None;
    }

    let token_set: HashSet<&String> = tokens.iter().collect();
    let wants_recommendation = token_set.iter().any(|t| lexicon.is_recommend_term(t));
    let content = content_tokens(token_set.iter().copied(), lexicon);
    let meaningful = content.iter().any(|t| !lexicon.is_recommend_term(t));

    if wants_recommendation && !meaningful {
        return recommend(products);
    }
    if content.is_empty() {
        return None;
    }

    let asks_price = token_set.iter().any(|t| lexicon.price_terms.contains(t.as_str()));
    let asks_stock = token_set.iter().any(|t| lexicon.stock_terms.contains(t.as_str()));

    let mut best: Option<(f32, &ProductRecord)> = None;
    for product in products {
        let text = [&product.name, &product.description, &product.category]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let product_tokens = tokenize(&text);
        let product_tokens = content_tokens(product_tokens.iter(), lexicon);
        let overlap = content.intersection(&product_tokens).count();
        if overlap == 0 {
            continue;
        }

        let mut score = overlap as f32;
        if asks_price {
            score += PRICE_BONUS;
        }
        if asks_stock {
            score += STOCK_BONUS;
        }

        let better = match best {
            None => true,
            Some((best_score, best_product)) => match score.partial_cmp(&best_score) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => product.stock() > best_product.stock(),
                _ => false,
            },
        };
        if better {
            best = Some((score, product));
        }
    }

    let Some((score, top)) = best else {
        if wants_recommendation {
            return recommend(products);
        }
        return None;
    };
    log::debug!("Catalog match {:?} with score {}", top.name, score);

    let stock_line = match top.stock_count {
        Some(n) => format!("Hay {} unidades disponibles.", n),
        None => "Consulta su stock en la ficha del producto.".to_string(),
    };
    let answer = compose_response(&[
        format!(
            "Tenemos \"{}\" ({}) por {}.",
            top.name,
            top.category,
            format_price(top.price)
        ),
        stock_line,
        format!("Revísalo aquí: /producto/{}/.", top.id),
    ]);
    Some(MatchResult::new(answer, SEARCH_CONFIDENCE))
}
