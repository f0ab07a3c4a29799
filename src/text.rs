//! Text normalisation shared by every matching stage.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Answer returned whenever no stage can say anything useful.
pub const DEFAULT_UNKNOWN_RESPONSE: &str =
    "No tengo esa información exacta, pero puedo derivarte con soporte si lo deseas.";

/// Replies never grow beyond this many lines.
pub const MAX_RESPONSE_LINES: usize = 3;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[a-z0-9ñ]+").expect("token pattern is valid"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Decomposes to NFKD and drops combining marks, so "Métricas" becomes "Metricas".
pub fn strip_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Lowercase, accent-free text with runs of whitespace collapsed and the ends trimmed.
pub fn normalize(text: &str) -> String {
    let cleaned = strip_accents(text).to_lowercase();
    WHITESPACE.replace_all(&cleaned, " ").trim().to_string()
}

/// Splits text into normalised word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let lowered = strip_accents(&text.to_lowercase());
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// FNV-1a over the UTF-8 bytes. Stable across processes and platforms,
/// unlike the randomly seeded std hasher.
pub fn stable_hash(seed: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    seed.bytes().fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

/// Picks one of `options` deterministically from `seed`.
pub fn pick_variant<'a>(options: &[&'a str], seed: &str) -> &'a str {
    if options.is_empty() {
        return "";
    }
    let idx = (stable_hash(seed) % options.len() as u64) as usize;
    options[idx]
}

/// Joins at most three trimmed, non-empty lines taken from `segments` in order.
/// Segments spanning several lines contribute each line separately.
pub fn compose_response<S: AsRef<str>>(segments: &[S]) -> String {
    let lines: Vec<&str> = segments
        .iter()
        .flat_map(|segment| segment.as_ref().lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_RESPONSE_LINES)
        .collect();

    if lines.is_empty() {
        DEFAULT_UNKNOWN_RESPONSE.to_string()
    } else {
        lines.join("\n")
    }
}
