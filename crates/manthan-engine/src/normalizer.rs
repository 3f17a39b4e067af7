//! Text normalisation: PII masking, language tagging, whitespace cleanup.
//!
//! A pure function over its input. PII spans are replaced with a fixed
//! placeholder per category; text outside the matches is untouched apart
//! from whitespace collapsing. Empty or whitespace-only input is not an
//! error; it yields an empty string tagged `unknown`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+91|\b91)?[-.\s]?[6-9]\d{9}\b").expect("phone pattern"));

/// National-ID-like 4-4-4 digit groups.
static NATIONAL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{4}[-.\s]?\d{4}[-.\s]?\d{4}\b").expect("national id pattern")
});

/// PAN-style tax codes: five letters, four digits, one letter.
static PAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{5}\d{4}[A-Z]\b").expect("pan pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    /// `en`, `hi`, `ur`, or `unknown`.
    pub language: String,
}

/// Normalise raw comment text: mask PII, tag the language, collapse
/// whitespace. Deterministic and side-effect free.
pub fn normalize(raw: &str) -> Normalized {
    if raw.trim().is_empty() {
        return Normalized {
            text: String::new(),
            language: "unknown".to_string(),
        };
    }

    let masked = mask_pii(raw);
    let language = detect_language(&masked);
    let text = WHITESPACE.replace_all(masked.trim(), " ").into_owned();

    Normalized { text, language }
}

/// Replace PII spans with a fixed placeholder per category.
pub fn mask_pii(text: &str) -> String {
    let masked = EMAIL.replace_all(text, "[EMAIL]");
    let masked = national_id_then_phone(&masked);
    PAN.replace_all(&masked, "[PAN]").into_owned()
}

/// 12-digit ID groups first so a phone match cannot split one in half.
fn national_id_then_phone(text: &str) -> String {
    let masked: Cow<'_, str> = NATIONAL_ID.replace_all(text, "[ID]");
    PHONE.replace_all(&masked, "[PHONE]").into_owned()
}

/// Script-ratio language heuristic over Latin, Devanagari, and Arabic.
fn detect_language(text: &str) -> String {
    let mut latin = 0usize;
    let mut devanagari = 0usize;
    let mut arabic = 0usize;
    let mut total = 0usize;

    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        match c {
            'a'..='z' | 'A'..='Z' => latin += 1,
            '\u{0900}'..='\u{097F}' => devanagari += 1,
            '\u{0600}'..='\u{06FF}' => arabic += 1,
            _ => {}
        }
    }

    if total == 0 {
        return "unknown".to_string();
    }

    let ratio = |n: usize| n as f64 / total as f64;
    if ratio(devanagari) > 0.3 {
        "hi".to_string()
    } else if ratio(arabic) > 0.3 {
        "ur".to_string()
    } else if ratio(latin) > 0.7 {
        "en".to_string()
    } else {
        "unknown".to_string()
    }
}
