//! Label/value tokenizer shared by every extraction strategy.
//!
//! A fragment such as `"Calories: 250, Total Fat 10g (15%)"` or
//! `"250 cal · 30g protein"` is split into label and number tokens, then
//! paired. Whether labels lead or trail their values is decided per
//! fragment from which pairing shows up more often with nothing but
//! whitespace, a colon or a dash in between. Numbers are unsigned, so a
//! dash right after a label is a separator, never a minus sign.

use crate::domain::model::NutrientField;
use regex::Regex;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        (?P<noise>\bcalories\s+from\s+fat\b(?:\s*[:\-]?\s*\d+(?:\.\d+)?)?)
        |
        (?P<label>\b(?:
            total\s+carbohydrates? | total\s+carbs? | carbohydrates? | carbs? |
            saturated\s+fat | sat\.?\s*fat | trans\s+fat | total\s+fat |
            dietary\s+fib(?:er|re) | fib(?:er|re) |
            total\s+sugars? | sugars? |
            cholesterol | sodium | protein | calories | kcal | cal | fat
        )\b)
        |
        (?P<number>(?:<\s*)?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?)
        \s*
        (?:(?P<unit>mg|g|kcal|calories|cal)\b | (?P<percent>%))?
        ",
    )
    .expect("fragment token pattern is valid")
});

static SERVING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)serving(?:\s+size)?\s*[:\-]?\s*(\d+(?:[./]\d+)?\s*(?:oz|ounces?|g|grams?|ml|cups?|tbsp|tsp|each|ea|pieces?|slices?)\b\.?)",
    )
    .expect("serving size pattern is valid")
});

const NOISE_NAMES: &[&str] = &[
    "nutrition facts",
    "nutrition information",
    "nutrition info",
    "amount per serving",
    "per",
    "daily value",
    "% daily value",
    "ingredients",
    "contains",
    "allergens",
    "item",
    "name",
    "menu item",
    "dish",
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenKind {
    Label(NutrientField),
    Value { calories: bool },
}

#[derive(Debug, Clone)]
struct Token<'a> {
    kind: TokenKind,
    start: usize,
    end: usize,
    text: &'a str,
}

/// Nutrient pairs and serving size found in one fragment of text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub serving_size: Option<String>,
    pub fields: Vec<(NutrientField, String)>,
}

impl Fragment {
    fn push(&mut self, field: NutrientField, raw: &str) {
        if !self.fields.iter().any(|(f, _)| *f == field) {
            self.fields.push((field, raw.trim().to_string()));
        }
    }
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for caps in TOKEN_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if caps.name("noise").is_some() {
            continue;
        }
        if let Some(label) = caps.name("label") {
            if let Some(field) = NutrientField::from_label(label.as_str()) {
                tokens.push(Token {
                    kind: TokenKind::Label(field),
                    start: whole.start(),
                    end: whole.end(),
                    text: whole.as_str(),
                });
            }
        } else if caps.name("percent").is_none() {
            let calories = caps
                .name("unit")
                .map(|u| {
                    let unit = u.as_str().to_lowercase();
                    unit == "kcal" || unit == "cal" || unit == "calories"
                })
                .unwrap_or(false);
            tokens.push(Token {
                kind: TokenKind::Value { calories },
                start: whole.start(),
                end: whole.end(),
                text: whole.as_str(),
            });
        }
    }
    tokens
}

/// Nothing but whitespace, a colon, an equals sign or a dash between two tokens.
fn adjacent(text: &str, left: &Token, right: &Token) -> bool {
    text.get(left.end..right.start)
        .map(|gap| {
            gap.chars()
                .all(|c| c.is_whitespace() || matches!(c, ':' | '-' | '=' | '–'))
        })
        .unwrap_or(false)
}

/// Splits out a `Serving Size: 4 oz` clause, returning it and the remaining text.
pub fn take_serving_size(text: &str) -> (Option<String>, String) {
    match SERVING_RE.captures(text) {
        Some(caps) => {
            let serving = caps.get(1).map(|m| m.as_str().trim_end_matches('.').trim().to_string());
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            let mut rest = String::with_capacity(text.len());
            rest.push_str(&text[..whole.start]);
            rest.push(' ');
            rest.push_str(&text[whole.end..]);
            (serving, rest)
        }
        None => (None, text.to_string()),
    }
}

/// Byte offset where a `Serving Size: 4 oz` clause starts.
pub fn serving_size_offset(text: &str) -> Option<usize> {
    SERVING_RE.find(text).map(|m| m.start())
}

/// Extracts label/value pairs from a free-form fragment.
pub fn extract_fields(text: &str) -> Fragment {
    let (serving_size, text) = take_serving_size(text);
    let mut fragment = Fragment {
        serving_size,
        fields: Vec::new(),
    };

    let mut tokens = Vec::new();
    for token in tokenize(&text) {
        // "250 cal" carries its own label.
        if token.kind == (TokenKind::Value { calories: true }) {
            fragment.push(NutrientField::Calories, token.text);
        } else {
            tokens.push(token);
        }
    }

    let mut label_first = 0usize;
    let mut value_first = 0usize;
    for pair in tokens.windows(2) {
        match (pair[0].kind, pair[1].kind) {
            (TokenKind::Label(_), TokenKind::Value { .. }) if adjacent(&text, &pair[0], &pair[1]) => {
                label_first += 1
            }
            (TokenKind::Value { .. }, TokenKind::Label(_)) if adjacent(&text, &pair[0], &pair[1]) => {
                value_first += 1
            }
            _ => {}
        }
    }

    if value_first > label_first {
        let mut pending: Option<&str> = None;
        for token in &tokens {
            match token.kind {
                TokenKind::Value { .. } => pending = Some(token.text),
                TokenKind::Label(field) => {
                    if let Some(raw) = pending.take() {
                        fragment.push(field, raw);
                    }
                }
            }
        }
    } else {
        let mut pending: Option<NutrientField> = None;
        for token in &tokens {
            match token.kind {
                TokenKind::Label(field) => pending = Some(field),
                TokenKind::Value { .. } => {
                    if let Some(field) = pending.take() {
                        fragment.push(field, token.text);
                    }
                }
            }
        }
    }

    fragment
}

/// Byte offset of the first nutrient label or number, ignoring percentages.
pub fn first_token_offset(text: &str) -> Option<usize> {
    tokenize(text).first().map(|t| t.start)
}

/// Headings like "Nutrition Facts" that are never item names.
pub fn is_noise_name(name: &str) -> bool {
    let lowered = name.trim().trim_end_matches(':').to_lowercase();
    lowered.is_empty()
        || lowered.starts_with('%')
        || NOISE_NAMES.iter().any(|noise| lowered == *noise || lowered.starts_with(&format!("{} ", noise)))
}

/// Plausible item name: has letters, is not a nutrient label or a known heading.
pub fn is_item_name(name: &str) -> bool {
    let name = name.trim();
    name.chars().filter(|c| c.is_alphabetic()).count() >= 2
        && NutrientField::from_label(name).is_none()
        && !is_noise_name(name)
}
