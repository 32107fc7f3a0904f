//! Multi-strategy menu parser.
//!
//! Strategies are tried in a fixed order and the first one that yields any
//! candidates wins; results are never merged across strategies because
//! their column semantics differ. Every strategy degrades to `None` on
//! markup it does not recognize.

pub mod card;
pub mod fragments;
pub mod table;
pub mod text;

use crate::domain::model::{ExtractionResult, RawCandidate, StrategyKind};
use chrono::Utc;
use scraper::{ElementRef, Html};

pub type Strategy = fn(&Html) -> Option<Vec<RawCandidate>>;

pub const STRATEGIES: [(StrategyKind, Strategy); 3] = [
    (StrategyKind::Table, table::extract as Strategy),
    (StrategyKind::Card, card::extract as Strategy),
    (StrategyKind::TextPattern, text::extract as Strategy),
];

pub fn parse(venue: &str, markup: &str) -> ExtractionResult {
    let document = Html::parse_document(markup);

    for (kind, strategy) in STRATEGIES {
        if let Some(candidates) = strategy(&document) {
            tracing::debug!(
                "{}: {:?} strategy produced {} candidates",
                venue,
                kind,
                candidates.len()
            );
            return ExtractionResult {
                venue: venue.to_string(),
                candidates,
                strategy: Some(kind),
                timestamp: Utc::now(),
            };
        }
    }

    tracing::debug!("{}: no strategy recognized the markup", venue);
    ExtractionResult {
        venue: venue.to_string(),
        candidates: Vec::new(),
        strategy: None,
        timestamp: Utc::now(),
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub(crate) fn non_empty(candidates: Vec<RawCandidate>) -> Option<Vec<RawCandidate>> {
    (!candidates.is_empty()).then_some(candidates)
}
