//! Text-pattern strategy, the last resort when a page has no usable structure.

use super::{collapse_whitespace, non_empty};
use crate::core::parser::fragments::{self, is_item_name};
use crate::domain::model::RawCandidate;
use scraper::{Html, Node};

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head", "title"];

/// Visible text nodes in document order, whitespace-collapsed.
fn visible_lines(document: &Html) -> Vec<String> {
    let mut lines = Vec::new();
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }
        let line = collapse_whitespace(text);
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

pub fn extract(document: &Html) -> Option<Vec<RawCandidate>> {
    let mut items: Vec<(String, String)> = Vec::new();

    for line in visible_lines(document) {
        // The name ends where the first nutrient or serving clause begins.
        let split = [
            fragments::first_token_offset(&line),
            fragments::serving_size_offset(&line),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
        let (prefix, rest) = line.split_at(split);
        let prefix = prefix.trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '-' | ':' | '|' | ',' | '–' | '—' | '•' | '·')
        });

        if is_item_name(prefix) {
            items.push((prefix.to_string(), rest.to_string()));
        } else if let Some((_, body)) = items.last_mut() {
            body.push('\n');
            body.push_str(&line);
        }
    }

    let candidates = items
        .into_iter()
        .filter_map(|(name, body)| {
            let fragment = fragments::extract_fields(&body);
            let mut candidate = RawCandidate::new(name);
            candidate.serving_size = fragment.serving_size;
            for (field, raw) in fragment.fields {
                candidate.push(field, raw);
            }
            candidate.has_fields().then_some(candidate)
        })
        .collect();

    non_empty(candidates)
}
