//! Card strategy: repeated menu-item containers.
//!
//! Two shapes are read, in document order within each: the dining site's
//! `li.lightbox-nutrition` anchors that carry every fact in `data-*`
//! attributes, then generic cards whose name is a heading (or a
//! name/title-classed element) with the values inline in the card text.

use super::{collapse_whitespace, element_text, non_empty};
use crate::core::parser::fragments::{self, is_item_name};
use crate::domain::model::{NutrientField, RawCandidate};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static LIGHTBOX_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("li.lightbox-nutrition a").expect("lightbox selector is valid")
});
static CONTAINER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div, article, li, section").expect("container selector is valid")
});
static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6").expect("heading selector is valid")
});
static CLASSED_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class]").expect("class selector is valid"));

static CARD_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)card|item|dish|food").expect("card class pattern is valid"));
static NAME_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)name|title").expect("name class pattern is valid"));

const DATA_ATTRIBUTES: &[(&str, NutrientField)] = &[
    ("data-calories", NutrientField::Calories),
    ("data-total-fat", NutrientField::TotalFat),
    ("data-sat-fat", NutrientField::SaturatedFat),
    ("data-trans-fat", NutrientField::TransFat),
    ("data-cholesterol", NutrientField::Cholesterol),
    ("data-sodium", NutrientField::Sodium),
    ("data-total-carb", NutrientField::TotalCarbohydrates),
    ("data-dietary-fiber", NutrientField::DietaryFiber),
    ("data-sugars", NutrientField::TotalSugars),
    ("data-protein", NutrientField::Protein),
];

pub fn extract(document: &Html) -> Option<Vec<RawCandidate>> {
    let mut candidates = data_attribute_items(document);
    candidates.extend(generic_cards(document));
    non_empty(candidates)
}

fn data_attribute_items(document: &Html) -> Vec<RawCandidate> {
    let mut candidates = Vec::new();

    for link in document.select(&LIGHTBOX_SELECTOR) {
        let element = link.value();
        let name = element
            .attr("data-dish-name")
            .map(collapse_whitespace)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| element_text(link));
        if name.chars().count() < 2 {
            continue;
        }

        let mut candidate = RawCandidate::new(name);
        for (attribute, field) in DATA_ATTRIBUTES {
            if let Some(value) = element.attr(attribute).map(str::trim).filter(|v| !v.is_empty()) {
                candidate.push(*field, value);
            }
        }
        candidate.serving_size = element
            .attr("data-serving-size")
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty());

        if candidate.has_fields() {
            candidates.push(candidate);
        }
    }

    candidates
}

fn is_card(element: ElementRef<'_>) -> bool {
    element
        .value()
        .attr("class")
        .map(|class| CARD_CLASS_RE.is_match(class) && !NAME_CLASS_RE.is_match(class))
        .unwrap_or(false)
}

fn name_element<'a>(card: ElementRef<'a>) -> Option<ElementRef<'a>> {
    card.select(&HEADING_SELECTOR).next().or_else(|| {
        card.select(&CLASSED_SELECTOR).find(|el| {
            el.id() != card.id()
                && el
                    .value()
                    .attr("class")
                    .map(|class| NAME_CLASS_RE.is_match(class))
                    .unwrap_or(false)
        })
    })
}

fn generic_cards(document: &Html) -> Vec<RawCandidate> {
    let mut candidates = Vec::new();

    for card in document.select(&CONTAINER_SELECTOR).filter(|el| is_card(*el)) {
        // Wrappers around a list of cards are handled through their children.
        let wraps_cards = card
            .select(&CONTAINER_SELECTOR)
            .any(|inner| inner.id() != card.id() && is_card(inner));
        if wraps_cards {
            continue;
        }

        let Some(name_el) = name_element(card) else {
            continue;
        };
        let name = element_text(name_el);
        if !is_item_name(&name) {
            continue;
        }

        let body = element_text(card);
        let rest = body.replacen(&name, " ", 1);
        let fragment = fragments::extract_fields(&rest);

        let mut candidate = RawCandidate::new(name);
        candidate.serving_size = fragment.serving_size;
        for (field, raw) in fragment.fields {
            candidate.push(field, raw);
        }
        if candidate.has_fields() {
            candidates.push(candidate);
        }
    }

    candidates
}
