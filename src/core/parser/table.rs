//! Table strategy: `<table>` nutrition panels and menu grids.

use super::{collapse_whitespace, element_text, non_empty};
use crate::core::parser::fragments::{self, is_item_name};
use crate::domain::model::{NutrientField, RawCandidate};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("table selector is valid"));
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("row selector is valid"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("cell selector is valid"));
static CAPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption").expect("caption selector is valid"));

const NAME_ATTRIBUTES: &[&str] = &["data-dish-name", "data-name", "data-item", "aria-label", "title"];

enum Column {
    Nutrient(NutrientField),
    Serving,
    Other,
}

fn classify_label(label: &str) -> Column {
    if let Some(field) = NutrientField::from_label(label) {
        return Column::Nutrient(field);
    }
    let lowered = label.trim().trim_end_matches(':').to_lowercase();
    if lowered == "serving size" || lowered == "serving" || lowered == "portion" {
        Column::Serving
    } else {
        Column::Other
    }
}

pub fn extract(document: &Html) -> Option<Vec<RawCandidate>> {
    let mut candidates = Vec::new();

    for table in document.select(&TABLE_SELECTOR) {
        let rows: Vec<Vec<String>> = table
            .select(&ROW_SELECTOR)
            .map(|row| row.select(&CELL_SELECTOR).map(element_text).collect::<Vec<_>>())
            .filter(|cells| !cells.is_empty())
            .collect();
        if rows.is_empty() {
            continue;
        }

        if let Some(candidate) = nutrition_panel(table, &rows) {
            candidates.push(candidate);
        } else if let Some(items) = header_grid(&rows) {
            candidates.extend(items);
        } else {
            candidates.extend(item_rows(&rows));
        }
    }

    non_empty(candidates)
}

/// Two-column `label | value` rows describing a single item.
fn nutrition_panel(table: ElementRef<'_>, rows: &[Vec<String>]) -> Option<RawCandidate> {
    let labelled = rows
        .iter()
        .filter(|cells| cells.len() == 2 && matches!(classify_label(&cells[0]), Column::Nutrient(_)))
        .count();
    if labelled == 0 || labelled * 2 < rows.len() {
        return None;
    }

    let name = panel_name(table, rows)?;
    let mut candidate = RawCandidate::new(name);
    for cells in rows.iter().filter(|cells| cells.len() == 2) {
        match classify_label(&cells[0]) {
            Column::Nutrient(field) => candidate.push(field, cells[1].clone()),
            Column::Serving if candidate.serving_size.is_none() => {
                candidate.serving_size = Some(cells[1].clone())
            }
            _ => {}
        }
    }

    candidate.has_fields().then_some(candidate)
}

fn panel_name(table: ElementRef<'_>, rows: &[Vec<String>]) -> Option<String> {
    if let Some(caption) = table.select(&CAPTION_SELECTOR).next() {
        let caption = element_text(caption);
        if is_item_name(&caption) {
            return Some(caption);
        }
    }

    for attribute in NAME_ATTRIBUTES {
        if let Some(value) = table.value().attr(attribute) {
            let value = collapse_whitespace(value);
            if is_item_name(&value) {
                return Some(value);
            }
        }
    }

    for cells in rows {
        match cells.as_slice() {
            [single] if is_item_name(single) => return Some(single.clone()),
            [label, value] if matches!(label.to_lowercase().trim(), "item" | "name" | "dish" | "menu item") => {
                if is_item_name(value) {
                    return Some(value.clone());
                }
            }
            _ => {}
        }
    }

    None
}

/// First row names the nutrient columns; each further row is one item.
fn header_grid(rows: &[Vec<String>]) -> Option<Vec<RawCandidate>> {
    let (header, body) = rows.split_first()?;
    if header.len() < 2 || matches!(classify_label(&header[0]), Column::Nutrient(_)) {
        return None;
    }
    let columns: Vec<Column> = header.iter().map(|h| classify_label(h)).collect();
    if !columns.iter().skip(1).any(|c| matches!(c, Column::Nutrient(_))) {
        return None;
    }

    let mut candidates = Vec::new();
    for cells in body {
        let Some(name) = cells.first().filter(|n| is_item_name(n)) else {
            continue;
        };
        let mut candidate = RawCandidate::new(name.clone());
        for (column, value) in columns.iter().zip(cells.iter()).skip(1) {
            match column {
                Column::Nutrient(field) if !value.is_empty() => candidate.push(*field, value.clone()),
                Column::Serving if !value.is_empty() => candidate.serving_size = Some(value.clone()),
                _ => {}
            }
        }
        if candidate.has_fields() {
            candidates.push(candidate);
        }
    }

    Some(candidates)
}

/// `Grilled Chicken | Calories 250 | Protein 30g` style rows.
fn item_rows(rows: &[Vec<String>]) -> Vec<RawCandidate> {
    rows.iter()
        .filter(|cells| cells.len() >= 2 && is_item_name(&cells[0]))
        .filter_map(|cells| {
            let fragment = fragments::extract_fields(&cells[1..].join(" | "));
            let mut candidate = RawCandidate::new(cells[0].clone());
            candidate.serving_size = fragment.serving_size;
            for (field, raw) in fragment.fields {
                candidate.push(field, raw);
            }
            candidate.has_fields().then_some(candidate)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(markup: &str) -> Vec<RawCandidate> {
        extract(&Html::parse_document(markup)).unwrap_or_default()
    }

    #[test]
    fn test_inline_item_rows() {
        let candidates = parse(
            "<table><tr><td>Grilled Chicken</td><td>Calories 250</td><td>Protein 30g</td></tr></table>",
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Grilled Chicken");
        assert_eq!(candidates[0].raw(NutrientField::Calories), Some("250"));
        assert_eq!(candidates[0].raw(NutrientField::Protein), Some("30g"));
    }

    #[test]
    fn test_nutrition_panel_with_caption() {
        let candidates = parse(
            r#"<table>
                <caption>Vegetable Lo Mein</caption>
                <tr><th>Serving Size</th><td>1 cup</td></tr>
                <tr><th>Calories</th><td>320</td></tr>
                <tr><th>Total Fat</th><td>9g</td></tr>
                <tr><th>Sodium</th><td>610mg</td></tr>
            </table>"#,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Vegetable Lo Mein");
        assert_eq!(candidates[0].serving_size.as_deref(), Some("1 cup"));
        assert_eq!(candidates[0].raw(NutrientField::Sodium), Some("610mg"));
    }

    #[test]
    fn test_panel_without_name_is_skipped() {
        let candidates =
            parse("<table><tr><td>Calories</td><td>320</td></tr><tr><td>Fat</td><td>9g</td></tr></table>");
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_header_grid() {
        let candidates = parse(
            r#"<table>
                <tr><th>Item</th><th>Calories</th><th>Protein (g)</th><th>Allergens</th></tr>
                <tr><td>Cheese Pizza</td><td>285</td><td>12</td><td>Milk, Wheat</td></tr>
                <tr><td>Garden Salad</td><td>90</td><td>3</td><td></td></tr>
            </table>"#,
        );
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "Cheese Pizza");
        assert_eq!(candidates[0].raw(NutrientField::Protein), Some("12"));
        assert_eq!(candidates[1].raw(NutrientField::Calories), Some("90"));
    }

    #[test]
    fn test_layout_tables_without_nutrition_are_empty() {
        assert!(extract(&Html::parse_document(
            "<table><tr><td>Hours</td><td>7am - 9pm</td></tr></table>"
        ))
        .is_none());
    }
}
