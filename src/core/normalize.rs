use crate::domain::model::{ExtractionResult, NormalizeStats, NutritionRecord, Provenance};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?").expect("number pattern is valid")
});

/// First number in a raw value, units and qualifiers ignored ("<1g" -> 1,
/// "1,340mg" -> 1340).
pub fn parse_number(raw: &str) -> Option<f64> {
    NUMBER_RE
        .find(raw)
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Turns raw candidates into typed, range-checked, de-duplicated records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, result: &ExtractionResult) -> Vec<NutritionRecord> {
        self.normalize_with_stats(result).0
    }

    pub fn normalize_with_stats(
        &self,
        result: &ExtractionResult,
    ) -> (Vec<NutritionRecord>, NormalizeStats) {
        let mut stats = NormalizeStats::default();
        let mut records: Vec<NutritionRecord> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for candidate in &result.candidates {
            let name = candidate.name.trim();
            let mut record =
                NutritionRecord::new(name, Some(result.venue.clone()), Provenance::Extracted);
            record.serving_size = candidate
                .serving_size
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            for (field, raw) in &candidate.fields {
                match parse_number(raw) {
                    None => {
                        stats.unparseable += 1;
                        tracing::debug!(
                            "{}: dropped unparseable {} '{}' for {}",
                            result.venue,
                            field.as_str(),
                            raw,
                            name
                        );
                    }
                    Some(value) if !field.is_plausible(value) => {
                        stats.out_of_range += 1;
                        tracing::debug!(
                            "{}: dropped out-of-range {} {} for {}",
                            result.venue,
                            field.as_str(),
                            value,
                            name
                        );
                    }
                    Some(value) => {
                        if record.get(*field).is_none() {
                            record.set(*field, value);
                        }
                    }
                }
            }

            if !record.is_valid() {
                stats.invalid_candidates += 1;
                continue;
            }

            let key = (name.to_lowercase(), result.venue.clone());
            match index.get(&key) {
                Some(&position) => {
                    records[position].merge_missing(&record);
                    stats.duplicates_merged += 1;
                }
                None => {
                    index.insert(key, records.len());
                    records.push(record);
                }
            }
        }

        if stats.unparseable + stats.out_of_range > 0 {
            tracing::info!(
                "{}: dropped {} unparseable and {} out-of-range values",
                result.venue,
                stats.unparseable,
                stats.out_of_range
            );
        }

        (records, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{NutrientField, RawCandidate, StrategyKind};
    use chrono::Utc;

    fn result(candidates: Vec<RawCandidate>) -> ExtractionResult {
        ExtractionResult {
            venue: "worcester".to_string(),
            candidates,
            strategy: Some(StrategyKind::Table),
            timestamp: Utc::now(),
        }
    }

    fn candidate(name: &str, fields: &[(NutrientField, &str)]) -> RawCandidate {
        let mut c = RawCandidate::new(name);
        for (field, raw) in fields {
            c.push(*field, *raw);
        }
        c
    }

    #[test]
    fn test_parse_number_strips_units() {
        assert_eq!(parse_number("30g"), Some(30.0));
        assert_eq!(parse_number("450 mg"), Some(450.0));
        assert_eq!(parse_number("<1g"), Some(1.0));
        assert_eq!(parse_number("2.5"), Some(2.5));
        assert_eq!(parse_number("-5"), Some(-5.0));
        assert_eq!(parse_number("1,050"), Some(1050.0));
        assert_eq!(parse_number("1,340mg"), Some(1340.0));
        assert_eq!(parse_number("2,000.5 kcal"), Some(2000.5));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_out_of_range_field_is_dropped_not_clamped() {
        let records = Normalizer::new().normalize(&result(vec![candidate(
            "Mega Burger",
            &[(NutrientField::Calories, "99999"), (NutrientField::Protein, "40g")],
        )]));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].calories, None);
        assert_eq!(records[0].protein, Some(40.0));
    }

    #[test]
    fn test_negative_values_are_dropped() {
        let (records, stats) = Normalizer::new().normalize_with_stats(&result(vec![candidate(
            "Odd Soup",
            &[(NutrientField::Sodium, "-20mg"), (NutrientField::Calories, "120")],
        )]));

        assert_eq!(records[0].sodium, None);
        assert_eq!(records[0].calories, Some(120));
        assert_eq!(stats.out_of_range, 1);
    }

    #[test]
    fn test_unparseable_becomes_absent() {
        let (records, stats) = Normalizer::new().normalize_with_stats(&result(vec![candidate(
            "Fruit Cup",
            &[(NutrientField::Calories, "--"), (NutrientField::TotalSugars, "14g")],
        )]));

        assert_eq!(records[0].calories, None);
        assert_eq!(records[0].total_sugars, Some(14.0));
        assert_eq!(stats.unparseable, 1);
    }

    #[test]
    fn test_duplicates_merge_first_seen_wins() {
        let (records, stats) = Normalizer::new().normalize_with_stats(&result(vec![
            candidate(
                "Grilled Chicken",
                &[(NutrientField::Calories, "250"), (NutrientField::TotalFat, "5g")],
            ),
            candidate(
                "grilled chicken ",
                &[(NutrientField::Calories, "300"), (NutrientField::Protein, "30g")],
            ),
        ]));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Grilled Chicken");
        assert_eq!(records[0].calories, Some(250));
        assert_eq!(records[0].total_fat, Some(5.0));
        assert_eq!(records[0].protein, Some(30.0));
        assert_eq!(stats.duplicates_merged, 1);
    }

    #[test]
    fn test_records_without_numbers_are_invalid() {
        let (records, stats) = Normalizer::new().normalize_with_stats(&result(vec![candidate(
            "Chef's Choice",
            &[(NutrientField::Calories, "varies")],
        )]));

        assert!(records.is_empty());
        assert_eq!(stats.invalid_candidates, 1);
    }

    #[test]
    fn test_thousands_separators_are_not_truncated() {
        let records = Normalizer::new().normalize(&result(vec![candidate(
            "Buffalo Chicken Wrap",
            &[(NutrientField::Calories, "1,050"), (NutrientField::Sodium, "1,340mg")],
        )]));
        assert_eq!(records[0].calories, Some(1050));
        assert_eq!(records[0].sodium, Some(1340.0));
    }

    #[test]
    fn test_calories_round_to_integer() {
        let records = Normalizer::new().normalize(&result(vec![candidate(
            "Bagel",
            &[(NutrientField::Calories, "289.6 kcal")],
        )]));
        assert_eq!(records[0].calories, Some(290));
    }
}
