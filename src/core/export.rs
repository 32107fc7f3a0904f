use crate::domain::model::{BatchReport, NutritionRecord, Provenance, SearchReport};
use crate::domain::ports::Storage;
use crate::utils::error::{NutritionError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = NutritionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(NutritionError::InvalidConfigValueError {
                field: "format".to_string(),
                value: other.to_string(),
                reason: "Unsupported format. Valid formats: json, csv".to_string(),
            }),
        }
    }
}

/// Flat CSV row; absent values become empty cells.
#[derive(Serialize)]
struct CsvRow<'a> {
    venue: &'a str,
    name: &'a str,
    serving_size: &'a str,
    calories: Option<u32>,
    total_fat: Option<f64>,
    saturated_fat: Option<f64>,
    trans_fat: Option<f64>,
    cholesterol: Option<f64>,
    sodium: Option<f64>,
    total_carbohydrates: Option<f64>,
    dietary_fiber: Option<f64>,
    total_sugars: Option<f64>,
    protein: Option<f64>,
    estimated: bool,
}

impl<'a> From<&'a NutritionRecord> for CsvRow<'a> {
    fn from(record: &'a NutritionRecord) -> Self {
        Self {
            venue: record.venue.as_deref().unwrap_or(""),
            name: &record.name,
            serving_size: record.serving_size.as_deref().unwrap_or(""),
            calories: record.calories,
            total_fat: record.total_fat,
            saturated_fat: record.saturated_fat,
            trans_fat: record.trans_fat,
            cholesterol: record.cholesterol,
            sodium: record.sodium,
            total_carbohydrates: record.total_carbohydrates,
            dietary_fiber: record.dietary_fiber,
            total_sugars: record.total_sugars,
            protein: record.protein,
            estimated: record.provenance == Provenance::Estimated,
        }
    }
}

pub fn records_to_csv<'a, I>(records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a NutritionRecord>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut written = 0;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
        written += 1;
    }
    if written == 0 {
        // `serialize` writes the header with the first row only.
        writer.write_record([
            "venue",
            "name",
            "serving_size",
            "calories",
            "total_fat",
            "saturated_fat",
            "trans_fat",
            "cholesterol",
            "sodium",
            "total_carbohydrates",
            "dietary_fiber",
            "total_sugars",
            "protein",
            "estimated",
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| NutritionError::IoError(e.into_error()))
}

fn slug(text: &str) -> String {
    let slug = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if slug.is_empty() {
        "query".to_string()
    } else {
        slug
    }
}

/// Writes reports through a `Storage` and returns the path written.
pub struct Exporter<S: Storage> {
    storage: S,
}

impl<S: Storage> Exporter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn write_batch(&self, batch: &BatchReport, format: ExportFormat) -> Result<String> {
        let path = format!("nutrition_batch.{}", format.extension());
        let data = match format {
            ExportFormat::Json => serde_json::to_vec_pretty(batch)?,
            ExportFormat::Csv => {
                records_to_csv(batch.venues.iter().flat_map(|(_, outcome)| outcome.records()))?
            }
        };

        tracing::debug!("Writing {} ({} bytes)", path, data.len());
        self.storage.write_file(&path, &data).await?;
        Ok(path)
    }

    pub async fn write_search(&self, report: &SearchReport, format: ExportFormat) -> Result<String> {
        let path = format!("search_{}.{}", slug(&report.query), format.extension());
        let data = match format {
            ExportFormat::Json => serde_json::to_vec_pretty(report)?,
            ExportFormat::Csv => records_to_csv(&report.records)?,
        };

        tracing::debug!("Writing {} ({} bytes)", path, data.len());
        self.storage.write_file(&path, &data).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{LocationReport, NormalizeStats, VenueOutcome};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn batch() -> BatchReport {
        let mut chicken = NutritionRecord::new(
            "Grilled Chicken",
            Some("worcester".to_string()),
            Provenance::Extracted,
        );
        chicken.calories = Some(250);
        chicken.protein = Some(30.0);

        BatchReport {
            venues: vec![
                (
                    "worcester".to_string(),
                    VenueOutcome::Completed(LocationReport {
                        venue: "worcester".to_string(),
                        display_name: "Worcester Dining Commons".to_string(),
                        records: vec![chicken],
                        strategy: None,
                        no_data: None,
                        stats: NormalizeStats::default(),
                    }),
                ),
                (
                    "franklin".to_string(),
                    VenueOutcome::Failed {
                        error: "upstream returned HTTP 500".to_string(),
                        attempts: 2,
                    },
                ),
            ],
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[tokio::test]
    async fn test_batch_csv_contains_completed_records_only() {
        let storage = MockStorage::default();
        let exporter = Exporter::new(storage.clone());

        let path = exporter.write_batch(&batch(), ExportFormat::Csv).await.unwrap();
        assert_eq!(path, "nutrition_batch.csv");

        let csv = String::from_utf8(storage.get_file(&path).await.unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("venue,name,serving_size,calories"));
        assert_eq!(lines[1], "worcester,Grilled Chicken,,250,,,,,,,,,30.0,false");
    }

    #[tokio::test]
    async fn test_batch_json_keeps_failures() {
        let storage = MockStorage::default();
        let exporter = Exporter::new(storage.clone());

        let path = exporter.write_batch(&batch(), ExportFormat::Json).await.unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&storage.get_file(&path).await.unwrap()).unwrap();

        assert_eq!(value["venues"][0][0], "worcester");
        assert_eq!(value["venues"][0][1]["status"], "completed");
        assert_eq!(value["venues"][1][1]["status"], "failed");
        assert_eq!(value["venues"][1][1]["attempts"], 2);
    }

    #[tokio::test]
    async fn test_empty_search_csv_still_has_header() {
        let storage = MockStorage::default();
        let exporter = Exporter::new(storage.clone());
        let report = SearchReport {
            query: "Mac & Cheese".to_string(),
            venue: None,
            records: Vec::new(),
            failures: Vec::new(),
            no_data: None,
        };

        let path = exporter.write_search(&report, ExportFormat::Csv).await.unwrap();
        assert_eq!(path, "search_mac_cheese.csv");
        let csv = String::from_utf8(storage.get_file(&path).await.unwrap()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
