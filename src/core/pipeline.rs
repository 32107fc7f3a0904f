use crate::core::estimate::FallbackEstimator;
use crate::core::normalize::Normalizer;
use crate::core::parser;
use crate::domain::model::{LocationReport, NoDataReason, NormalizeStats, VenueDescriptor};
use crate::domain::ports::PageFetcher;
use crate::utils::error::FetchError;
use std::fmt;

/// A failed fetch is retried once before it is surfaced.
pub const MAX_FETCH_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Fetching,
    Parsing,
    Normalizing,
    Complete,
    EmptyTriggersFallback,
    Fallback,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Fetching => "fetching",
            PipelineStage::Parsing => "parsing",
            PipelineStage::Normalizing => "normalizing",
            PipelineStage::Complete => "complete",
            PipelineStage::EmptyTriggersFallback => "empty, fallback pending",
            PipelineStage::Fallback => "fallback",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub error: FetchError,
    pub attempts: u32,
}

/// Runs one venue through fetch, parse and normalize, and applies the
/// fallback estimate when extraction comes back empty.
pub struct VenuePipeline<'a, F: PageFetcher> {
    fetcher: &'a F,
    normalizer: &'a Normalizer,
    estimator: &'a FallbackEstimator,
}

impl<'a, F: PageFetcher> VenuePipeline<'a, F> {
    pub fn new(fetcher: &'a F, normalizer: &'a Normalizer, estimator: &'a FallbackEstimator) -> Self {
        Self {
            fetcher,
            normalizer,
            estimator,
        }
    }

    fn enter(venue: &str, stage: PipelineStage) {
        tracing::debug!("{}: {}", venue, stage);
    }

    async fn fetch_with_retry(&self, venue: &VenueDescriptor) -> Result<String, FetchFailure> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.fetcher.fetch(venue).await {
                Ok(markup) => return Ok(markup),
                Err(error) if attempts < MAX_FETCH_ATTEMPTS => {
                    tracing::warn!("{}: fetch failed ({}), retrying", venue.key, error);
                }
                Err(error) => {
                    Self::enter(&venue.key, PipelineStage::Failed);
                    tracing::warn!(
                        "{}: giving up after {} attempts: {}",
                        venue.key,
                        attempts,
                        error
                    );
                    return Err(FetchFailure { error, attempts });
                }
            }
        }
    }

    /// The extracted report, before any fallback is applied.
    pub async fn extract(&self, venue: &VenueDescriptor) -> Result<LocationReport, FetchFailure> {
        Self::enter(&venue.key, PipelineStage::Fetching);
        let markup = self.fetch_with_retry(venue).await?;

        Self::enter(&venue.key, PipelineStage::Parsing);
        let extraction = parser::parse(&venue.key, &markup);

        Self::enter(&venue.key, PipelineStage::Normalizing);
        let (records, stats) = self.normalizer.normalize_with_stats(&extraction);

        let no_data = if records.is_empty() {
            Self::enter(&venue.key, PipelineStage::EmptyTriggersFallback);
            Some(NoDataReason::EmptyExtraction)
        } else {
            Self::enter(&venue.key, PipelineStage::Complete);
            None
        };

        tracing::info!(
            "{}: {} records via {:?}",
            venue.key,
            records.len(),
            extraction.strategy
        );

        Ok(LocationReport {
            venue: venue.key.clone(),
            display_name: venue.display_name.clone(),
            records,
            strategy: extraction.strategy,
            no_data,
            stats,
        })
    }

    /// Empty report for a venue whose fetch failed after the retry.
    pub fn unavailable(&self, venue: &VenueDescriptor, failure: &FetchFailure) -> LocationReport {
        LocationReport {
            venue: venue.key.clone(),
            display_name: venue.display_name.clone(),
            records: Vec::new(),
            strategy: None,
            no_data: Some(NoDataReason::UpstreamUnavailable(format!(
                "{} after {} attempts",
                failure.error, failure.attempts
            ))),
            stats: NormalizeStats::default(),
        }
    }

    /// Estimates each expected name when the report is empty. With no names
    /// to estimate the report keeps its no-data marker. An upstream failure
    /// stays marked even when estimates are added.
    pub fn fallback(&self, mut report: LocationReport, expected_names: &[String]) -> LocationReport {
        if !report.records.is_empty() {
            Self::enter(&report.venue, PipelineStage::Done);
            return report;
        }

        Self::enter(&report.venue, PipelineStage::Fallback);
        let names: Vec<&str> = expected_names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect();
        if !names.is_empty() {
            report.records = names
                .into_iter()
                .map(|name| self.estimator.estimate_for(name, Some(&report.venue)))
                .collect();
            if report.no_data == Some(NoDataReason::EmptyExtraction) {
                report.no_data = None;
            }
            tracing::info!(
                "{}: estimated {} expected items",
                report.venue,
                report.records.len()
            );
        }

        Self::enter(&report.venue, PipelineStage::Done);
        report
    }
}
