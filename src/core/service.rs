use crate::config::toml_config::NutritionConfig;
use crate::core::cache::ResultCache;
use crate::core::estimate::FallbackEstimator;
use crate::core::fetcher::HttpFetcher;
use crate::core::normalize::Normalizer;
use crate::core::pipeline::{FetchFailure, VenuePipeline};
use crate::core::registry::LocationRegistry;
use crate::domain::model::{
    BatchReport, LocationReport, NoDataReason, SearchReport, VenueDescriptor, VenueFailure,
    VenueOutcome,
};
use crate::domain::ports::PageFetcher;
use crate::utils::error::Result;
use tokio::time::Instant;

/// Entry point for callers: location lookups, search and batch scrapes.
pub struct NutritionService<F: PageFetcher> {
    registry: LocationRegistry,
    fetcher: F,
    normalizer: Normalizer,
    estimator: FallbackEstimator,
    cache: ResultCache,
    max_results: usize,
}

impl NutritionService<HttpFetcher> {
    pub fn from_config(config: &NutritionConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Self::new(config, fetcher)
    }
}

impl<F: PageFetcher> NutritionService<F> {
    pub fn new(config: &NutritionConfig, fetcher: F) -> Result<Self> {
        Ok(Self {
            registry: LocationRegistry::new(config.venues.clone()),
            fetcher,
            normalizer: Normalizer::new(),
            estimator: FallbackEstimator::new(config.fallback_profiles()?),
            cache: ResultCache::from_seconds(config.cache.ttl_seconds),
            max_results: config.search.max_results,
        })
    }

    fn pipeline(&self) -> VenuePipeline<'_, F> {
        VenuePipeline::new(&self.fetcher, &self.normalizer, &self.estimator)
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn all_locations(&self) -> &[VenueDescriptor] {
        self.registry.all()
    }

    async fn extracted(
        &self,
        venue: &VenueDescriptor,
    ) -> std::result::Result<LocationReport, FetchFailure> {
        if let Some(report) = self.cache.get(&venue.key).await {
            return Ok(report);
        }
        let report = self.pipeline().extract(venue).await?;
        self.cache.put(&report).await;
        Ok(report)
    }

    pub async fn by_location(&self, location: &str) -> Result<LocationReport> {
        self.by_location_expecting(location, &[]).await
    }

    /// Like `by_location`, but an empty or unreachable page yields one
    /// estimate per expected name. Only an unknown location is an error.
    pub async fn by_location_expecting(
        &self,
        location: &str,
        expected_names: &[String],
    ) -> Result<LocationReport> {
        let venue = self.registry.resolve(location)?;
        let report = match self.extracted(venue).await {
            Ok(report) => report,
            Err(failure) => self.pipeline().unavailable(venue, &failure),
        };
        Ok(self.pipeline().fallback(report, expected_names))
    }

    pub async fn search(&self, query: &str, location: Option<&str>) -> Result<SearchReport> {
        let query = query.trim();
        let mut report = SearchReport {
            query: query.to_string(),
            venue: None,
            records: Vec::new(),
            failures: Vec::new(),
            no_data: None,
        };
        if query.is_empty() {
            report.no_data = Some(NoDataReason::BlankQuery);
            return Ok(report);
        }

        let venues: Vec<&VenueDescriptor> = match location {
            Some(location) => {
                let venue = self.registry.resolve(location)?;
                report.venue = Some(venue.key.clone());
                vec![venue]
            }
            None => self.registry.list_open(),
        };

        let needle = query.to_lowercase();
        let mut extracted_any = false;
        let mut responded = 0;

        for venue in &venues {
            match self.extracted(venue).await {
                Ok(extracted) => {
                    responded += 1;
                    extracted_any |= !extracted.records.is_empty();
                    report.records.extend(
                        extracted
                            .records
                            .into_iter()
                            .filter(|r| r.name.to_lowercase().contains(&needle)),
                    );
                }
                Err(failure) => {
                    report.failures.push(VenueFailure {
                        venue: venue.key.clone(),
                        error: failure.error.to_string(),
                    });
                }
            }
        }

        if responded == 0 {
            let detail = report
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.venue, f.error))
                .collect::<Vec<_>>()
                .join("; ");
            report.no_data = Some(NoDataReason::UpstreamUnavailable(detail));
        } else if !extracted_any {
            // Nothing to match against, so answer with an estimate for the query.
            let estimate = self.estimator.estimate_for(query, report.venue.as_deref());
            report.records.push(estimate);
        } else if report.records.is_empty() {
            report.no_data = Some(NoDataReason::NoMatches);
        }

        report.records.truncate(self.max_results);
        tracing::info!(
            "Search '{}' matched {} records ({} venues failed)",
            query,
            report.records.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Scrapes every open venue in order. Venues not started before the
    /// deadline are reported as skipped.
    pub async fn scrape_all(&self, deadline: Option<Instant>) -> BatchReport {
        let mut batch = BatchReport::default();

        for venue in self.registry.list_open() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!("{}: skipped, deadline reached", venue.key);
                batch.venues.push((venue.key.clone(), VenueOutcome::Skipped));
                continue;
            }

            let outcome = match self.extracted(venue).await {
                Ok(report) => VenueOutcome::Completed(self.pipeline().fallback(report, &[])),
                Err(failure) => VenueOutcome::Failed {
                    error: failure.error.to_string(),
                    attempts: failure.attempts,
                },
            };
            batch.venues.push((venue.key.clone(), outcome));
        }

        tracing::info!(
            "Scraped {} venues, {} records total",
            batch.len(),
            batch.total_records()
        );
        batch
    }
}
