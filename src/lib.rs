pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::NutritionConfig};
pub use core::{
    export::{ExportFormat, Exporter},
    fetcher::HttpFetcher,
    service::NutritionService,
};
pub use domain::model::{
    BatchReport, LocationReport, NoDataReason, NutritionRecord, Provenance, SearchReport,
    VenueDescriptor, VenueOutcome,
};
pub use utils::error::{NutritionError, Result};
