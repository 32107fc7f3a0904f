pub mod cache;
pub mod estimate;
pub mod export;
pub mod fetcher;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod service;

pub use crate::domain::model::{NutritionRecord, VenueDescriptor};
pub use crate::domain::ports::{PageFetcher, Storage};
pub use crate::utils::error::Result;
