pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::memory::InMemorySource;
pub use config::toml_config::RankingConfig;
pub use crate::core::{
    aggregation::{AggregationRegistry, AggregationStrategy},
    ranking::TopCitiesByAggregation,
    top_n::TopNSelector,
};
pub use domain::model::{City, DailyTemp, RankedEntry, RankingReport, MIN_POPULATION};
pub use domain::ports::CityTemperatureSource;
pub use utils::error::{RankError, Result};
