use crate::domain::model::{City, DailyTemp};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// Supplies city metadata and per-city temperature history.
#[async_trait]
pub trait CityTemperatureSource: Send + Sync {
    /// Returns every known city among `ids`. Unknown ids are omitted, not errors.
    async fn fetch_cities(&self, ids: &HashSet<String>) -> Result<Vec<City>>;

    /// Daily temperatures for the prior year, oldest first. May be empty.
    async fn fetch_yearly_temperatures(&self, city_id: &str) -> Result<Vec<DailyTemp>>;
}

pub trait RankingSettings: Send + Sync {
    fn min_population(&self) -> u64;
    fn concurrency(&self) -> usize;
}
