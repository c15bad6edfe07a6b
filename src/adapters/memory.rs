use crate::domain::model::{City, DailyTemp};
use crate::domain::ports::CityTemperatureSource;
use crate::utils::error::{RankError, Result};
use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityRecord {
    #[serde(flatten)]
    pub city: City,
    #[serde(default)]
    pub temperatures: Vec<DailyTemp>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub cities: Vec<CityRecord>,
}

/// [`CityTemperatureSource`] over a dataset held in memory.
///
/// With an `as_of` date set, temperature lookups only return samples from the
/// twelve months ending on that date.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: HashMap<String, CityRecord>,
    as_of: Option<NaiveDate>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        let mut source = Self::new();
        for record in dataset.cities {
            source.insert(record.city, record.temperatures);
        }
        source
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(content)?;
        Ok(Self::from_dataset(dataset))
    }

    pub async fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&content)
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn insert(&mut self, city: City, mut temperatures: Vec<DailyTemp>) {
        temperatures.sort_by_key(|day| day.date);
        self.records
            .insert(city.id.clone(), CityRecord { city, temperatures });
    }

    pub fn city_ids(&self) -> HashSet<String> {
        self.records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn in_window(&self, date: NaiveDate) -> bool {
        match self.as_of {
            Some(as_of) => {
                let start = as_of
                    .checked_sub_months(Months::new(12))
                    .unwrap_or(NaiveDate::MIN);
                date > start && date <= as_of
            }
            None => true,
        }
    }
}

#[async_trait]
impl CityTemperatureSource for InMemorySource {
    async fn fetch_cities(&self, ids: &HashSet<String>) -> Result<Vec<City>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(id))
            .map(|record| record.city.clone())
            .collect())
    }

    async fn fetch_yearly_temperatures(&self, city_id: &str) -> Result<Vec<DailyTemp>> {
        let record = self
            .records
            .get(city_id)
            .ok_or_else(|| RankError::source_unavailable(city_id, "no such city in dataset"))?;

        Ok(record
            .temperatures
            .iter()
            .filter(|day| self.in_window(day.date))
            .copied()
            .collect())
    }
}
