use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cities with a population at or below this value never qualify for a ranking.
pub const MIN_POPULATION: u64 = 50_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    pub population: u64,
}

impl City {
    pub fn new(id: impl Into<String>, name: impl Into<String>, population: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            population,
        }
    }

    pub fn qualifies(&self, min_population: u64) -> bool {
        self.population > min_population
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTemp {
    pub date: NaiveDate,
    pub temperature: f64,
}

impl DailyTemp {
    pub fn new(date: NaiveDate, temperature: f64) -> Self {
        Self { date, temperature }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub city: City,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    EmptySeries,
    SourceUnavailable(String),
    NonFiniteScore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCity {
    pub city_id: String,
    pub reason: SkipReason,
}

/// Outcome of one ranking run: the ordered entries plus every qualifying city
/// that was dropped along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankingReport {
    pub entries: Vec<RankedEntry>,
    pub skipped: Vec<SkippedCity>,
    pub candidates: usize,
    pub qualifying: usize,
}

impl RankingReport {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}
