pub mod aggregation;
pub mod ranking;
pub mod top_n;

pub use crate::domain::model::{City, DailyTemp, RankedEntry, RankingReport};
pub use crate::domain::ports::{CityTemperatureSource, RankingSettings};
pub use crate::utils::error::Result;
