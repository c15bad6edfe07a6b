use crate::core::aggregation::{AggregationRegistry, AggregationStrategy};
use crate::core::top_n::TopNSelector;
use crate::domain::model::{City, RankedEntry, RankingReport, SkipReason, SkippedCity, MIN_POPULATION};
use crate::domain::ports::{CityTemperatureSource, RankingSettings};
use crate::utils::error::{RankError, Result};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Ranks cities by an aggregated temperature score.
///
/// Every call owns a fresh [`TopNSelector`]; nothing is shared between calls,
/// so concurrent `rank` invocations on the same instance are independent.
pub struct TopCitiesByAggregation<S: CityTemperatureSource> {
    source: S,
    registry: AggregationRegistry,
    min_population: u64,
    concurrency: usize,
}

impl<S: CityTemperatureSource> TopCitiesByAggregation<S> {
    pub fn new(source: S, registry: AggregationRegistry) -> Self {
        Self {
            source,
            registry,
            min_population: MIN_POPULATION,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_settings<C: RankingSettings>(mut self, settings: &C) -> Self {
        self.min_population = settings.min_population();
        self.concurrency = settings.concurrency().max(1);
        self
    }

    pub fn registry(&self) -> &AggregationRegistry {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn rank(
        &self,
        city_ids: &HashSet<String>,
        aggregation_type: &str,
        n: usize,
    ) -> Result<Vec<RankedEntry>> {
        Ok(self
            .rank_with_report(city_ids, aggregation_type, n)
            .await?
            .entries)
    }

    /// Like [`rank`](Self::rank), but also reports the qualifying cities that
    /// were dropped because their data was missing or unavailable.
    ///
    /// Only an unknown `aggregation_type` or a failed bulk city lookup abort the
    /// call; per-city failures are recorded in [`RankingReport::skipped`].
    pub async fn rank_with_report(
        &self,
        city_ids: &HashSet<String>,
        aggregation_type: &str,
        n: usize,
    ) -> Result<RankingReport> {
        let strategy = self.registry.resolve(aggregation_type)?;

        if n == 0 {
            tracing::debug!("Requested top 0 cities, skipping data fetch");
            return Ok(RankingReport::default());
        }

        let mut cities = self.source.fetch_cities(city_ids).await?;
        cities.sort_by(|a, b| a.id.cmp(&b.id));
        let candidates = cities.len();

        let qualifying: Vec<City> = cities
            .into_iter()
            .filter(|city| {
                let keep = city.qualifies(self.min_population);
                if !keep {
                    tracing::debug!(
                        "Excluding {} (population {} <= {})",
                        city.id,
                        city.population,
                        self.min_population
                    );
                }
                keep
            })
            .collect();

        tracing::info!(
            "Ranking {} of {} cities by {} (top {}, concurrency {})",
            qualifying.len(),
            candidates,
            aggregation_type,
            n,
            self.concurrency
        );

        let mut report = RankingReport {
            candidates,
            qualifying: qualifying.len(),
            ..Default::default()
        };
        let mut selector = TopNSelector::new(n);
        let strategy = strategy.as_ref();

        let mut scored = stream::iter(qualifying)
            .map(|city| self.score_city(city, strategy))
            .buffered(self.concurrency);

        while let Some((city, outcome)) = scored.next().await {
            match outcome {
                Ok(score) if !score.is_finite() => {
                    tracing::warn!("Skipping {}: aggregate {} is not finite", city.id, score);
                    report.skipped.push(SkippedCity {
                        city_id: city.id,
                        reason: SkipReason::NonFiniteScore,
                    });
                }
                Ok(score) => {
                    tracing::debug!("{} scored {:.2}", city.id, score);
                    selector.offer(score, city);
                }
                Err(RankError::EmptyInput) => {
                    tracing::warn!("Skipping {}: no temperature data", city.id);
                    report.skipped.push(SkippedCity {
                        city_id: city.id,
                        reason: SkipReason::EmptySeries,
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", city.id, e);
                    report.skipped.push(SkippedCity {
                        city_id: city.id,
                        reason: SkipReason::SourceUnavailable(e.to_string()),
                    });
                }
            }
        }

        report.entries = selector.finalize();
        tracing::info!(
            "Ranked {} cities ({} skipped)",
            report.entries.len(),
            report.skipped.len()
        );

        Ok(report)
    }

    async fn score_city(
        &self,
        city: City,
        strategy: &dyn AggregationStrategy,
    ) -> (City, Result<f64>) {
        let outcome = match self.source.fetch_yearly_temperatures(&city.id).await {
            Ok(series) => {
                let samples: Vec<f64> = series.iter().map(|day| day.temperature).collect();
                strategy.calculate(&samples)
            }
            Err(e) if e.is_city_level() => Err(e),
            Err(e) => Err(RankError::source_unavailable(&city.id, e.to_string())),
        };
        (city, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DailyTemp;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockSource {
        cities: Vec<City>,
        temperatures: HashMap<String, Vec<f64>>,
        failing: HashSet<String>,
        broken: HashSet<String>,
        city_calls: AtomicUsize,
        temperature_calls: AtomicUsize,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                cities: Vec::new(),
                temperatures: HashMap::new(),
                failing: HashSet::new(),
                broken: HashSet::new(),
                city_calls: AtomicUsize::new(0),
                temperature_calls: AtomicUsize::new(0),
            }
        }

        fn with_city(mut self, id: &str, population: u64, temps: &[f64]) -> Self {
            self.cities.push(City::new(id, format!("City {}", id), population));
            self.temperatures.insert(id.to_string(), temps.to_vec());
            self
        }

        fn failing_for(mut self, id: &str) -> Self {
            self.failing.insert(id.to_string());
            self
        }

        fn broken_for(mut self, id: &str) -> Self {
            self.broken.insert(id.to_string());
            self
        }

        fn fetch_count(&self) -> usize {
            self.city_calls.load(Ordering::SeqCst) + self.temperature_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CityTemperatureSource for MockSource {
        async fn fetch_cities(&self, ids: &HashSet<String>) -> Result<Vec<City>> {
            self.city_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .cities
                .iter()
                .filter(|c| ids.contains(&c.id))
                .cloned()
                .collect())
        }

        async fn fetch_yearly_temperatures(&self, city_id: &str) -> Result<Vec<DailyTemp>> {
            self.temperature_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(city_id) {
                return Err(RankError::source_unavailable(city_id, "connection reset"));
            }
            if self.broken.contains(city_id) {
                return Err(RankError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk gone",
                )));
            }
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            Ok(self
                .temperatures
                .get(city_id)
                .map(|temps| {
                    temps
                        .iter()
                        .zip(start.iter_days())
                        .map(|(t, date)| DailyTemp::new(date, *t))
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    fn id_set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn scenario_source() -> MockSource {
        MockSource::new()
            .with_city("A", 100_000, &[10.0, 20.0, 30.0])
            .with_city("B", 40_000, &[100.0])
            .with_city("C", 60_000, &[5.0, 5.0, 5.0])
    }

    #[tokio::test]
    async fn test_rank_average_excludes_small_cities() {
        let ranker = TopCitiesByAggregation::new(scenario_source(), AggregationRegistry::with_defaults());

        let result = ranker.rank(&id_set(&["A", "B", "C"]), "avg", 2).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].city.id, "A");
        assert_eq!(result[0].score, 20.0);
        assert_eq!(result[1].city.id, "C");
        assert_eq!(result[1].score, 5.0);
    }

    #[tokio::test]
    async fn test_unsupported_aggregation_fetches_nothing() {
        let ranker = TopCitiesByAggregation::new(scenario_source(), AggregationRegistry::with_defaults());

        let result = ranker.rank(&id_set(&["A", "B", "C"]), "bogus", 2).await;

        assert!(matches!(result, Err(RankError::UnsupportedAggregation { .. })));
        assert_eq!(ranker.source().fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_n_returns_empty() {
        let ranker = TopCitiesByAggregation::new(scenario_source(), AggregationRegistry::with_defaults());

        let result = ranker.rank(&id_set(&["A", "B", "C"]), "max", 0).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_empty_series_and_failures_are_skipped() {
        let source = scenario_source()
            .with_city("D", 80_000, &[])
            .with_city("E", 90_000, &[50.0])
            .failing_for("E");
        let ranker = TopCitiesByAggregation::new(source, AggregationRegistry::with_defaults());

        let report = ranker
            .rank_with_report(&id_set(&["A", "B", "C", "D", "E"]), "avg", 10)
            .await
            .unwrap();

        let ranked: Vec<&str> = report.entries.iter().map(|e| e.city.id.as_str()).collect();
        assert_eq!(ranked, vec!["A", "C"]);
        assert_eq!(report.candidates, 5);
        assert_eq!(report.qualifying, 4);
        assert!(report.is_partial());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].city_id, "D");
        assert_eq!(report.skipped[0].reason, SkipReason::EmptySeries);
        assert_eq!(report.skipped[1].city_id, "E");
        assert!(matches!(report.skipped[1].reason, SkipReason::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_population_threshold_is_exclusive() {
        let source = MockSource::new()
            .with_city("edge", MIN_POPULATION, &[99.0])
            .with_city("over", MIN_POPULATION + 1, &[1.0]);
        let ranker = TopCitiesByAggregation::new(source, AggregationRegistry::with_defaults());

        let result = ranker.rank(&id_set(&["edge", "over"]), "max", 5).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].city.id, "over");
    }

    #[tokio::test]
    async fn test_unknown_ids_are_ignored() {
        let ranker = TopCitiesByAggregation::new(scenario_source(), AggregationRegistry::with_defaults());

        let result = ranker.rank(&id_set(&["A", "ZZZ"]), "median", 3).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].score, 20.0);
    }

    /// Yields NaN or infinity for series starting with a marker value.
    struct Unstable;

    impl AggregationStrategy for Unstable {
        fn key(&self) -> &str {
            "unstable"
        }

        fn calculate(&self, samples: &[f64]) -> Result<f64> {
            match samples.first() {
                None => Err(RankError::EmptyInput),
                Some(&v) if v < -1000.0 => Ok(f64::NAN),
                Some(&v) if v > 1000.0 => Ok(f64::INFINITY),
                Some(&v) => Ok(v),
            }
        }
    }

    #[tokio::test]
    async fn test_non_finite_scores_are_skipped() {
        let source = scenario_source()
            .with_city("N", 70_000, &[-9999.0])
            .with_city("P", 70_000, &[9999.0]);
        let mut registry = AggregationRegistry::with_defaults();
        registry.register(Unstable);
        let ranker = TopCitiesByAggregation::new(source, registry);

        let report = ranker
            .rank_with_report(&id_set(&["A", "C", "N", "P"]), "unstable", 10)
            .await
            .unwrap();

        let ranked: Vec<&str> = report.entries.iter().map(|e| e.city.id.as_str()).collect();
        assert_eq!(ranked, vec!["A", "C"]);
        assert_eq!(report.entries[0].score, 10.0);
        assert_eq!(
            report.skipped,
            vec![
                SkippedCity {
                    city_id: "N".to_string(),
                    reason: SkipReason::NonFiniteScore,
                },
                SkippedCity {
                    city_id: "P".to_string(),
                    reason: SkipReason::NonFiniteScore,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_huge_n_returns_all_qualifying() {
        let ranker = TopCitiesByAggregation::new(scenario_source(), AggregationRegistry::with_defaults());

        let result = ranker
            .rank(&id_set(&["A", "B", "C"]), "max", usize::MAX)
            .await
            .unwrap();

        let ranked: Vec<(&str, f64)> = result.iter().map(|e| (e.city.id.as_str(), e.score)).collect();
        assert_eq!(ranked, vec![("A", 30.0), ("C", 5.0)]);
    }

    #[tokio::test]
    async fn test_signed_zero_scores_tie_by_id() {
        let source = MockSource::new()
            .with_city("B", 60_000, &[0.0])
            .with_city("A", 60_000, &[-0.0]);
        let ranker = TopCitiesByAggregation::new(source, AggregationRegistry::with_defaults());

        let result = ranker.rank(&id_set(&["A", "B"]), "max", 2).await.unwrap();

        let ranked: Vec<&str> = result.iter().map(|e| e.city.id.as_str()).collect();
        assert_eq!(ranked, vec!["A", "B"]);
        assert!(result.iter().all(|e| e.score == 0.0));
    }

    #[tokio::test]
    async fn test_other_source_errors_count_as_unavailable() {
        let source = scenario_source()
            .with_city("X", 70_000, &[42.0])
            .broken_for("X");
        let ranker = TopCitiesByAggregation::new(source, AggregationRegistry::with_defaults());

        let report = ranker
            .rank_with_report(&id_set(&["A", "X"]), "avg", 5)
            .await
            .unwrap();

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].city_id, "X");
        match &report.skipped[0].reason {
            SkipReason::SourceUnavailable(msg) => {
                assert!(msg.contains("city 'X'"));
                assert!(msg.contains("disk gone"));
            }
            other => panic!("unexpected reason: {:?}", other),
        }
    }
}
