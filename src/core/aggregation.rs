use crate::utils::error::{RankError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Reduces a temperature series to a single score.
///
/// Implementations must be deterministic: the same samples always yield the
/// same score.
pub trait AggregationStrategy: Send + Sync {
    /// Registry key, e.g. `"avg"`.
    fn key(&self) -> &str;

    /// Fails with [`RankError::EmptyInput`] when `samples` is empty.
    fn calculate(&self, samples: &[f64]) -> Result<f64>;
}

fn ensure_non_empty(samples: &[f64]) -> Result<()> {
    if samples.is_empty() {
        return Err(RankError::EmptyInput);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Average;

impl AggregationStrategy for Average {
    fn key(&self) -> &str {
        "avg"
    }

    fn calculate(&self, samples: &[f64]) -> Result<f64> {
        ensure_non_empty(samples)?;
        Ok(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Median;

impl AggregationStrategy for Median {
    fn key(&self) -> &str {
        "median"
    }

    fn calculate(&self, samples: &[f64]) -> Result<f64> {
        ensure_non_empty(samples)?;

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Ok(sorted[mid])
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Maximum;

impl AggregationStrategy for Maximum {
    fn key(&self) -> &str {
        "max"
    }

    fn calculate(&self, samples: &[f64]) -> Result<f64> {
        ensure_non_empty(samples)?;
        Ok(samples.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }
}

/// Lookup table from aggregation key to strategy.
///
/// New strategies are added with [`AggregationRegistry::register`]; the
/// ranking orchestrator only ever resolves by key.
#[derive(Clone, Default)]
pub struct AggregationRegistry {
    strategies: HashMap<String, Arc<dyn AggregationStrategy>>,
}

impl AggregationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `avg`, `median` and `max`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Average);
        registry.register(Median);
        registry.register(Maximum);
        registry
    }

    /// Registers `strategy` under its own key, replacing any previous entry.
    pub fn register<S: AggregationStrategy + 'static>(&mut self, strategy: S) -> &mut Self {
        self.strategies
            .insert(strategy.key().to_string(), Arc::new(strategy));
        self
    }

    pub fn resolve(&self, key: &str) -> Result<Arc<dyn AggregationStrategy>> {
        self.strategies
            .get(key)
            .cloned()
            .ok_or_else(|| RankError::UnsupportedAggregation {
                key: key.to_string(),
                available: self.keys(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.strategies.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.strategies.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for AggregationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
