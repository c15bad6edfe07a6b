use crate::core::ranking::DEFAULT_CONCURRENCY;
use crate::domain::model::MIN_POPULATION;
use crate::domain::ports::RankingSettings;
use crate::utils::error::{RankError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub ranking: RankingSection,
    #[serde(default)]
    pub source: SourceSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingSection {
    #[serde(default = "default_min_population")]
    pub min_population: u64,
    #[serde(default = "default_aggregation")]
    pub default_aggregation: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    pub dataset: Option<String>,
}

fn default_min_population() -> u64 {
    MIN_POPULATION
}

fn default_aggregation() -> String {
    "avg".to_string()
}

fn default_top_n() -> usize {
    10
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for RankingSection {
    fn default() -> Self {
        Self {
            min_population: default_min_population(),
            default_aggregation: default_aggregation(),
            top_n: default_top_n(),
        }
    }
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            dataset: None,
        }
    }
}

impl RankingConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML after expanding `${VAR}` references from the environment.
    /// Unset variables are left as-is.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RankError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RankError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn dataset(&self) -> Option<&str> {
        self.source.dataset.as_deref()
    }
}

impl RankingSettings for RankingConfig {
    fn min_population(&self) -> u64 {
        self.ranking.min_population
    }

    fn concurrency(&self) -> usize {
        self.source.concurrency
    }
}

impl Validate for RankingConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_positive_number("source.concurrency", self.source.concurrency, 1)?;
        validation::validate_non_empty_string(
            "ranking.default_aggregation",
            &self.ranking.default_aggregation,
        )?;
        if let Some(dataset) = &self.source.dataset {
            validation::validate_path("source.dataset", dataset)?;
        }
        Ok(())
    }
}
