use anyhow::{anyhow, Context};
use city_temp_rank::utils::error::ErrorSeverity;
use city_temp_rank::utils::{logger, validation::Validate};
use city_temp_rank::{
    AggregationRegistry, CliConfig, InMemorySource, RankError, RankingConfig,
    TopCitiesByAggregation,
};
use clap::Parser;
use std::collections::HashSet;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose, cli.json_logs);

    tracing::info!("Starting city-temp-rank");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(cli).await {
        tracing::error!("❌ Ranking failed: {:#}", e);
        eprintln!("❌ {:#}", e);

        let exit_code = match e.downcast_ref::<RankError>().map(RankError::severity) {
            Some(ErrorSeverity::Low) | Some(ErrorSeverity::Medium) => 2,
            Some(ErrorSeverity::Critical) => 3,
            Some(ErrorSeverity::High) | None => 1,
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: CliConfig) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => RankingConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => RankingConfig::default(),
    };
    config.validate()?;

    let dataset = cli
        .dataset
        .as_deref()
        .or_else(|| config.dataset())
        .ok_or_else(|| anyhow!("no dataset given; pass --dataset or set source.dataset"))?;

    let mut source = InMemorySource::from_json_file(dataset)
        .await
        .with_context(|| format!("failed to load dataset from {}", dataset))?;
    if let Some(as_of) = cli.as_of {
        source = source.with_as_of(as_of);
    }

    let city_ids: HashSet<String> = if cli.cities.is_empty() {
        source.city_ids()
    } else {
        cli.cities.iter().cloned().collect()
    };
    let aggregation = cli
        .aggregation
        .unwrap_or_else(|| config.ranking.default_aggregation.clone());
    let top = cli.top.unwrap_or(config.ranking.top_n);

    let ranker = TopCitiesByAggregation::new(source, AggregationRegistry::with_defaults())
        .with_settings(&config);
    let report = ranker.rank_with_report(&city_ids, &aggregation, top).await?;

    for (i, entry) in report.entries.iter().enumerate() {
        println!(
            "{}. {}: {:.2} {}",
            i + 1,
            entry.city.name,
            entry.score,
            aggregation
        );
    }

    if report.is_partial() {
        tracing::warn!(
            "⚠️ {} qualifying cities were left out of the ranking",
            report.skipped.len()
        );
    }

    Ok(())
}
