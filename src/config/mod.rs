pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "city-temp-rank")]
#[command(about = "Rank cities by aggregated historical temperature")]
pub struct CliConfig {
    #[arg(long, help = "JSON dataset with cities and daily temperatures")]
    pub dataset: Option<String>,

    #[arg(long, value_delimiter = ',', help = "City ids to rank (default: all)")]
    pub cities: Vec<String>,

    #[arg(long, help = "Aggregation key: avg, median or max")]
    pub aggregation: Option<String>,

    #[arg(long, help = "Number of cities to return")]
    pub top: Option<usize>,

    #[arg(long, help = "Optional TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Only use samples from the year before this date (YYYY-MM-DD)")]
    pub as_of: Option<chrono::NaiveDate>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}
