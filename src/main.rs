use clap::Parser;
use tracing_subscriber::EnvFilter;

use ghstats::storage::DEFAULT_SKIP_LIST_PATH;
use ghstats::{Config, GitHubClient, Reporter, SkipList, StatsPipeline};

#[derive(Parser, Debug)]
#[command(name = "ghstats")]
#[command(version = "0.1.0")]
#[command(about = "Per-contributor GitHub activity reports over a repository set and date range")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(default_value = "config.yaml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("ghstats=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Load and validate configuration before any network call
    let config = Config::load(&args.config)?;
    let token = ghstats::config::github_token()?;

    if !config.print_to_terminal && config.output_file.is_none() {
        tracing::warn!(
            "Neither print_to_terminal nor output_file is configured; the report goes nowhere"
        );
    }

    // Initialize the client and the durable skip list
    let github = GitHubClient::new(&token)?;
    let skip_list = SkipList::load(DEFAULT_SKIP_LIST_PATH)?;
    if !skip_list.is_empty() {
        tracing::info!(
            "Loaded {} previously inaccessible repositories from {}",
            skip_list.len(),
            DEFAULT_SKIP_LIST_PATH
        );
    }

    // Fetch, aggregate, report
    let reporter = Reporter::new(&config);
    let pipeline = StatsPipeline::new(github, skip_list, config);
    let stats = pipeline.run().await?;
    reporter.generate(&stats)?;

    Ok(())
}
