use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use open_data_scraper::apis::create_source;
use open_data_scraper::config::Config;
use open_data_scraper::constants::{self, GOVT_ARCHITECTURE_SOURCE};
use open_data_scraper::infra::http_client::ReqwestHttp;
use open_data_scraper::logging;
use open_data_scraper::pipeline::{Pipeline, PipelineResult};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "open_data_scraper")]
#[command(about = "Flatten public geo and government web data into CSV")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory CSV files are written to
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the world data-centre map
    Datacentres,
    /// Scrape Queensland disaster suburbs and layer categories
    Disasters,
    /// Scrape the Australian Government Architecture catalogue
    GovtArchitecture {
        /// Fetch linked policy, standard and design pages
        #[arg(long)]
        follow_links: bool,
        /// Domain path filters (repeatable), e.g. --domain /ai
        #[arg(long = "domain")]
        domains: Vec<String>,
    },
    /// Run every source in turn
    All,
    /// List available sources
    List,
}

async fn run_source(name: &str, config: &Config, http: &ReqwestHttp) -> Result<PipelineResult> {
    let source = create_source(name, config).with_context(|| format!("Unknown source: {name}"))?;
    let result = Pipeline::run(source.as_ref(), http, &config.output_dir)
        .await
        .with_context(|| format!("{name} pipeline failed"))?;

    info!("Pipeline finished");
    println!("\n📊 Pipeline results for {}:", result.source);
    for dataset in &result.datasets {
        println!(
            "   {}: {} rows, {} columns -> {}",
            dataset.name,
            dataset.rows,
            dataset.columns,
            dataset.output_file.display()
        );
    }
    if result.skipped > 0 {
        println!("   Skipped records: {}", result.skipped);
    }
    Ok(result)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging().context("Failed to initialise logging")?;

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    let http = ReqwestHttp::new();
    let outcome = match cli.command {
        Commands::List => {
            println!("Available sources:");
            for name in constants::get_supported_sources() {
                println!("   {name}");
            }
            Ok(())
        }
        Commands::Datacentres => run_source(constants::DATACENTRES_SOURCE, &config, &http)
            .await
            .map(|_| ()),
        Commands::Disasters => run_source(constants::DISASTERS_SOURCE, &config, &http)
            .await
            .map(|_| ()),
        Commands::GovtArchitecture {
            follow_links,
            domains,
        } => {
            config.govt.follow_links |= follow_links;
            if !domains.is_empty() {
                config.govt.domain_filters = domains;
            }
            run_source(GOVT_ARCHITECTURE_SOURCE, &config, &http)
                .await
                .map(|_| ())
        }
        Commands::All => {
            let mut outcome = Ok(());
            for name in constants::get_supported_sources() {
                if let Err(e) = run_source(name, &config, &http).await {
                    outcome = Err(e);
                    break;
                }
            }
            outcome
        }
    };

    if let Err(e) = &outcome {
        error!("{:#}", e);
    }
    outcome
}
