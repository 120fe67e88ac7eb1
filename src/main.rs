use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quagga::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "quagga",
    version,
    about = "Contrastive triplet dataset builder over a SPARQL knowledge graph",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover entities under a category and save them as a JSON list
    Discover {
        /// Category label, e.g. "Physics"
        #[arg(long)]
        category: String,

        /// Sub-category depth limit (0 = direct members only)
        #[arg(short, long, default_value = "1")]
        depth: u32,

        /// Output JSON file
        #[arg(short, long, default_value = "discovered_entities.json")]
        output: PathBuf,
    },

    /// Generate the triplet dataset from a discovered entity list
    Generate {
        /// Input JSON file written by `discover`
        #[arg(short, long, default_value = "discovered_entities.json")]
        input: PathBuf,

        /// Destination table (namespace.table)
        #[arg(long)]
        table: Option<String>,

        /// Warehouse directory
        #[arg(long)]
        warehouse: Option<PathBuf>,

        /// Number of entity workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the row count of a materialized table
    Stats {
        /// Table (namespace.table)
        #[arg(long)]
        table: Option<String>,

        /// Warehouse directory
        #[arg(long)]
        warehouse: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env()?,
    };
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    // Initialize tracing/logging
    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    tracing::info!("quagga starting");

    match cli.command {
        Commands::Discover {
            category,
            depth,
            output,
        } => {
            tracing::info!(
                category = %category,
                depth = %depth,
                output = %output.display(),
                "Starting discover command"
            );
            commands::discover(config, category, depth, output).await?;
        }

        Commands::Generate {
            input,
            table,
            warehouse,
            workers,
            seed,
        } => {
            if let Some(table) = table {
                config.output.table = table;
            }
            if let Some(warehouse) = warehouse {
                config.output.warehouse = warehouse;
            }
            if let Some(workers) = workers {
                config.pipeline.workers = workers;
            }
            if seed.is_some() {
                config.pipeline.seed = seed;
            }

            tracing::info!(
                input = %input.display(),
                table = %config.output.table,
                workers = %config.pipeline.workers,
                "Starting generate command"
            );
            commands::generate(config, input).await?;
        }

        Commands::Stats { table, warehouse } => {
            if let Some(table) = table {
                config.output.table = table;
            }
            if let Some(warehouse) = warehouse {
                config.output.warehouse = warehouse;
            }
            commands::stats(config)?;
        }
    }

    tracing::info!("quagga completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("quagga=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("quagga={level},warn")))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
    Ok(())
}
