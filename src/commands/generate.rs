use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use quagga::config::Config;
use quagga::crawler::{EntityDetailFetcher, PipelineBuilder};
use quagga::models::EntityList;
use quagga::negative::NegativeSampler;
use quagga::sparql::{SparqlClient, SparqlEndpoint};
use quagga::storage::{DatasetMaterializer, SqliteCatalog, TableIdentifier, WriteOutcome};

use super::shutdown_on_ctrl_c;

pub async fn generate(config: Config, input: PathBuf) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let destination =
        TableIdentifier::parse(&config.output.table).context("Invalid destination table")?;

    if !input.exists() {
        anyhow::bail!(
            "Input file not found: {}. Run `quagga discover` first.",
            input.display()
        );
    }
    let entities = EntityList::load(&input)
        .with_context(|| format!("Failed to read entity list from {}", input.display()))?;

    println!("Generating triplet dataset");
    println!("==========================");
    println!("Loaded {} entities from {}", entities.len(), input.display());
    println!("Workers: {}", config.pipeline.workers);

    let endpoint: Arc<dyn SparqlEndpoint> =
        Arc::new(SparqlClient::from_config(&config.sparql).context("Failed to create SPARQL client")?);

    let pipeline = PipelineBuilder::new()
        .settings(config.pipeline.clone())
        .shutdown(shutdown_on_ctrl_c())
        .build(
            EntityDetailFetcher::from_config(Arc::clone(&endpoint), &config.graph),
            NegativeSampler::from_config(endpoint, &config.graph),
        );

    let output = pipeline.run(&entities).await;

    // Records generated before an interrupt are still written
    let catalog = SqliteCatalog::open(&config.output.warehouse).with_context(|| {
        format!("Failed to open warehouse {}", config.output.warehouse.display())
    })?;
    let materializer = DatasetMaterializer::new(catalog);
    let outcome = materializer
        .write(&output.records, &destination)
        .with_context(|| format!("Failed to write table {destination}"))?;

    let stats = &output.stats;
    println!("\nGeneration Summary");
    println!("==================");
    println!("Discovered entities: {}", stats.total_jobs);
    println!("Processed entities: {}", stats.processed_count);
    println!("Skipped entities: {}", stats.skipped_count);
    if stats.unstarted() > 0 {
        println!("Not started (interrupted): {}", stats.unstarted());
    }
    println!("Generated records: {}", output.records.len());
    match outcome {
        WriteOutcome::Written { rows } => {
            println!("Table: {destination} ({rows} rows)");
            println!("Warehouse: {}", config.output.warehouse.display());
        }
        WriteOutcome::Empty => println!("Nothing written: no records were generated"),
    }

    Ok(())
}
