use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use quagga::config::Config;
use quagga::crawler::CategoryCrawler;
use quagga::models::EntityList;
use quagga::ontology::Namespaces;
use quagga::sparql::SparqlClient;

use super::shutdown_on_ctrl_c;

pub async fn discover(config: Config, category: String, depth: u32, output: PathBuf) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    println!("Discovering entities");
    println!("====================");
    println!("Category: {category}");
    println!("Depth limit: {depth}");
    println!("Endpoint: {}", config.sparql.endpoint);

    let client =
        Arc::new(SparqlClient::from_config(&config.sparql).context("Failed to create SPARQL client")?);

    let mut crawler = CategoryCrawler::new(client, Namespaces::from_config(&config.graph))
        .with_shutdown(shutdown_on_ctrl_c());
    let entities = crawler.discover(&category, depth).await;

    let list = EntityList::new(entities);
    list.save(&output)
        .with_context(|| format!("Failed to write entity list to {}", output.display()))?;

    println!("\nDiscovery Summary");
    println!("=================");
    println!("Discovered entities: {}", list.len());
    println!("Output file: {}", output.display());

    Ok(())
}
