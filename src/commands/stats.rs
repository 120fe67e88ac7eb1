use anyhow::{Context, Result};

use quagga::config::Config;
use quagga::storage::{SqliteCatalog, TableCatalog, TableIdentifier};

pub fn stats(config: Config) -> Result<()> {
    let table = TableIdentifier::parse(&config.output.table).context("Invalid table name")?;
    let catalog = SqliteCatalog::open(&config.output.warehouse).with_context(|| {
        format!("Failed to open warehouse {}", config.output.warehouse.display())
    })?;

    println!("Dataset Stats");
    println!("=============");
    println!("Warehouse: {}", config.output.warehouse.display());

    if !catalog.table_exists(&table)? {
        println!("Table {table} does not exist");
        return Ok(());
    }

    let rows = catalog
        .row_count(&table)
        .with_context(|| format!("Failed to count rows of {table}"))?;
    println!("Table: {table}");
    println!("Rows: {rows}");

    Ok(())
}
