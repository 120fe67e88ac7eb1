//! quagga - Contrastive triplet dataset builder for knowledge-graph-grounded models
//!
//! Discovers entities in a public knowledge graph, pairs each entity's
//! descriptions with its RDF neighborhood, and generates positive and
//! type-consistent negative variants for contrastive training.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`sparql`] - SPARQL endpoint client and query shapes
//! - [`ontology`] - Namespaces, compact tokens and Turtle triple extraction
//! - [`crawler`] - Category discovery, entity details and the worker pipeline
//! - [`negative`] - Mention alignment and negative sample corruption
//! - [`llm`] - Text augmentation for positive and associative rows
//! - [`storage`] - Dataset materialization to a table catalog
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use quagga::crawler::CategoryCrawler;
//! use quagga::ontology::Namespaces;
//! use quagga::sparql::SparqlClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Arc::new(SparqlClient::new("https://dbpedia.org/sparql", 10.0)?);
//!     let mut crawler = CategoryCrawler::new(client, Namespaces::default());
//!     let entities = crawler.discover("Physics", 1).await;
//!     println!("Discovered {} entities", entities.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod llm;
pub mod models;
pub mod negative;
pub mod ontology;
pub mod sparql;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{CategoryCrawler, DatasetPipeline, EntityDetailFetcher};
    pub use crate::error::{Error, ErrorCategory, QuaggaErrorTrait, Result};
    pub use crate::models::{EntityDetail, EntityList, NegativeSample, TripletRecord};
    pub use crate::negative::NegativeSampler;
    pub use crate::sparql::{SparqlClient, SparqlEndpoint};
    pub use crate::storage::{DatasetMaterializer, SqliteCatalog, TableIdentifier};
}

// Direct re-exports for convenience
pub use models::{EntityDetail, EntityList, TripletRecord};
