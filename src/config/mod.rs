//! Configuration management for quagga
//!
//! This module handles loading and validating configuration from environment variables,
//! TOML files, and command-line overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// SPARQL endpoint configuration
    pub sparql: SparqlConfig,

    /// Knowledge graph namespaces and sampling limits
    pub graph: GraphConfig,

    /// Dataset generation pipeline configuration
    pub pipeline: PipelineSettings,

    /// Destination table configuration
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// SPARQL endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SparqlConfig {
    /// Endpoint URL
    pub endpoint: String,

    /// User agent string sent with every query
    pub user_agent: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Rate limit (requests per second, shared by all workers)
    pub rate_limit: f64,

    /// Retry attempts for transient failures
    pub max_retries: u32,
}

/// Knowledge graph namespaces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Namespace of entity resources
    pub resource_namespace: String,

    /// Namespace of ontology classes and predicates
    pub ontology_namespace: String,

    /// Namespace of category resources
    pub category_namespace: String,

    /// Compact prefix bound to the resource namespace
    pub resource_prefix: String,

    /// Compact prefix bound to the ontology namespace
    pub ontology_prefix: String,

    /// Comments must be strictly longer than this many characters
    pub min_comment_chars: usize,

    /// Maximum replacement candidates fetched per type
    pub replacement_limit: usize,
}

/// Dataset generation pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Number of entity workers
    pub workers: usize,

    /// Job channel buffer size
    pub channel_buffer_size: usize,

    /// Language whose comment seeds the association texts
    pub primary_language: String,

    /// Generate association texts from the primary-language comment
    pub generate_associations: bool,

    /// Seed for reproducible sampling (each worker uses seed + worker id)
    pub seed: Option<u64>,
}

/// Destination table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Warehouse directory backing the table catalog
    pub warehouse: PathBuf,

    /// Namespace-qualified destination table name
    pub table: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("https://dbpedia.org/sparql"),
            user_agent: default_user_agent(),
            request_timeout_secs: 30,
            rate_limit: 10.0,
            max_retries: 2,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            resource_namespace: String::from("http://dbpedia.org/resource/"),
            ontology_namespace: String::from("http://dbpedia.org/ontology/"),
            category_namespace: String::from("http://dbpedia.org/resource/Category:"),
            resource_prefix: String::from("dbr"),
            ontology_prefix: String::from("dbo"),
            min_comment_chars: 150,
            replacement_limit: 10,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            channel_buffer_size: 256,
            primary_language: String::from("en"),
            generate_associations: true,
            seed: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            warehouse: PathBuf::from("./warehouse"),
            table: String::from("dbpedia.physics_triplets_multilingual"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl SparqlConfig {
    /// Bounded wait for one request, retries excluded
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_user_agent() -> String {
    format!("quagga/{} (knowledge-graph dataset builder)", env!("CARGO_PKG_VERSION"))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let endpoint =
            std::env::var("QUAGGA_SPARQL_ENDPOINT").unwrap_or(defaults.sparql.endpoint);

        let user_agent =
            std::env::var("QUAGGA_USER_AGENT").unwrap_or(defaults.sparql.user_agent);

        let request_timeout_secs = env_parse("QUAGGA_REQUEST_TIMEOUT")
            .unwrap_or(defaults.sparql.request_timeout_secs);

        let rate_limit = env_parse("QUAGGA_RATE_LIMIT").unwrap_or(defaults.sparql.rate_limit);

        let max_retries = env_parse("QUAGGA_MAX_RETRIES").unwrap_or(defaults.sparql.max_retries);

        let workers = env_parse("QUAGGA_WORKERS").unwrap_or(defaults.pipeline.workers);

        let primary_language = std::env::var("QUAGGA_PRIMARY_LANGUAGE")
            .unwrap_or(defaults.pipeline.primary_language);

        let seed = env_parse("QUAGGA_SEED");

        let warehouse = std::env::var("QUAGGA_WAREHOUSE")
            .map(PathBuf::from)
            .unwrap_or(defaults.output.warehouse);

        let table = std::env::var("QUAGGA_TABLE").unwrap_or(defaults.output.table);

        let log_level = std::env::var("QUAGGA_LOG_LEVEL").unwrap_or(defaults.logging.level);

        let log_format = std::env::var("QUAGGA_LOG_FORMAT").unwrap_or(defaults.logging.format);

        Ok(Self {
            sparql: SparqlConfig {
                endpoint,
                user_agent,
                request_timeout_secs,
                rate_limit,
                max_retries,
            },
            graph: defaults.graph,
            pipeline: PipelineSettings {
                workers,
                primary_language,
                seed,
                ..defaults.pipeline
            },
            output: OutputConfig { warehouse, table },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.sparql.endpoint)
            .with_context(|| format!("Invalid SPARQL endpoint: {}", self.sparql.endpoint))?;

        if self.sparql.rate_limit <= 0.0 {
            anyhow::bail!("rate_limit must be positive");
        }

        if self.pipeline.workers == 0 {
            anyhow::bail!("workers must be greater than 0");
        }

        if self.pipeline.channel_buffer_size == 0 {
            anyhow::bail!("channel_buffer_size must be greater than 0");
        }

        if self.graph.replacement_limit == 0 {
            anyhow::bail!("replacement_limit must be greater than 0");
        }

        let namespaces = [
            &self.graph.resource_namespace,
            &self.graph.ontology_namespace,
            &self.graph.category_namespace,
            &self.graph.resource_prefix,
            &self.graph.ontology_prefix,
        ];
        if namespaces.iter().any(|ns| ns.trim().is_empty()) {
            anyhow::bail!("graph namespaces and prefixes must not be empty");
        }

        if self.output.table.trim().is_empty() {
            anyhow::bail!("output table must not be empty");
        }

        Ok(())
    }

}
