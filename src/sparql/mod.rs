//! SPARQL endpoint access
//!
//! [`SparqlEndpoint`] is the boundary every graph component talks through.
//! [`client::SparqlClient`] implements it over HTTP with a shared rate
//! limiter; tests substitute scripted endpoints.

pub mod client;
pub mod queries;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::error::QueryError;

pub use client::SparqlClient;

/// One RDF term of a result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparqlTerm {
    /// `uri`, `literal`, `typed-literal` or `bnode`
    #[serde(rename = "type", default)]
    pub kind: String,

    pub value: String,

    /// Language tag of a literal
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl SparqlTerm {
    /// IRI term
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: "uri".to_string(),
            value: value.into(),
            lang: None,
        }
    }

    /// Literal term with an optional language tag
    pub fn literal(value: impl Into<String>, lang: Option<&str>) -> Self {
        Self {
            kind: "literal".to_string(),
            value: value.into(),
            lang: lang.map(str::to_string),
        }
    }

    pub fn is_uri(&self) -> bool {
        self.kind == "uri"
    }
}

/// One result row, keyed by variable name
pub type Binding = HashMap<String, SparqlTerm>;

/// SPARQL 1.1 JSON results document
#[derive(Debug, Deserialize)]
pub struct SelectResponse {
    pub results: SelectResults,
}

#[derive(Debug, Deserialize)]
pub struct SelectResults {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// Values bound to `variable` across all rows, skipping rows that leave it unbound
pub fn column<'a>(bindings: &'a [Binding], variable: &'a str) -> impl Iterator<Item = &'a SparqlTerm> {
    bindings.iter().filter_map(move |row| row.get(variable))
}

/// A SPARQL 1.1 endpoint
#[async_trait]
pub trait SparqlEndpoint: Send + Sync {
    /// Run a tabular (SELECT) query
    async fn select(&self, query: &str) -> Result<Vec<Binding>, QueryError>;

    /// Run a graph construction (CONSTRUCT) query, returning Turtle text
    async fn construct(&self, query: &str) -> Result<String, QueryError>;
}
