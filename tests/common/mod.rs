//! Common test utilities
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;

use quagga::sparql::{Binding, SparqlEndpoint, SparqlTerm};
use quagga::utils::error::QueryError;

pub const RESOURCE: &str = "http://dbpedia.org/resource/";
pub const ONTOLOGY: &str = "http://dbpedia.org/ontology/";
pub const CATEGORY: &str = "http://dbpedia.org/resource/Category:";

pub const PREFIXES: &str = "@prefix dbo: <http://dbpedia.org/ontology/> .\n\
                            @prefix dbr: <http://dbpedia.org/resource/> .\n";

/// Full resource IRI of a local name
pub fn dbr(local: &str) -> String {
    format!("{RESOURCE}{local}")
}

/// Full ontology IRI of a local name
pub fn dbo(local: &str) -> String {
    format!("{ONTOLOGY}{local}")
}

/// Rows binding `var` to each IRI
pub fn uri_rows(var: &str, values: &[String]) -> Vec<Binding> {
    values
        .iter()
        .map(|v| Binding::from([(var.to_string(), SparqlTerm::uri(v.as_str()))]))
        .collect()
}

/// Rows binding `var` to language-tagged literals
pub fn literal_rows(var: &str, values: &[(&str, &str)]) -> Vec<Binding> {
    values
        .iter()
        .map(|(text, lang)| Binding::from([(var.to_string(), SparqlTerm::literal(*text, Some(*lang)))]))
        .collect()
}

enum Reply {
    Rows(Vec<Binding>),
    Turtle(String),
    Fail(u16),
}

/// In-memory endpoint answering by query substring
///
/// Rules are checked in insertion order; the first whose needle occurs in the
/// query answers it. Unmatched queries return no rows.
#[derive(Default)]
pub struct ScriptedEndpoint {
    rules: Vec<(String, Reply)>,
    log: Mutex<Vec<String>>,
}


impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_select(mut self, needle: impl Into<String>, rows: Vec<Binding>) -> Self {
        self.rules.push((needle.into(), Reply::Rows(rows)));
        self
    }

    pub fn on_construct(mut self, needle: impl Into<String>, turtle: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Turtle(turtle.into())));
        self
    }

    pub fn fail(mut self, needle: impl Into<String>, status: u16) -> Self {
        self.rules.push((needle.into(), Reply::Fail(status)));
        self
    }

    /// Every query received so far
    pub fn queries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Number of received queries containing `needle`
    pub fn count(&self, needle: &str) -> usize {
        self.queries().iter().filter(|q| q.contains(needle)).count()
    }

    fn reply(&self, query: &str) -> Option<&Reply> {
        self.log.lock().unwrap().push(query.to_string());
        self.rules
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, reply)| reply)
    }
}

#[async_trait]
impl SparqlEndpoint for ScriptedEndpoint {
    async fn select(&self, query: &str) -> Result<Vec<Binding>, QueryError> {
        match self.reply(query) {
            Some(Reply::Rows(rows)) => Ok(rows.clone()),
            Some(Reply::Fail(status)) => Err(QueryError::Status(*status)),
            Some(Reply::Turtle(_)) => Err(QueryError::Decode("expected tabular results".into())),
            None => Ok(Vec::new()),
        }
    }

    async fn construct(&self, query: &str) -> Result<String, QueryError> {
        match self.reply(query) {
            Some(Reply::Turtle(turtle)) => Ok(turtle.clone()),
            Some(Reply::Fail(status)) => Err(QueryError::Status(*status)),
            Some(Reply::Rows(_)) => Err(QueryError::Decode("expected a graph".into())),
            None => Ok(String::new()),
        }
    }
}
