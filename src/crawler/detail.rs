//! Entity detail retrieval
//!
//! Fetches the language-tagged descriptions and the two-hop ontology
//! neighborhood of one entity.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::GraphConfig;
use crate::models::EntityDetail;
use crate::ontology::Namespaces;
use crate::sparql::{column, queries, SparqlEndpoint};
use crate::utils::error::{DetailError, QueryError};

/// Builds [`EntityDetail`] records from the knowledge graph
pub struct EntityDetailFetcher {
    endpoint: Arc<dyn SparqlEndpoint>,
    ns: Namespaces,
    /// Comments must be strictly longer than this many characters
    min_comment_chars: usize,
}

impl EntityDetailFetcher {
    pub fn new(endpoint: Arc<dyn SparqlEndpoint>, ns: Namespaces, min_comment_chars: usize) -> Self {
        Self {
            endpoint,
            ns,
            min_comment_chars,
        }
    }

    pub fn from_config(endpoint: Arc<dyn SparqlEndpoint>, config: &GraphConfig) -> Self {
        Self::new(endpoint, Namespaces::from_config(config), config.min_comment_chars)
    }

    /// Fetch the detail record of one entity
    ///
    /// # Errors
    ///
    /// Every error means the entity is skipped: no usable comment, an empty
    /// neighborhood, or a failed query.
    pub async fn fetch(&self, uri: &str) -> Result<EntityDetail, DetailError> {
        let texts = self.comments(uri).await?;
        if texts.is_empty() {
            return Err(DetailError::NoUsableText {
                uri: uri.to_string(),
            });
        }

        tracing::debug!(uri, languages = texts.len(), "Found comments, fetching neighborhood");

        let rdf = self.neighborhood(uri).await?;
        if !has_statements(&rdf) {
            return Err(DetailError::EmptyNeighborhood {
                uri: uri.to_string(),
            });
        }

        Ok(EntityDetail::new(uri, texts, rdf))
    }

    /// Language-tagged comments long enough to serve as anchors, one per language
    async fn comments(&self, uri: &str) -> Result<BTreeMap<String, String>, DetailError> {
        let rows = self
            .run(uri, async {
                let query = queries::entity_comments(uri)?;
                self.endpoint.select(&query).await
            })
            .await?;

        let mut texts = BTreeMap::new();
        for term in column(&rows, "comment") {
            let Some(lang) = term.lang.as_deref().filter(|l| !l.is_empty()) else {
                continue;
            };
            if term.value.chars().count() > self.min_comment_chars {
                texts.insert(lang.to_string(), term.value.clone());
            }
        }
        Ok(texts)
    }

    async fn neighborhood(&self, uri: &str) -> Result<String, DetailError> {
        self.run(uri, async {
            let query = queries::entity_neighborhood(&self.ns, uri)?;
            self.endpoint.construct(&query).await
        })
        .await
    }

    async fn run<T>(
        &self,
        uri: &str,
        query: impl std::future::Future<Output = Result<T, QueryError>>,
    ) -> Result<T, DetailError> {
        query.await.map_err(|source| DetailError::Query {
            uri: uri.to_string(),
            source,
        })
    }
}

/// Whether a Turtle document contains anything besides directives and comments
fn has_statements(rdf: &str) -> bool {
    rdf.lines().map(str::trim).any(|line| {
        !line.is_empty()
            && !line.starts_with('#')
            && !line.starts_with("@prefix")
            && !line.starts_with("@base")
            && !line.to_ascii_uppercase().starts_with("PREFIX ")
            && !line.to_ascii_uppercase().starts_with("BASE ")
    })
}
