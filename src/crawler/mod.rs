//! Knowledge graph crawling
//!
//! This module implements entity discovery over the category hierarchy,
//! per-entity detail retrieval, and the concurrent dataset pipeline.

pub mod detail;
pub mod pipeline;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

use crate::ontology::Namespaces;
use crate::sparql::{column, queries, SparqlEndpoint};

pub use detail::EntityDetailFetcher;
pub use pipeline::{DatasetPipeline, PipelineBuilder, PipelineOutput, StatsSnapshot};

/// Depth-bounded entity discovery over a category graph
///
/// The crawler owns the set of entities seen so far. Every URI is reported at
/// most once per crawler, even when several categories share it.
pub struct CategoryCrawler {
    endpoint: Arc<dyn SparqlEndpoint>,
    ns: Namespaces,
    seen: HashSet<String>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl CategoryCrawler {
    /// Create a crawler with an empty seen-set
    pub fn new(endpoint: Arc<dyn SparqlEndpoint>, ns: Namespaces) -> Self {
        Self {
            endpoint,
            ns,
            seen: HashSet::new(),
            shutdown: None,
        }
    }

    /// Stop expanding categories once the channel reads `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Every entity reported so far
    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    /// Discover entities under `category` and its sub-categories
    ///
    /// Direct members are at depth 0; sub-categories are only expanded while
    /// the current depth is below `depth_limit`. Returns the entities first
    /// seen during this call. A failed query empties that node only.
    pub async fn discover(&mut self, category: &str, depth_limit: u32) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut stack = vec![(category.to_string(), 0u32)];
        // Shallowest depth each category was expanded at
        let mut expanded: HashMap<String, u32> = HashMap::new();

        tracing::info!(category, depth_limit, "Starting category discovery");

        while let Some((current, depth)) = stack.pop() {
            if self.is_cancelled() {
                tracing::info!(pending = stack.len() + 1, "Discovery cancelled");
                break;
            }

            let key = self.ns.category_iri(&current);
            if expanded.get(&key).is_some_and(|&d| d <= depth) {
                tracing::debug!(category = %current, depth, "Category already expanded");
                continue;
            }
            expanded.insert(key, depth);

            // A failed member query ends this node; its sub-categories are not expanded
            let Some(members) = self.members(&current).await else {
                continue;
            };
            let before = found.len();
            for uri in members {
                if self.seen.insert(uri.clone()) {
                    found.insert(uri);
                }
            }
            tracing::debug!(
                category = %current,
                depth,
                new_entities = found.len() - before,
                "Expanded category"
            );

            if depth < depth_limit {
                let children = self.subcategories(&current).await;
                // Reversed so the first child is expanded first
                for child in children.into_iter().rev() {
                    stack.push((child, depth + 1));
                }
            }
        }

        tracing::info!(category, discovered = found.len(), "Category discovery finished");
        found
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    async fn members(&self, category: &str) -> Option<Vec<String>> {
        let query = queries::category_members(&self.ns, category);
        match self.endpoint.select(&query).await {
            Ok(rows) => Some(column(&rows, "resource").map(|t| t.value.clone()).collect()),
            Err(e) => {
                tracing::warn!(category, error = %e, "Member query failed, skipping node");
                None
            }
        }
    }

    async fn subcategories(&self, category: &str) -> Vec<String> {
        let query = queries::subcategories(&self.ns, category);
        match self.endpoint.select(&query).await {
            Ok(rows) => column(&rows, "subcategory")
                .filter_map(|t| self.ns.category_label(&t.value))
                .collect(),
            Err(e) => {
                tracing::warn!(category, error = %e, "Sub-category query failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::{Binding, SparqlTerm};
    use crate::utils::error::QueryError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Category graph with a cycle: A -> B -> A
    struct CyclicGraph {
        queries: Mutex<Vec<String>>,
    }

    fn row(var: &str, value: &str) -> Binding {
        Binding::from([(var.to_string(), SparqlTerm::uri(value))])
    }

    #[async_trait]
    impl SparqlEndpoint for CyclicGraph {
        async fn select(&self, query: &str) -> Result<Vec<Binding>, QueryError> {
            self.queries.lock().unwrap().push(query.to_string());
            let cat = "http://dbpedia.org/resource/Category:";
            if query.contains("skos:broader") {
                let child = if query.contains(&format!("<{cat}A>")) { "B" } else { "A" };
                return Ok(vec![row("subcategory", &format!("{cat}{child}"))]);
            }
            Ok(vec![row("resource", "http://dbpedia.org/resource/Shared")])
        }

        async fn construct(&self, _query: &str) -> Result<String, QueryError> {
            Err(QueryError::Status(500))
        }
    }

    #[tokio::test]
    async fn test_cycle_is_bounded_by_depth() {
        let graph = Arc::new(CyclicGraph {
            queries: Mutex::new(Vec::new()),
        });
        let mut crawler = CategoryCrawler::new(graph.clone(), Namespaces::default());

        let found = crawler.discover("A", 5).await;

        assert_eq!(found.len(), 1);
        // A and B are each expanded once; the cycle back to A is cut
        let member_queries = graph
            .queries
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.contains("dct:subject"))
            .count();
        assert_eq!(member_queries, 2);
    }

    #[tokio::test]
    async fn test_cancelled_crawl_issues_no_queries() {
        let graph = Arc::new(CyclicGraph {
            queries: Mutex::new(Vec::new()),
        });
        let (tx, rx) = watch::channel(true);
        let mut crawler =
            CategoryCrawler::new(graph.clone(), Namespaces::default()).with_shutdown(rx);

        assert!(crawler.discover("A", 2).await.is_empty());
        assert!(graph.queries.lock().unwrap().is_empty());
        drop(tx);
    }

    #[tokio::test]
    async fn test_seen_set_spans_calls() {
        let graph = Arc::new(CyclicGraph {
            queries: Mutex::new(Vec::new()),
        });
        let mut crawler = CategoryCrawler::new(graph, Namespaces::default());

        assert_eq!(crawler.discover("A", 0).await.len(), 1);
        assert!(crawler.discover("B", 0).await.is_empty());
        assert_eq!(crawler.seen().len(), 1);
    }
}
