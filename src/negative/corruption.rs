//! Type-preserving entity substitution
//!
//! A negative sample swaps one mentioned object for another resource of the
//! same ontology class, in both the Turtle neighborhood and the anchor text.
//! Candidates are tried in order; the first one that rewrites both sides wins.

use rand::seq::SliceRandom;
use rand::Rng;
use regex::{NoExpand, RegexBuilder};
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::GraphConfig;
use crate::models::{CandidateTriple, NegativeSample};
use crate::ontology::{replace_token, surface_form, Namespaces};
use crate::sparql::{column, queries, SparqlEndpoint};

pub struct CorruptionEngine {
    endpoint: Arc<dyn SparqlEndpoint>,
    ns: Namespaces,
    replacement_limit: usize,
}

impl CorruptionEngine {
    pub fn new(endpoint: Arc<dyn SparqlEndpoint>, ns: Namespaces, replacement_limit: usize) -> Self {
        Self {
            endpoint,
            ns,
            replacement_limit,
        }
    }

    pub fn from_config(endpoint: Arc<dyn SparqlEndpoint>, config: &GraphConfig) -> Self {
        Self::new(endpoint, Namespaces::from_config(config), config.replacement_limit)
    }

    /// Produce a negative sample from the first candidate that can be corrupted
    ///
    /// Type and replacement are drawn from `rng`. Returns `None` once every
    /// candidate has been tried without success.
    pub async fn corrupt<R: Rng + Send + ?Sized>(
        &self,
        anchor_text: &str,
        rdf: &str,
        candidates: &[CandidateTriple],
        rng: &mut R,
    ) -> Option<NegativeSample> {
        for candidate in candidates {
            if let Some(sample) = self.try_candidate(anchor_text, rdf, candidate, rng).await {
                tracing::debug!(
                    object = %candidate.object,
                    surface_form = %candidate.surface_form,
                    "Negative sample generated"
                );
                return Some(sample);
            }
        }

        tracing::debug!(candidates = candidates.len(), "All candidates exhausted");
        None
    }

    async fn try_candidate<R: Rng + Send + ?Sized>(
        &self,
        anchor_text: &str,
        rdf: &str,
        candidate: &CandidateTriple,
        rng: &mut R,
    ) -> Option<NegativeSample> {
        let types = self.ontology_types(&candidate.object).await;
        let Some(type_iri) = types.choose(rng) else {
            tracing::debug!(object = %candidate.object, "No ontology types");
            return None;
        };

        let pool = self.replacement_pool(type_iri, candidate).await;
        let Some(replacement) = pool.choose(rng) else {
            tracing::debug!(object = %candidate.object, type_iri = %type_iri, "No replacement entities");
            return None;
        };
        let replacement_surface = surface_form(self.ns.resource_local(replacement)?);

        let Some(negative_rdf) = self.rewrite_rdf(rdf, &candidate.object, replacement) else {
            tracing::debug!(object = %candidate.object, "Object token not found in RDF");
            return None;
        };

        let Some(negative_text) =
            rewrite_text(anchor_text, &candidate.surface_form, &replacement_surface)
        else {
            tracing::debug!(
                surface_form = %candidate.surface_form,
                "Text replacement failed, trying next candidate"
            );
            return None;
        };

        Some(NegativeSample {
            text: negative_text,
            rdf: negative_rdf,
        })
    }

    /// Ontology classes of a resource, deduplicated in result order
    async fn ontology_types(&self, object: &str) -> Vec<String> {
        let rows = match queries::resource_types(object) {
            Ok(query) => self.endpoint.select(&query).await,
            Err(e) => Err(e),
        };

        match rows {
            Ok(rows) => {
                let mut seen = HashSet::new();
                column(&rows, "type")
                    .filter(|t| t.is_uri() && self.ns.is_ontology(&t.value))
                    .map(|t| t.value.clone())
                    .filter(|v| seen.insert(v.clone()))
                    .collect()
            }
            Err(e) => {
                tracing::debug!(object, error = %e, "Type query failed");
                Vec::new()
            }
        }
    }

    /// Other resources of `type_iri` whose surface form differs from the candidate's
    async fn replacement_pool(&self, type_iri: &str, candidate: &CandidateTriple) -> Vec<String> {
        let rows = match queries::replacements(
            &self.ns,
            type_iri,
            &candidate.object,
            self.replacement_limit,
        ) {
            Ok(query) => self.endpoint.select(&query).await,
            Err(e) => Err(e),
        };

        let original = candidate.surface_form.to_lowercase();
        match rows {
            Ok(rows) => {
                let mut seen = HashSet::new();
                column(&rows, "replacement")
                    .filter(|t| t.is_uri() && t.value != candidate.object)
                    .filter(|t| {
                        self.ns
                            .resource_local(&t.value)
                            .is_some_and(|local| surface_form(local).to_lowercase() != original)
                    })
                    .map(|t| t.value.clone())
                    .filter(|v| seen.insert(v.clone()))
                    .collect()
            }
            Err(e) => {
                tracing::debug!(type_iri, error = %e, "Replacement query failed");
                Vec::new()
            }
        }
    }

    /// Replace every spelling of `original` with the matching spelling of `replacement`
    ///
    /// Returns `None` when the document does not contain the original at all.
    fn rewrite_rdf(&self, rdf: &str, original: &str, replacement: &str) -> Option<String> {
        let mut document = rdf.to_string();
        let mut total = 0;

        for spelling in self.ns.resource_spellings(original) {
            let target = if spelling.starts_with('<') {
                format!("<{replacement}>")
            } else {
                self.ns.resource_token(replacement)
            };
            let (rewritten, count) = replace_token(&document, &spelling, &target);
            document = rewritten;
            total += count;
        }

        (total > 0).then_some(document)
    }
}

/// Whole-word, case-insensitive substitution of `original` in `text`
///
/// Returns `None` when no occurrence was replaced.
fn rewrite_text(text: &str, original: &str, replacement: &str) -> Option<String> {
    let pattern = format!(r"\b{}\b", regex::escape(original));
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()?;

    if !re.is_match(text) {
        return None;
    }
    let rewritten = re.replace_all(text, NoExpand(replacement)).into_owned();
    (rewritten != text).then_some(rewritten)
}
