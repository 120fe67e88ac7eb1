//! Alignment of neighborhood triples with entity mentions in text

use crate::models::CandidateTriple;
use crate::ontology::{resource_links, surface_form, Namespaces};

/// Finds the neighborhood objects a text actually talks about
#[derive(Debug, Clone, Default)]
pub struct MentionAligner {
    ns: Namespaces,
}

impl MentionAligner {
    pub fn new(ns: Namespaces) -> Self {
        Self { ns }
    }

    /// Candidates whose object surface form occurs in `anchor_text`, ignoring case
    ///
    /// Order follows the neighborhood document.
    pub fn find_mentioned_candidates(&self, anchor_text: &str, rdf: &str) -> Vec<CandidateTriple> {
        let haystack = anchor_text.to_lowercase();

        resource_links(rdf, &self.ns)
            .into_iter()
            .filter_map(|link| {
                let surface = surface_form(self.ns.resource_local(&link.object)?);
                let mentioned =
                    !surface.trim().is_empty() && haystack.contains(&surface.to_lowercase());
                mentioned.then(|| CandidateTriple {
                    predicate: link.predicate,
                    object: link.object,
                    surface_form: surface,
                })
            })
            .collect()
    }
}
