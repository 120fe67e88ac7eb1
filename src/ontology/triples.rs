//! Resource-valued triples of a Turtle neighborhood
//!
//! The neighborhood is parsed with a real Turtle parser. Payloads the parser
//! rejects (truncated responses, endpoint-specific escapes) fall back to a
//! token scan for `prefix:predicate prefix:object` pairs.

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::Term;
use regex::Regex;
use std::collections::HashSet;

use super::Namespaces;

/// An ontology predicate pointing at an entity resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLink {
    /// Full predicate IRI
    pub predicate: String,

    /// Full object IRI
    pub object: String,
}

/// Extract every (ontology predicate, resource object) pair in document order
///
/// Pairs are reported once even when several subjects share them.
pub fn resource_links(rdf: &str, ns: &Namespaces) -> Vec<ResourceLink> {
    let links = match parse_links(rdf, ns) {
        Ok(links) => links,
        Err(e) => {
            tracing::debug!(error = %e, "Turtle parse failed, scanning tokens instead");
            scan_links(rdf, ns)
        }
    };

    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

fn parse_links(rdf: &str, ns: &Namespaces) -> Result<Vec<ResourceLink>, String> {
    let mut links = Vec::new();

    for quad in RdfParser::from_format(RdfFormat::Turtle).for_reader(rdf.as_bytes()) {
        let quad = quad.map_err(|e| e.to_string())?;
        let predicate = quad.predicate.as_str();
        if !ns.is_ontology(predicate) {
            continue;
        }
        if let Term::NamedNode(object) = &quad.object {
            if ns.is_resource(object.as_str()) {
                links.push(ResourceLink {
                    predicate: predicate.to_string(),
                    object: object.as_str().to_string(),
                });
            }
        }
    }

    Ok(links)
}

fn scan_links(rdf: &str, ns: &Namespaces) -> Vec<ResourceLink> {
    let pattern = format!(
        r"(?:^|[^\w:]){}:(\w+)\s+{}:([\w,\-]+)",
        regex::escape(&ns.ontology_prefix),
        regex::escape(&ns.resource_prefix)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid token scan pattern");
            return Vec::new();
        }
    };

    re.captures_iter(rdf)
        .map(|caps| ResourceLink {
            predicate: format!("{}{}", ns.ontology, &caps[1]),
            object: ns.resource_iri(&caps[2]),
        })
        .collect()
}
