//! Query text for every question asked of the knowledge graph
//!
//! IRIs taken from discovered data are checked before being spliced between
//! angle brackets, so a malformed URI yields `QueryError::InvalidQuery`
//! instead of a different query.

use crate::ontology::{is_safe_iri, Namespaces};
use crate::utils::error::QueryError;

fn checked(iri: &str) -> Result<&str, QueryError> {
    if is_safe_iri(iri) {
        Ok(iri)
    } else {
        Err(QueryError::InvalidQuery(format!("unsafe IRI: {iri}")))
    }
}

/// Resources directly filed under a category
pub fn category_members(ns: &Namespaces, category: &str) -> String {
    format!(
        "PREFIX dct: <http://purl.org/dc/terms/>\n\
         SELECT DISTINCT ?resource WHERE {{\n  \
           ?resource dct:subject <{category}> .\n  \
           FILTER(STRSTARTS(STR(?resource), \"{resource}\"))\n\
         }}",
        category = ns.category_iri(category),
        resource = ns.resource,
    )
}

/// Direct sub-categories of a category
pub fn subcategories(ns: &Namespaces, category: &str) -> String {
    format!(
        "PREFIX skos: <http://www.w3.org/2004/02/skos/core#>\n\
         SELECT DISTINCT ?subcategory WHERE {{\n  \
           ?subcategory skos:broader <{category}> .\n\
         }}",
        category = ns.category_iri(category),
    )
}

/// All descriptive comments of an entity, in every language
pub fn entity_comments(uri: &str) -> Result<String, QueryError> {
    Ok(format!(
        "PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
         SELECT ?comment WHERE {{\n  \
           <{uri}> rdfs:comment ?comment .\n\
         }}",
        uri = checked(uri)?,
    ))
}

/// Two-hop ontology neighborhood of an entity
///
/// First hop: every ontology predicate out of the entity. Second hop: ontology
/// predicates out of first-hop objects that are themselves resources.
pub fn entity_neighborhood(ns: &Namespaces, uri: &str) -> Result<String, QueryError> {
    Ok(format!(
        "CONSTRUCT {{\n  \
           <{uri}> ?p1 ?o1 .\n  \
           ?o1 ?p2 ?o2 .\n\
         }}\n\
         WHERE {{\n  \
           <{uri}> ?p1 ?o1 .\n  \
           FILTER(STRSTARTS(STR(?p1), \"{ontology}\"))\n  \
           OPTIONAL {{\n    \
             FILTER(ISURI(?o1) && STRSTARTS(STR(?o1), \"{resource}\"))\n    \
             ?o1 ?p2 ?o2 .\n    \
             FILTER(STRSTARTS(STR(?p2), \"{ontology}\"))\n  \
           }}\n\
         }}",
        uri = checked(uri)?,
        ontology = ns.ontology,
        resource = ns.resource,
    ))
}

/// Every class an object is an instance of
pub fn resource_types(uri: &str) -> Result<String, QueryError> {
    Ok(format!(
        "SELECT ?type WHERE {{\n  \
           <{uri}> a ?type .\n\
         }}",
        uri = checked(uri)?,
    ))
}

/// Other resources of the same class, capped at `limit`
pub fn replacements(
    ns: &Namespaces,
    type_iri: &str,
    exclude: &str,
    limit: usize,
) -> Result<String, QueryError> {
    Ok(format!(
        "SELECT DISTINCT ?replacement WHERE {{\n  \
           ?replacement a <{type_iri}> .\n  \
           FILTER(?replacement != <{exclude}>)\n  \
           FILTER(STRSTARTS(STR(?replacement), \"{resource}\"))\n\
         }}\n\
         LIMIT {limit}",
        type_iri = checked(type_iri)?,
        exclude = checked(exclude)?,
        resource = ns.resource,
    ))
}
