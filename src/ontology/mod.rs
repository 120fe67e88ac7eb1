//! Knowledge graph namespace handling
//!
//! Conversions between full IRIs, compact `prefix:local` tokens and the
//! human-readable surface forms used to find entity mentions in text.

pub mod triples;

use crate::config::GraphConfig;

pub use triples::{resource_links, ResourceLink};

/// Characters that must be backslash-escaped inside a Turtle local name
const TURTLE_LOCAL_ESCAPES: &[char] = &[
    '~', '!', '$', '&', '\'', '(', ')', '*', '+', ',', ';', '=', '/', '?', '#', '@', '%',
];

/// Namespaces of the knowledge graph being sampled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    /// Entity resource namespace, e.g. `http://dbpedia.org/resource/`
    pub resource: String,

    /// Ontology namespace, e.g. `http://dbpedia.org/ontology/`
    pub ontology: String,

    /// Category namespace, e.g. `http://dbpedia.org/resource/Category:`
    pub category: String,

    /// Compact prefix for resources (`dbr`)
    pub resource_prefix: String,

    /// Compact prefix for ontology terms (`dbo`)
    pub ontology_prefix: String,
}

impl Default for Namespaces {
    fn default() -> Self {
        Self::from_config(&GraphConfig::default())
    }
}

impl Namespaces {
    /// Build from the graph section of the configuration
    pub fn from_config(config: &GraphConfig) -> Self {
        Self {
            resource: config.resource_namespace.clone(),
            ontology: config.ontology_namespace.clone(),
            category: config.category_namespace.clone(),
            resource_prefix: config.resource_prefix.clone(),
            ontology_prefix: config.ontology_prefix.clone(),
        }
    }

    /// Whether the IRI is an ontology term
    pub fn is_ontology(&self, iri: &str) -> bool {
        iri.strip_prefix(&self.ontology)
            .is_some_and(|local| !local.is_empty())
    }

    /// Whether the IRI is an entity resource
    pub fn is_resource(&self, iri: &str) -> bool {
        self.resource_local(iri).is_some()
    }

    /// Local part of a resource IRI
    ///
    /// Category resources and hierarchical paths are not entity resources.
    pub fn resource_local<'a>(&self, iri: &'a str) -> Option<&'a str> {
        if iri.starts_with(&self.category) {
            return None;
        }
        iri.strip_prefix(&self.resource)
            .filter(|local| !local.is_empty() && !local.contains(['/', '#', ':']))
    }

    /// Full IRI of a resource local name
    pub fn resource_iri(&self, local: &str) -> String {
        format!("{}{local}", self.resource)
    }

    /// Compact `dbo:local` token of an ontology IRI, if it has a plain local name
    pub fn compact_ontology(&self, iri: &str) -> Option<String> {
        let local = iri.strip_prefix(&self.ontology)?;
        is_plain_local(local).then(|| format!("{}:{local}", self.ontology_prefix))
    }

    /// Compact `dbr:local` token of a resource IRI, if it has a plain local name
    pub fn compact_resource(&self, iri: &str) -> Option<String> {
        let local = self.resource_local(iri)?;
        is_plain_local(local).then(|| format!("{}:{local}", self.resource_prefix))
    }

    /// Every spelling under which a resource may appear in a Turtle document
    ///
    /// Returns the plain compact token, the backslash-escaped compact token
    /// and the bracketed full IRI, without duplicates.
    pub fn resource_spellings(&self, iri: &str) -> Vec<String> {
        let mut spellings = Vec::with_capacity(3);
        if let Some(token) = self.compact_resource(iri) {
            spellings.push(token);
        }
        if let Some(local) = self.resource_local(iri) {
            let escaped = escape_local(local);
            if escaped != local {
                spellings.push(format!("{}:{escaped}", self.resource_prefix));
            }
        }
        spellings.push(format!("<{iri}>"));
        spellings
    }

    /// Token used to write a resource into a Turtle document
    ///
    /// Compact when the local name allows it, bracketed full IRI otherwise.
    pub fn resource_token(&self, iri: &str) -> String {
        self.compact_resource(iri)
            .unwrap_or_else(|| format!("<{iri}>"))
    }

    /// IRI of a category from its human-readable label
    pub fn category_iri(&self, label: &str) -> String {
        format!("{}{}", self.category, escape_iri(&label.trim().replace(' ', "_")))
    }

    /// Human-readable label of a category IRI
    pub fn category_label(&self, iri: &str) -> Option<String> {
        iri.strip_prefix(&self.category)
            .filter(|local| !local.is_empty())
            .map(|local| local.replace('_', " "))
    }
}

/// Human-readable surface form of a local name (`Albert_Einstein` → `Albert Einstein`)
pub fn surface_form(local: &str) -> String {
    local.replace('_', " ")
}

/// Title of an entity derived from the tail of its URI
pub fn uri_title(uri: &str) -> String {
    surface_form(uri.rsplit('/').next().unwrap_or(uri))
}

/// Percent-encode characters that may not appear inside `<...>` in SPARQL
pub fn escape_iri(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_whitespace() || c.is_control() || "<>\"{}|^`\\".contains(c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                escaped.push_str(&format!("%{byte:02X}"));
            }
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Whether an IRI can be embedded in a SPARQL query between angle brackets
pub fn is_safe_iri(iri: &str) -> bool {
    !iri.is_empty() && escape_iri(iri) == iri && url::Url::parse(iri).is_ok()
}

/// Whether a local name can be written as `prefix:local` without escapes
fn is_plain_local(local: &str) -> bool {
    let Some(first) = local.chars().next() else {
        return false;
    };
    (first.is_alphanumeric() || first == '_')
        && local
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !local.ends_with('.')
}

/// Backslash-escape reserved characters of a Turtle local name
fn escape_local(local: &str) -> String {
    let mut escaped = String::with_capacity(local.len());
    for c in local.chars() {
        if TURTLE_LOCAL_ESCAPES.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    if escaped.ends_with('.') {
        escaped.insert(escaped.len() - 1, '\\');
    }
    escaped
}

/// Whether a character can continue a compact Turtle name
fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '\\' | '%')
}

/// Replace whole occurrences of a Turtle token
///
/// An occurrence only counts when it is not glued to a longer name, so
/// replacing `dbr:Einstein` leaves `dbr:Einstein_Prize` and `xdbr:Einstein`
/// untouched. Returns the rewritten document and the number of replacements.
pub fn replace_token(document: &str, token: &str, replacement: &str) -> (String, usize) {
    if token.is_empty() {
        return (document.to_string(), 0);
    }

    let bracketed = token.starts_with('<') && token.ends_with('>');
    let mut output = String::with_capacity(document.len());
    let mut count = 0;
    let mut cursor = 0;

    for (start, _) in document.match_indices(token) {
        let end = start + token.len();
        let before_ok = bracketed
            || document[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !is_name_char(c));
        let mut rest = document[end..].chars();
        let after_ok = bracketed
            || match rest.next() {
                None => true,
                Some('.') => !rest.next().is_some_and(is_name_char),
                Some(c) => !is_name_char(c),
            };

        if before_ok && after_ok {
            output.push_str(&document[cursor..start]);
            output.push_str(replacement);
            cursor = end;
            count += 1;
        }
    }

    output.push_str(&document[cursor..]);
    (output, count)
}
