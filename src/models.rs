// Core data structures for the quagga dataset builder

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::ontology::uri_title;

/// Text and neighborhood of one entity
///
/// Built once by the detail fetcher and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDetail {
    pub uri: String,
    pub title: String, // Derived from the URI tail
    pub multilingual_texts: BTreeMap<String, String>, // language code -> comment
    pub rdf: String, // Turtle serialization of the two-hop neighborhood
}

impl EntityDetail {
    /// Create a detail record, deriving the title from the URI
    pub fn new(uri: &str, multilingual_texts: BTreeMap<String, String>, rdf: String) -> Self {
        Self {
            uri: uri.to_string(),
            title: uri_title(uri),
            multilingual_texts,
            rdf,
        }
    }

    /// Comment in the given language, if any
    pub fn text(&self, language: &str) -> Option<&str> {
        self.multilingual_texts.get(language).map(String::as_str)
    }
}

/// A (predicate, object) pair whose object is mentioned in an anchor text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTriple {
    /// Full predicate IRI
    pub predicate: String,

    /// Full object IRI
    pub object: String,

    /// Readable form of the object, as searched for in the text
    pub surface_form: String,
}

/// Anchor text and RDF with one object substituted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativeSample {
    pub text: String,
    pub rdf: String,
}

/// Final unit of output, one row of the destination table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripletRecord {
    pub anchor_text: String,
    pub anchor_rdf: String,
    pub positive_text: String,
    pub negative_text: String,
    pub negative_rdf: String,
    pub subject_uri: String,
    pub subject_uri_id: i64,
}

/// Discovered entity URIs, persisted as a JSON array of strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityList {
    pub uris: Vec<String>,
}

impl EntityList {
    /// Create from any iterator of URIs, keeping the first occurrence of each
    pub fn new(uris: impl IntoIterator<Item = String>) -> Self {
        let mut seen = HashSet::new();
        Self {
            uris: uris
                .into_iter()
                .filter(|uri| seen.insert(uri.clone()))
                .collect(),
        }
    }

    /// Load a list written by `save`
    ///
    /// Repeated URIs are dropped so that every entity gets exactly one id.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let uris: Vec<String> = serde_json::from_str(&content)?;
        Ok(Self::new(uris))
    }

    /// Save as a pretty-printed JSON array
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic write using temp file
        let temp_path = path.with_extension("tmp");
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&temp_path, content)?;
        std::fs::rename(temp_path, path)?;
        Ok(())
    }

    /// Dense subject ids in list order
    pub fn with_ids(&self) -> impl Iterator<Item = (i64, &str)> {
        self.uris
            .iter()
            .enumerate()
            .map(|(i, uri)| (i as i64, uri.as_str()))
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}
