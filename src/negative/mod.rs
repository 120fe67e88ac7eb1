//! Negative sample generation
//!
//! [`NegativeSampler`] chains the two steps: align the neighborhood with the
//! anchor text, then corrupt the first candidate that allows it.

pub mod aligner;
pub mod corruption;

use rand::Rng;
use std::sync::Arc;

use crate::config::GraphConfig;
use crate::models::NegativeSample;
use crate::ontology::Namespaces;
use crate::sparql::SparqlEndpoint;

pub use aligner::MentionAligner;
pub use corruption::CorruptionEngine;

pub struct NegativeSampler {
    aligner: MentionAligner,
    engine: CorruptionEngine,
}

impl NegativeSampler {
    pub fn new(aligner: MentionAligner, engine: CorruptionEngine) -> Self {
        Self { aligner, engine }
    }

    pub fn from_config(endpoint: Arc<dyn SparqlEndpoint>, config: &GraphConfig) -> Self {
        Self::new(
            MentionAligner::new(Namespaces::from_config(config)),
            CorruptionEngine::from_config(endpoint, config),
        )
    }

    /// Negative variant of one anchor text, or `None` if no mentioned object can be swapped
    pub async fn sample<R: Rng + Send + ?Sized>(
        &self,
        anchor_text: &str,
        rdf: &str,
        rng: &mut R,
    ) -> Option<NegativeSample> {
        let candidates = self.aligner.find_mentioned_candidates(anchor_text, rdf);
        if candidates.is_empty() {
            tracing::debug!("No neighborhood objects mentioned in text");
            return None;
        }

        self.engine.corrupt(anchor_text, rdf, &candidates, rng).await
    }

    pub fn aligner(&self) -> &MentionAligner {
        &self.aligner
    }

    pub fn engine(&self) -> &CorruptionEngine {
        &self.engine
    }
}
