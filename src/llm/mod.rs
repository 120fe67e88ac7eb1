//! Text augmentation for positive and associative rows
//!
//! The pipeline asks a [`TextAugmenter`] for a faithful paraphrase of every
//! anchor text and for extra associative texts about an entity.
//! [`TemplateAugmenter`] is the offline implementation used by default.

/// Source of generated text variants
pub trait TextAugmenter: Send + Sync {
    /// Semantically faithful rewording of `text`
    fn paraphrase(&self, text: &str) -> String;

    /// Associative texts about an entity, seeded by its description
    fn associations(&self, title: &str, description: &str) -> Vec<String>;
}

/// Deterministic templates standing in for a generative model
#[derive(Debug, Clone)]
pub struct TemplateAugmenter {
    rows: usize,
}

impl Default for TemplateAugmenter {
    fn default() -> Self {
        Self { rows: 5 }
    }
}

impl TemplateAugmenter {
    /// Limit the number of association rows (at most five)
    pub fn with_rows(rows: usize) -> Self {
        Self { rows }
    }
}

impl TextAugmenter for TemplateAugmenter {
    fn paraphrase(&self, text: &str) -> String {
        format!("From a different perspective, {}", text.to_lowercase())
    }

    fn associations(&self, title: &str, _description: &str) -> Vec<String> {
        let templates = [
            format!("Considering the historical context, {title} emerged as a significant concept following..."),
            format!("For a beginner, the most important thing to understand about {title} is that it relates to..."),
            format!("A deep technical dive into {title} reveals its dependency on the principles of..."),
            format!("The societal impact of {title} can be seen in its influence on..."),
            format!("An interesting and often debated aspect of {title} is..."),
        ];
        templates.into_iter().take(self.rows).collect()
    }
}
