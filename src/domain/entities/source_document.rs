use crate::domain::entities::document_chunk::DocumentChunk;
use serde::Serialize;

const DEFAULT_TITLE: &str = "Document";
const DEFAULT_CATEGORY: &str = "general";
const EXCERPT_CHARS: usize = 150;

/// A search hit shaped for citation in a chat answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDocument {
    pub title: String,
    pub category: String,
    pub excerpt: String,
    /// `(1 - distance) * 100`, one decimal place.
    pub relevance: f64,
}

impl From<&DocumentChunk> for SourceDocument {
    fn from(chunk: &DocumentChunk) -> Self {
        Self {
            title: chunk.title().unwrap_or(DEFAULT_TITLE).to_string(),
            category: chunk.category().unwrap_or(DEFAULT_CATEGORY).to_string(),
            excerpt: excerpt(&chunk.content),
            relevance: relevance(chunk.distance.unwrap_or(0.0)),
        }
    }
}

fn excerpt(content: &str) -> String {
    if content.chars().count() <= EXCERPT_CHARS {
        return content.to_string();
    }
    let mut out: String = content.chars().take(EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}

fn relevance(distance: f64) -> f64 {
    ((1.0 - distance) * 1000.0).round() / 10.0
}
