use crate::chunking::DEFAULT_CHUNK_MAX_CHARS;
use crate::index::TermFrequencyMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;
pub const DEFAULT_FALLBACK_CHUNK_COUNT: usize = 5;
pub const DEFAULT_CONTEXT_SEPARATOR: &str = "\n\n";

/// A chunk of document text with its term-frequency index, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexedChunk {
    pub text: String,
    #[serde(rename = "tfIndex")]
    pub tf_index: TermFrequencyMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMeta {
    pub id: String,
    pub name: String,
    #[serde(rename = "isSelected")]
    pub is_selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: String,
    pub name: String,
    #[serde(rename = "isSelected")]
    pub is_selected: bool,
    pub checksum: String,
    #[serde(rename = "ingestedAt")]
    pub ingested_at: DateTime<Utc>,
    #[serde(rename = "indexedChunks")]
    pub indexed_chunks: Vec<IndexedChunk>,
}

impl KnowledgeDocument {
    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            is_selected: self.is_selected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredChunk<'a> {
    pub position: usize,
    pub text: &'a str,
    pub score: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// No query terms or no chunks.
    Empty,
    Ranked,
    /// Nothing matched; the leading chunks were taken in original order.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSelection {
    pub text: String,
    pub strategy: SelectionStrategy,
    pub included_chunks: usize,
}

impl ContextSelection {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            strategy: SelectionStrategy::Empty,
            included_chunks: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub chunk_max_chars: usize,
    pub max_context_chars: usize,
    pub fallback_chunk_count: usize,
    pub separator: String,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            chunk_max_chars: DEFAULT_CHUNK_MAX_CHARS,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            fallback_chunk_count: DEFAULT_FALLBACK_CHUNK_COUNT,
            separator: DEFAULT_CONTEXT_SEPARATOR.to_string(),
        }
    }
}
