//! Chunk and search-result types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A text segment produced by splitting a document.
///
/// `sequence_index` counts chunks within one page (or within the whole
/// document for unpaged sources), preserving source order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub page: Option<u32>,
    pub sequence_index: usize,
}

impl Chunk {
    /// The deterministic content address of this chunk.
    pub fn id(&self) -> ChunkId {
        ChunkId::new(&self.source, self.page, self.sequence_index)
    }
}

/// Deterministic composite key `source:page:index`.
///
/// Unpaged sources (URLs) render the page component as `-`. Two ingestion
/// runs over an unchanged document produce identical ids, which is what
/// makes ingestion idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkId(String);

impl ChunkId {
    pub fn new(source: &str, page: Option<u32>, index: usize) -> Self {
        match page {
            Some(page) => Self(format!("{source}:{page}:{index}")),
            None => Self(format!("{source}:-:{index}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chunk with its relevance score from similarity search.
///
/// Lower scores are better (embedding distance); results are returned in
/// ascending distance order, stable within one call.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// Counts reported by a store insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOutcome {
    pub added: usize,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_formats_paged_and_unpaged() {
        assert_eq!(ChunkId::new("src", Some(0), 0).as_str(), "src:0:0");
        assert_eq!(ChunkId::new("src", Some(1), 2).as_str(), "src:1:2");
        assert_eq!(
            ChunkId::new("https://example.com/a", None, 3).as_str(),
            "https://example.com/a:-:3"
        );
    }

    #[test]
    fn chunk_id_is_stable() {
        let chunk = Chunk {
            text: "body".to_string(),
            source: "doc.txt".to_string(),
            page: Some(4),
            sequence_index: 7,
        };
        assert_eq!(chunk.id(), chunk.id());
        assert_eq!(chunk.id().as_str(), "doc.txt:4:7");
    }
}
