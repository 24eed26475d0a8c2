//! The keyed similarity-search collaborator behind the content store.

use std::collections::HashSet;

use crate::errors::IndexResult;
use crate::models::{Chunk, ChunkId, SearchResult};

/// A persistent collection of embedded chunks keyed by [`ChunkId`].
///
/// The store never mutates entries; it inserts new ids, queries by
/// embedding, lists metadata, and resets. [`SqliteVecCollection`] is the
/// shipped implementation; tests use an in-memory fake.
///
/// [`SqliteVecCollection`]: crate::sqlite::SqliteVecCollection
#[async_trait::async_trait]
pub trait VectorCollection: Send + Sync {
    /// Insert or replace one embedded chunk under its id.
    async fn upsert(&self, id: &ChunkId, embedding: &[f32], chunk: &Chunk) -> IndexResult<()>;

    /// Which of the given ids are already present.
    async fn existing_ids(&self, ids: &[ChunkId]) -> IndexResult<HashSet<String>>;

    /// Top-`k` nearest chunks by embedding distance, ascending.
    async fn query(&self, embedding: &[f32], k: usize) -> IndexResult<Vec<SearchResult>>;

    /// Distinct `source` values across all stored chunk metadata.
    /// An empty vec is the empty-collection sentinel.
    async fn distinct_sources(&self) -> IndexResult<Vec<String>>;

    /// Drop every entry. Irreversible.
    async fn reset(&self) -> IndexResult<()>;
}
