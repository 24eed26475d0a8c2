//! Deterministic fakes for store-level tests.
//!
//! Enabled with the `test-helpers` feature so downstream crates can test
//! against the store without a live embedding service or sqlite-vec.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::collection::VectorCollection;
use crate::embeddings::Embedder;
use crate::errors::{IndexError, IndexResult};
use crate::models::{Chunk, ChunkId, SearchResult};

/// In-memory [`VectorCollection`] with brute-force distance queries.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    entries: Mutex<HashMap<String, (Vec<f32>, Chunk)>>,
    fail_queries: Mutex<bool>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `query` calls fail, to exercise fail-soft paths.
    pub fn fail_queries(&self, fail: bool) {
        *self.fail_queries.lock().unwrap() = fail;
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait::async_trait]
impl VectorCollection for MemoryCollection {
    async fn upsert(&self, id: &ChunkId, embedding: &[f32], chunk: &Chunk) -> IndexResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(id.as_str().to_string(), (embedding.to_vec(), chunk.clone()));
        Ok(())
    }

    async fn existing_ids(&self, ids: &[ChunkId]) -> IndexResult<HashSet<String>> {
        let entries = self.entries.lock().unwrap();
        Ok(ids
            .iter()
            .filter(|id| entries.contains_key(id.as_str()))
            .map(|id| id.as_str().to_string())
            .collect())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> IndexResult<Vec<SearchResult>> {
        if *self.fail_queries.lock().unwrap() {
            return Err(IndexError::Embedding("query failure injected".to_string()));
        }

        let entries = self.entries.lock().unwrap();
        let mut results: Vec<SearchResult> = entries
            .values()
            .map(|(stored, chunk)| SearchResult {
                chunk: chunk.clone(),
                score: euclidean(embedding, stored),
            })
            .collect();
        results.sort_by(|a, b| a.score.total_cmp(&b.score));
        results.truncate(k);
        Ok(results)
    }

    async fn distinct_sources(&self) -> IndexResult<Vec<String>> {
        let entries = self.entries.lock().unwrap();
        let mut sources: Vec<String> = entries
            .values()
            .map(|(_, chunk)| chunk.source.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        sources.sort();
        Ok(sources)
    }

    async fn reset(&self) -> IndexResult<()> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Embedder producing a small deterministic vector from byte content.
#[derive(Debug, Default)]
pub struct HashEmbedder {
    fail: Mutex<bool>,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls fail, to exercise fail-soft paths.
    pub fn fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait::async_trait]
impl Embedder for HashEmbedder {
    async fn embed_batch(&self, inputs: &[String]) -> IndexResult<Vec<Vec<f32>>> {
        if *self.fail.lock().unwrap() {
            return Err(IndexError::Embedding(
                "embedding failure injected".to_string(),
            ));
        }

        Ok(inputs
            .iter()
            .map(|input| {
                let mut vector = [0f32; 8];
                for (i, byte) in input.bytes().enumerate() {
                    vector[i % 8] += byte as f32 / 255.0;
                }
                vector.to_vec()
            })
            .collect())
    }
}
