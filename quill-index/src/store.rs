//! Content-addressed chunk store.
//!
//! Wraps a [`VectorCollection`] and an [`Embedder`]. Every chunk gets a
//! deterministic id from its source/page/sequence position, so
//! re-ingesting an unchanged document inserts nothing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::collection::VectorCollection;
use crate::embeddings::Embedder;
use crate::errors::IndexResult;
use crate::models::{AddOutcome, Chunk, SearchResult};

pub struct ContentStore {
    collection: Arc<dyn VectorCollection>,
    embedder: Arc<dyn Embedder>,
    data_dir: PathBuf,
    unused_dir: PathBuf,
}

impl ContentStore {
    pub fn new(
        collection: Arc<dyn VectorCollection>,
        embedder: Arc<dyn Embedder>,
        data_dir: impl Into<PathBuf>,
        unused_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            collection,
            embedder,
            data_dir: data_dir.into(),
            unused_dir: unused_dir.into(),
        }
    }

    pub fn from_settings(
        settings: &quill_core::IndexSettings,
        collection: Arc<dyn VectorCollection>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self::new(
            collection,
            embedder,
            settings.data_dir.clone(),
            settings.unused_dir.clone(),
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Insert chunks whose id is not yet present.
    ///
    /// Embeds only the new chunks, then upserts them one by one. The
    /// existence check and the inserts are not one atomic step: safe for
    /// a single writer, racy for concurrent ingestion of the same
    /// document (the UNIQUE key in the collection keeps duplicates out,
    /// at the cost of duplicated embedding work).
    pub async fn add(&self, chunks: Vec<Chunk>) -> IndexResult<AddOutcome> {
        if chunks.is_empty() {
            return Ok(AddOutcome::default());
        }

        let ids: Vec<_> = chunks.iter().map(Chunk::id).collect();
        let existing = self.collection.existing_ids(&ids).await?;

        let fresh: Vec<&Chunk> = chunks
            .iter()
            .zip(&ids)
            .filter(|(_, id)| !existing.contains(id.as_str()))
            .map(|(chunk, _)| chunk)
            .collect();
        let outcome = AddOutcome {
            added: fresh.len(),
            skipped: chunks.len() - fresh.len(),
        };

        if fresh.is_empty() {
            info!(added = 0, skipped = outcome.skipped, "all chunks already indexed");
            return Ok(outcome);
        }

        let texts: Vec<String> = fresh.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        for (chunk, embedding) in fresh.iter().zip(&embeddings) {
            self.collection.upsert(&chunk.id(), embedding, chunk).await?;
        }

        info!(
            added = outcome.added,
            skipped = outcome.skipped,
            "indexed chunks"
        );
        Ok(outcome)
    }

    /// Top-`k` chunks nearest to `query`.
    ///
    /// Collaborator failures (embedding service down, collection
    /// unreachable) degrade to an empty result; "no results" is always a
    /// valid outcome for callers.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Vec<SearchResult> {
        let embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "query embedding failed, returning no results");
                return Vec::new();
            }
        };

        match self.collection.query(&embedding, k).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "similarity query failed, returning no results");
                Vec::new()
            }
        }
    }

    /// Archive all active source documents and empty the collection.
    ///
    /// Every file in the data dir is renamed into the unused dir (rename
    /// is atomic per file; a file already archived by an interrupted
    /// earlier clear is simply replaced, so rerunning completes a partial
    /// clear). Destructive and irreversible for the index.
    pub async fn clear(&self) -> IndexResult<()> {
        if self.data_dir.exists() {
            tokio::fs::create_dir_all(&self.unused_dir).await?;

            let mut entries = tokio::fs::read_dir(&self.data_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                if !entry.file_type().await?.is_file() {
                    continue;
                }
                let target = self.unused_dir.join(entry.file_name());
                tokio::fs::rename(entry.path(), &target).await?;
                info!(file = %entry.file_name().to_string_lossy(), "archived source file");
            }
        }

        self.collection.reset().await?;
        info!("collection reset");
        Ok(())
    }

    /// Distinct sources currently indexed. Empty means empty collection.
    pub async fn list_sources(&self) -> IndexResult<Vec<String>> {
        self.collection.distinct_sources().await
    }
}
