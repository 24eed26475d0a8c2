//! Ingestion: extract text, chunk it, hand it to the store.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::chunker::split_text;
use crate::errors::{IndexError, IndexResult};
use crate::extract::{TextExtractor, extract_html};
use crate::models::{AddOutcome, Chunk};
use crate::store::ContentStore;

pub struct Ingestor {
    store: Arc<ContentStore>,
    extractor: Arc<dyn TextExtractor>,
    chunk_size: usize,
    chunk_overlap: usize,
    client: reqwest::Client,
}

impl Ingestor {
    pub fn new(
        store: Arc<ContentStore>,
        extractor: Arc<dyn TextExtractor>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            store,
            extractor,
            chunk_size,
            chunk_overlap,
            client,
        }
    }

    pub fn from_settings(
        settings: &quill_core::IndexSettings,
        store: Arc<ContentStore>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self::new(store, extractor, settings.chunk_size, settings.chunk_overlap)
    }

    /// Ingest a document file: extract pages, chunk each page, store.
    ///
    /// The chunk source is the file name; a source already present in the
    /// index is skipped with a warning so bulk directory scans stay
    /// idempotent.
    pub async fn ingest_file(&self, path: &Path) -> IndexResult<AddOutcome> {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        if self.store.list_sources().await?.contains(&source) {
            warn!(source = %source, "source already indexed, skipping");
            return Ok(AddOutcome::default());
        }

        let pages = self.extractor.extract(path).await?;
        let mut chunks = Vec::new();
        for page in &pages {
            for (sequence_index, text) in split_text(&page.text, self.chunk_size, self.chunk_overlap)
                .into_iter()
                .enumerate()
            {
                chunks.push(Chunk {
                    text,
                    source: source.clone(),
                    page: Some(page.number),
                    sequence_index,
                });
            }
        }

        let outcome = self.store.add(chunks).await?;
        info!(source = %source, pages = pages.len(), added = outcome.added, "ingested file");
        Ok(outcome)
    }

    /// Fetch a URL, convert the HTML to text, chunk, store.
    ///
    /// A transport error or non-2xx status is a fetch failure; a page
    /// that yields only whitespace is rejected so nothing is silently
    /// indexed as empty.
    pub async fn ingest_url(&self, url: &str) -> IndexResult<AddOutcome> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", BROWSER_USER_AGENT)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await
            .map_err(|e| IndexError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(IndexError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let raw = response.bytes().await.map_err(|e| IndexError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let text = extract_html(&raw);
        if text.trim().is_empty() {
            return Err(IndexError::EmptyContent(url.to_string()));
        }

        let chunks = split_text(&text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(sequence_index, text)| Chunk {
                text,
                source: url.to_string(),
                page: None,
                sequence_index,
            })
            .collect();

        let outcome = self.store.add(chunks).await?;
        info!(url = %url, added = outcome.added, "ingested url");
        Ok(outcome)
    }

    /// Ingest every regular file in the active data dir whose source is
    /// not yet indexed. Extraction failures skip the file with a warning
    /// instead of aborting the scan.
    pub async fn scan_data_dir(&self) -> IndexResult<usize> {
        let data_dir = self.store.data_dir().to_path_buf();
        if !data_dir.exists() {
            tokio::fs::create_dir_all(&data_dir).await?;
            return Ok(0);
        }

        let mut ingested = 0;
        let mut entries = tokio::fs::read_dir(&data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match self.ingest_file(&entry.path()).await {
                Ok(outcome) if outcome.added > 0 => ingested += 1,
                Ok(_) => {}
                Err(e) => {
                    warn!(file = %entry.path().display(), error = %e, "skipping file");
                }
            }
        }

        Ok(ingested)
    }
}

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
