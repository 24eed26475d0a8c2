//! Document index for quill: chunking, embedding, and the
//! content-addressed vector store.

pub mod chunker;
pub mod collection;
pub mod embeddings;
pub mod errors;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod sqlite;
pub mod store;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use quill_core::IndexSettings;

pub use collection::VectorCollection;
pub use embeddings::{Embedder, EmbeddingClient};
pub use errors::{IndexError, IndexResult};
pub use extract::{Page, PlainTextExtractor, TextExtractor, extract_html};
pub use ingest::Ingestor;
pub use models::{AddOutcome, Chunk, ChunkId, SearchResult};
pub use sqlite::SqliteVecCollection;
pub use store::ContentStore;
