//! sqlite-vec backed [`VectorCollection`] implementation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use chrono::Utc;
use libsqlite3_sys::{SQLITE_OK, sqlite3, sqlite3_api_routines, sqlite3_auto_extension};
use sqlite_vec::sqlite3_vec_init;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::collection::VectorCollection;
use crate::errors::{IndexError, IndexResult};
use crate::models::{Chunk, ChunkId, SearchResult};

static SQLITE_VEC_INIT_RC: OnceLock<i32> = OnceLock::new();

/// Chunk collection stored in SQLite with a `vec0` virtual table for
/// nearest-neighbor queries.
#[derive(Debug, Clone)]
pub struct SqliteVecCollection {
    pool: SqlitePool,
}

impl SqliteVecCollection {
    /// Open (creating if missing) the collection database.
    ///
    /// The `vec0` table needs the embedding dimension; it is taken from
    /// the `meta` table when the database has been used before, otherwise
    /// from `embedding_dim`. When both are absent the table is created
    /// lazily on the first upsert.
    pub async fn open(db_path: &Path, embedding_dim: Option<usize>) -> IndexResult<Self> {
        init_sqlite_vec_once()?;
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA synchronous = NORMAL")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let collection = Self { pool };
        if let Some(dim) = stored_dim(&collection.pool).await?.or(embedding_dim) {
            collection.ensure_vec_table(dim).await?;
        }

        Ok(collection)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_vec_table(&self, dimension: usize) -> IndexResult<()> {
        let table_exists: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'chunk_vec'",
        )
        .fetch_optional(&self.pool)
        .await?;

        if table_exists.is_none() {
            let create_sql = format!(
                "CREATE VIRTUAL TABLE IF NOT EXISTS chunk_vec USING vec0(embedding float[{}])",
                dimension
            );
            sqlx::query(&create_sql).execute(&self.pool).await?;
        }

        sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES ('embedding_dim', ?)")
            .bind(dimension.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn check_dim(&self, embedding: &[f32]) -> IndexResult<()> {
        match stored_dim(&self.pool).await? {
            Some(expected) if expected != embedding.len() => Err(IndexError::EmbeddingDimMismatch {
                expected,
                actual: embedding.len(),
            }),
            Some(_) => Ok(()),
            None => self.ensure_vec_table(embedding.len()).await,
        }
    }
}

async fn stored_dim(pool: &SqlitePool) -> IndexResult<Option<usize>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT value FROM meta WHERE key = 'embedding_dim' LIMIT 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(value,)| value.parse::<usize>().ok()))
}

fn init_sqlite_vec_once() -> IndexResult<()> {
    let rc = *SQLITE_VEC_INIT_RC.get_or_init(|| unsafe {
        type SqliteVecInitFn =
            unsafe extern "C" fn(*mut sqlite3, *mut *const i8, *const sqlite3_api_routines) -> i32;

        sqlite3_auto_extension(Some(std::mem::transmute::<*const (), SqliteVecInitFn>(
            sqlite3_vec_init as *const (),
        )))
    });

    if rc == SQLITE_OK {
        Ok(())
    } else {
        Err(IndexError::SqliteVec(format!(
            "sqlite-vec init failed with code {rc}"
        )))
    }
}

fn embedding_payload(embedding: &[f32]) -> IndexResult<String> {
    serde_json::to_string(embedding)
        .map_err(|e| IndexError::Embedding(format!("embedding serialize failed: {e}")))
}

#[async_trait::async_trait]
impl VectorCollection for SqliteVecCollection {
    async fn upsert(&self, id: &ChunkId, embedding: &[f32], chunk: &Chunk) -> IndexResult<()> {
        self.check_dim(embedding).await?;

        sqlx::query(
            r#"INSERT INTO chunks (chunk_id, source, page, seq, content, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(chunk_id) DO NOTHING"#,
        )
        .bind(id.as_str())
        .bind(&chunk.source)
        .bind(chunk.page.map(|p| p as i64))
        .bind(chunk.sequence_index as i64)
        .bind(&chunk.text)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        let (rowid,): (i64,) = sqlx::query_as("SELECT id FROM chunks WHERE chunk_id = ? LIMIT 1")
            .bind(id.as_str())
            .fetch_one(&self.pool)
            .await?;

        sqlx::query("INSERT OR REPLACE INTO chunk_vec(rowid, embedding) VALUES (?, ?)")
            .bind(rowid)
            .bind(embedding_payload(embedding)?)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn existing_ids(&self, ids: &[ChunkId]) -> IndexResult<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT chunk_id FROM chunks WHERE chunk_id IN ({})",
            placeholders
        );
        let mut query = sqlx::query_as::<_, (String,)>(&sql);
        for id in ids {
            query = query.bind(id.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> IndexResult<Vec<SearchResult>> {
        // No vec table yet means nothing was ever inserted.
        let table_exists: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'chunk_vec'",
        )
        .fetch_optional(&self.pool)
        .await?;
        if table_exists.is_none() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, (String, Option<i64>, i64, String, f32)>(
            r#"SELECT c.source, c.page, c.seq, c.content, v.distance
               FROM chunk_vec v
               JOIN chunks c ON c.id = v.rowid
               WHERE v.embedding MATCH ?
               ORDER BY v.distance ASC
               LIMIT ?"#,
        )
        .bind(embedding_payload(embedding)?)
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(source, page, seq, content, distance)| SearchResult {
                chunk: Chunk {
                    text: content,
                    source,
                    page: page.map(|p| p as u32),
                    sequence_index: seq as usize,
                },
                score: distance,
            })
            .collect())
    }

    async fn distinct_sources(&self) -> IndexResult<Vec<String>> {
        let rows =
            sqlx::query_as::<_, (String,)>("SELECT DISTINCT source FROM chunks ORDER BY source")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(source,)| source).collect())
    }

    async fn reset(&self) -> IndexResult<()> {
        sqlx::query("DELETE FROM chunks").execute(&self.pool).await?;

        let table_exists: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'chunk_vec'",
        )
        .fetch_optional(&self.pool)
        .await?;
        if table_exists.is_some() {
            sqlx::query("DELETE FROM chunk_vec")
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }
}
