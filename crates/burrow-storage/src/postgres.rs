use async_trait::async_trait;
use burrow_core::error::{Result, StorageError};
use burrow_core::{OwnerId, ShortKey, Storage, UrlMapping};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Connection, Row};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

const SCHEMA: &str = include_str!("../ddl/postgres/short_urls.sql");

/// Upper bound on concurrent chunk updates issued by [`Storage::delete_batch`].
pub const DELETE_WORKERS: usize = 4;

/// Pool and probe settings for [`PostgresStorage::connect`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct PostgresOptions {
    /// Maximum number of pooled connections.
    #[builder(default = 25)]
    pub max_connections: u32,
    /// Connections older than this are closed and replaced.
    #[builder(default = Duration::from_secs(5 * 60))]
    pub max_lifetime: Duration,
    /// Bound on a single health-check ping.
    #[builder(default = Duration::from_secs(2))]
    pub ping_timeout: Duration,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// PostgreSQL implementation of [`Storage`].
///
/// Rows are never removed. Deletion flips `is_deleted`, after which reads
/// report [`StorageError::Deleted`] instead of the URL, and the key stays
/// reserved by the table's unique constraint.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
    ping_timeout: Duration,
}

impl PostgresStorage {
    /// Creates a storage from an existing pool. The schema is not touched.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            ping_timeout: PostgresOptions::default().ping_timeout,
        }
    }

    /// Opens a pool, creates the schema if missing and pings the database.
    pub async fn connect(database_url: &str, options: PostgresOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .max_lifetime(options.max_lifetime)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;

        let storage = Self {
            pool,
            ping_timeout: options.ping_timeout,
        };
        storage.ensure_schema().await?;
        storage.check_connection().await?;

        debug!(max_connections = options.max_connections, "connected to postgres");
        Ok(storage)
    }

    /// Creates the `short_urls` table and its indexes if they do not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

/// Splits `keys` into at most `parts` chunks of near-equal size.
fn split_chunks(keys: &[ShortKey], parts: usize) -> Vec<Vec<String>> {
    if keys.is_empty() || parts == 0 {
        return Vec::new();
    }
    let chunk_size = keys.len().div_ceil(parts);
    keys.chunks(chunk_size)
        .map(|chunk| chunk.iter().map(ToString::to_string).collect())
        .collect()
}

enum ChunkOutcome {
    Updated(u64),
    Skipped,
}

async fn soft_delete_chunk(pool: &PgPool, owner: &OwnerId, chunk: &[String]) -> Result<u64> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    // Returning early drops `tx`, which rolls it back.
    let result = sqlx::query(
        r#"
        UPDATE short_urls
        SET is_deleted = true
        WHERE short_key = ANY($1)
          AND user_id = $2
          AND is_deleted = false
        "#,
    )
    .bind(chunk)
    .bind(owner.as_str())
    .execute(&mut *tx)
    .await
    .map_err(map_sqlx_error)?;

    tx.commit().await.map_err(map_sqlx_error)?;
    Ok(result.rows_affected())
}

/// The in-flight chunk tasks of one `delete_batch` call.
///
/// If the call is dropped before every chunk has been joined, the remaining
/// tasks are detached rather than aborted: statements already running are
/// left to finish, and chunks that have not started see the flag and skip.
struct ChunkGroup {
    tasks: JoinSet<Result<ChunkOutcome>>,
    cancelled: Arc<AtomicBool>,
}

impl ChunkGroup {
    fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn spawn<F, Fut>(&mut self, work: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<u64>> + Send,
    {
        let cancelled = Arc::clone(&self.cancelled);
        self.tasks.spawn(async move {
            if cancelled.load(Ordering::Acquire) {
                return Ok(ChunkOutcome::Skipped);
            }
            work().await.map(ChunkOutcome::Updated)
        });
    }
}

impl Drop for ChunkGroup {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            self.cancelled.store(true, Ordering::Release);
            self.tasks.detach_all();
        }
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn save(&self, owner: &OwnerId, original_url: &str, key: &ShortKey) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (original_url, short_key, user_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(original_url)
        .bind(key.as_str())
        .bind(owner.as_str())
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(StorageError::ConstraintViolation(key.to_string()))
            }
            Err(err) => return Err(map_sqlx_error(err)),
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        trace!(key = %key, owner = %owner, "inserted mapping");
        Ok(())
    }

    async fn get_original_url(&self, key: &ShortKey) -> Result<String> {
        let row = sqlx::query(
            r#"
            SELECT original_url, is_deleted
            FROM short_urls
            WHERE short_key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Err(StorageError::NotFound(key.to_string()));
        };

        let is_deleted: Option<bool> = row.try_get("is_deleted").map_err(map_sqlx_error)?;
        if is_deleted.unwrap_or(false) {
            return Err(StorageError::Deleted(key.to_string()));
        }

        row.try_get("original_url").map_err(map_sqlx_error)
    }

    async fn get_short_key(&self, original_url: &str) -> Result<Option<ShortKey>> {
        let row = sqlx::query(
            r#"
            SELECT short_key
            FROM short_urls
            WHERE original_url = $1
              AND is_deleted IS NOT TRUE
            ORDER BY uuid
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| {
            row.try_get::<String, _>("short_key")
                .map(ShortKey::new_unchecked)
                .map_err(map_sqlx_error)
        })
        .transpose()
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<UrlMapping>> {
        let rows = sqlx::query(
            r#"
            SELECT short_key, original_url
            FROM short_urls
            WHERE user_id = $1
              AND is_deleted IS NOT TRUE
            ORDER BY uuid
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let short_key: String = row.try_get("short_key").map_err(map_sqlx_error)?;
                let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
                Ok(UrlMapping {
                    owner_id: owner.clone(),
                    short_key: ShortKey::new_unchecked(short_key),
                    original_url,
                })
            })
            .collect()
    }

    /// Soft-deletes in up to [`DELETE_WORKERS`] concurrent transactions.
    ///
    /// Chunk failures are logged and otherwise ignored: a partial delete is
    /// an accepted outcome and the call itself always succeeds.
    async fn delete_batch(&self, owner: &OwnerId, keys: &[ShortKey]) -> Result<()> {
        let chunks = split_chunks(keys, DELETE_WORKERS);
        if chunks.is_empty() {
            return Ok(());
        }

        let mut group = ChunkGroup::new();
        for chunk in chunks {
            let pool = self.pool.clone();
            let owner = owner.clone();
            group.spawn(move || async move { soft_delete_chunk(&pool, &owner, &chunk).await });
        }

        let mut updated = 0u64;
        while let Some(joined) = group.tasks.join_next().await {
            match joined {
                Ok(Ok(ChunkOutcome::Updated(rows))) => updated += rows,
                Ok(Ok(ChunkOutcome::Skipped)) => {
                    debug!(owner = %owner, "soft-delete chunk skipped after cancellation")
                }
                Ok(Err(err)) => {
                    warn!(owner = %owner, error = %err, "soft-delete chunk failed")
                }
                Err(err) => warn!(owner = %owner, error = %err, "soft-delete task failed"),
            }
        }

        debug!(owner = %owner, requested = keys.len(), updated, "soft-delete finished");
        Ok(())
    }

    async fn check_connection(&self) -> Result<()> {
        let ping = async {
            let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
            conn.ping().await.map_err(map_sqlx_error)
        };

        match tokio::time::timeout(self.ping_timeout, ping).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(format!(
                "database ping exceeded {:?}",
                self.ping_timeout
            ))),
        }
    }
}
