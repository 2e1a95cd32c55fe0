use std::path::PathBuf;
use std::sync::Arc;

use burrow_core::Storage;
use burrow_storage::{CompositeStorage, FileStorage, InMemoryStorage, PostgresOptions, PostgresStorage};
use tracing::{info, warn};
use typed_builder::TypedBuilder;

/// Which optional backends to stack behind the in-memory one.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct StorageSettings {
    /// Append-only log path. Disabled when `None`.
    #[builder(default, setter(into))]
    pub file_storage_path: Option<PathBuf>,
    /// PostgreSQL DSN. Disabled when `None`.
    #[builder(default, setter(into))]
    pub database_dsn: Option<String>,
    #[builder(default)]
    pub postgres: PostgresOptions,
}

/// Builds the composite storage in read order: memory, file, postgres.
///
/// Memory is always present. A backend that fails to initialize is logged
/// and left out, so the server still starts with whatever is reachable.
pub async fn build_storage(settings: &StorageSettings) -> CompositeStorage {
    let mut backends: Vec<Arc<dyn Storage>> = vec![Arc::new(InMemoryStorage::new())];

    if let Some(path) = &settings.file_storage_path {
        match FileStorage::open(path).await {
            Ok(file) => backends.push(Arc::new(file)),
            Err(err) => warn!(path = %path.display(), error = %err, "file storage disabled"),
        }
    }

    if let Some(dsn) = &settings.database_dsn {
        match PostgresStorage::connect(dsn, settings.postgres.clone()).await {
            Ok(postgres) => backends.push(Arc::new(postgres)),
            Err(err) => warn!(error = %err, "postgres storage disabled"),
        }
    }

    let storage = CompositeStorage::new(backends);
    info!(backends = ?storage.backend_names(), "storage initialized");
    storage
}
