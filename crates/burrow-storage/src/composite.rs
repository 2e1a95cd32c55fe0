use async_trait::async_trait;
use burrow_core::error::{BackendFailure, Result, StorageError};
use burrow_core::{OwnerId, ShortKey, Storage, UrlMapping};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// An ordered stack of storage backends behind a single [`Storage`].
///
/// # Operation Strategy
///
/// - **Save**: write to every backend in order. Failures are logged and
///   collected; the save only fails, with
///   [`StorageError::AllBackendsFailed`], when no backend accepted it.
/// - **Forward lookup**: ask each backend in order and stop at the first
///   hit. A [`StorageError::Deleted`] answer also stops the search.
/// - **Reverse lookup**: first `Some` wins unless a forward lookup of that
///   key reports it deleted; backend errors count as "no answer".
/// - **List**: first non-empty answer wins.
/// - **Delete**: fan out to every backend that supports it.
/// - **Health**: every backend that supports the probe must pass.
///
/// Backend order is the read priority, so the fastest backend goes first.
#[derive(Clone, Default)]
pub struct CompositeStorage {
    backends: Vec<Arc<dyn Storage>>,
}

impl std::fmt::Debug for CompositeStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeStorage")
            .field("backends", &self.backend_names())
            .finish()
    }
}

impl CompositeStorage {
    /// Creates a composite over `backends`, read in the given order.
    pub fn new(backends: Vec<Arc<dyn Storage>>) -> Self {
        Self { backends }
    }

    /// Returns the backends in read order.
    pub fn backends(&self) -> &[Arc<dyn Storage>] {
        &self.backends
    }

    /// Returns the backend names in read order.
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[async_trait]
impl Storage for CompositeStorage {
    fn name(&self) -> &'static str {
        "composite"
    }

    async fn save(&self, owner: &OwnerId, original_url: &str, key: &ShortKey) -> Result<()> {
        let mut failures = Vec::new();

        for backend in &self.backends {
            match backend.save(owner, original_url, key).await {
                Ok(()) => trace!(backend = backend.name(), key = %key, "backend accepted save"),
                Err(error) => {
                    warn!(backend = backend.name(), key = %key, error = %error, "backend failed to save");
                    failures.push(BackendFailure {
                        backend: backend.name(),
                        error,
                    });
                }
            }
        }

        if failures.len() == self.backends.len() {
            return Err(StorageError::AllBackendsFailed(failures));
        }
        Ok(())
    }

    async fn get_original_url(&self, key: &ShortKey) -> Result<String> {
        let mut first_error = None;

        for backend in &self.backends {
            match backend.get_original_url(key).await {
                Ok(url) => {
                    debug!(backend = backend.name(), key = %key, "resolved short key");
                    return Ok(url);
                }
                Err(err @ StorageError::Deleted(_)) => return Err(err),
                Err(err) if err.is_not_found() => {
                    trace!(backend = backend.name(), key = %key, "short key not in backend");
                }
                Err(err) => {
                    warn!(backend = backend.name(), key = %key, error = %err, "backend lookup failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        Err(first_error.unwrap_or_else(|| StorageError::NotFound(key.to_string())))
    }

    async fn get_short_key(&self, original_url: &str) -> Result<Option<ShortKey>> {
        for backend in &self.backends {
            match backend.get_short_key(original_url).await {
                Ok(Some(key)) => {
                    // Backends without tombstones can still return a key that
                    // an earlier backend has marked deleted.
                    if let Err(StorageError::Deleted(_)) = self.get_original_url(&key).await {
                        debug!(backend = backend.name(), key = %key, "ignoring deleted short key");
                        continue;
                    }
                    debug!(backend = backend.name(), key = %key, "found existing short key");
                    return Ok(Some(key));
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(backend = backend.name(), error = %err, "backend reverse lookup failed");
                }
            }
        }
        Ok(None)
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<UrlMapping>> {
        let mut first_error = None;

        for backend in &self.backends {
            match backend.list_by_owner(owner).await {
                Ok(mappings) if !mappings.is_empty() => return Ok(mappings),
                Ok(_) => {}
                Err(err) if err.is_unsupported() => {}
                Err(err) => {
                    warn!(backend = backend.name(), owner = %owner, error = %err, "backend listing failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(Vec::new()),
        }
    }

    async fn delete_batch(&self, owner: &OwnerId, keys: &[ShortKey]) -> Result<()> {
        for backend in &self.backends {
            match backend.delete_batch(owner, keys).await {
                Ok(()) => trace!(backend = backend.name(), owner = %owner, "backend applied delete"),
                Err(err) if err.is_unsupported() => {}
                Err(err) => {
                    warn!(backend = backend.name(), owner = %owner, error = %err, "backend failed to delete")
                }
            }
        }
        Ok(())
    }

    async fn check_connection(&self) -> Result<()> {
        let mut probed = 0usize;

        for backend in &self.backends {
            match backend.check_connection().await {
                Ok(()) => probed += 1,
                Err(err) if err.is_unsupported() => {}
                Err(err) => {
                    warn!(backend = backend.name(), error = %err, "backend health check failed");
                    return Err(err);
                }
            }
        }

        if probed == 0 {
            return Err(StorageError::Unavailable(
                "no backend supports health checks".to_string(),
            ));
        }
        Ok(())
    }
}
