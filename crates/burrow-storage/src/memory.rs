use async_trait::async_trait;
use burrow_core::error::{Result, StorageError};
use burrow_core::{OwnerId, ShortKey, Storage, UrlMapping};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;

/// In-memory storage entry for a URL mapping.
#[derive(Debug, Clone)]
struct Entry {
    original_url: String,
    deleted: bool,
    /// Insertion order, used to list an owner's mappings oldest first.
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    owners: HashMap<OwnerId, HashMap<ShortKey, Entry>>,
    next_seq: u64,
}

impl Inner {
    fn find(&self, key: &ShortKey) -> Option<&Entry> {
        self.owners.values().find_map(|entries| entries.get(key))
    }
}

/// In-memory implementation of [`Storage`].
///
/// Mappings are grouped by owner behind a single reader/writer lock. Reads
/// share the lock and scan every owner, since neither forward nor reverse
/// lookups are owner-scoped; writes take it exclusively. The lock is never
/// held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    inner: RwLock<Inner>,
}

impl InMemoryStorage {
    /// Creates a new, empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mappings held, including soft-deleted ones.
    pub fn len(&self) -> usize {
        self.inner.read().owners.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn save(&self, owner: &OwnerId, original_url: &str, key: &ShortKey) -> Result<()> {
        let mut inner = self.inner.write();

        // Keys are unique across owners, not just within one.
        if inner.find(key).is_some() {
            return Err(StorageError::ConstraintViolation(key.to_string()));
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.owners.entry(owner.clone()).or_default().insert(
            key.clone(),
            Entry {
                original_url: original_url.to_owned(),
                deleted: false,
                seq,
            },
        );

        trace!(key = %key, owner = %owner, "saved mapping in memory");
        Ok(())
    }

    async fn get_original_url(&self, key: &ShortKey) -> Result<String> {
        let inner = self.inner.read();
        match inner.find(key) {
            Some(entry) if entry.deleted => Err(StorageError::Deleted(key.to_string())),
            Some(entry) => Ok(entry.original_url.clone()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    async fn get_short_key(&self, original_url: &str) -> Result<Option<ShortKey>> {
        let inner = self.inner.read();
        let key = inner
            .owners
            .values()
            .flat_map(|entries| entries.iter())
            .filter(|(_, entry)| !entry.deleted && entry.original_url == original_url)
            .min_by_key(|(_, entry)| entry.seq)
            .map(|(key, _)| key.clone());
        Ok(key)
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<UrlMapping>> {
        let inner = self.inner.read();
        let Some(entries) = inner.owners.get(owner) else {
            return Ok(Vec::new());
        };

        let mut live: Vec<_> = entries.iter().filter(|(_, entry)| !entry.deleted).collect();
        live.sort_by_key(|(_, entry)| entry.seq);

        Ok(live
            .into_iter()
            .map(|(key, entry)| UrlMapping {
                owner_id: owner.clone(),
                short_key: key.clone(),
                original_url: entry.original_url.clone(),
            })
            .collect())
    }

    async fn delete_batch(&self, owner: &OwnerId, keys: &[ShortKey]) -> Result<()> {
        let mut inner = self.inner.write();
        let Some(entries) = inner.owners.get_mut(owner) else {
            return Ok(());
        };

        let mut deleted = 0usize;
        for key in keys {
            if let Some(entry) = entries.get_mut(key) {
                if !entry.deleted {
                    entry.deleted = true;
                    deleted += 1;
                }
            }
        }

        trace!(owner = %owner, requested = keys.len(), deleted, "soft-deleted mappings in memory");
        Ok(())
    }
}
