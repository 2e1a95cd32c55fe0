use crate::error::{Result, StorageError};
use crate::mapping::UrlMapping;
use crate::owner::OwnerId;
use crate::short_key::ShortKey;
use async_trait::async_trait;

/// The capability set every storage backend answers.
///
/// Backends differ in what they can do efficiently. Optional capabilities
/// (`list_by_owner`, `delete_batch`, `check_connection`) default to
/// [`StorageError::Unsupported`], which aggregating callers skip over.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Short label used in logs and aggregated errors.
    fn name(&self) -> &'static str;

    /// Persists a mapping.
    ///
    /// Returns `Err(ConstraintViolation)` if the key already exists in this
    /// backend. Saving the same URL under a different key is accepted.
    async fn save(&self, owner: &OwnerId, original_url: &str, key: &ShortKey) -> Result<()>;

    /// Resolves a key to its original URL.
    ///
    /// Returns `Err(NotFound)` if the key is absent and `Err(Deleted)` if it
    /// exists but has been soft-deleted.
    async fn get_original_url(&self, key: &ShortKey) -> Result<String>;

    /// Reverse lookup used for deduplication.
    /// Returns `None` when no live mapping exists for the URL.
    async fn get_short_key(&self, original_url: &str) -> Result<Option<ShortKey>>;

    /// Lists the live mappings created by `owner`, oldest first.
    async fn list_by_owner(&self, _owner: &OwnerId) -> Result<Vec<UrlMapping>> {
        Err(StorageError::Unsupported(self.name()))
    }

    /// Soft-deletes the given keys if they belong to `owner`.
    ///
    /// Keys that are absent, already deleted or owned by someone else are
    /// ignored.
    async fn delete_batch(&self, _owner: &OwnerId, _keys: &[ShortKey]) -> Result<()> {
        Err(StorageError::Unsupported(self.name()))
    }

    /// Probes the backend's connectivity.
    async fn check_connection(&self) -> Result<()> {
        Err(StorageError::Unsupported(self.name()))
    }
}

#[async_trait]
impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn save(&self, owner: &OwnerId, original_url: &str, key: &ShortKey) -> Result<()> {
        (**self).save(owner, original_url, key).await
    }

    async fn get_original_url(&self, key: &ShortKey) -> Result<String> {
        (**self).get_original_url(key).await
    }

    async fn get_short_key(&self, original_url: &str) -> Result<Option<ShortKey>> {
        (**self).get_short_key(original_url).await
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<UrlMapping>> {
        (**self).list_by_owner(owner).await
    }

    async fn delete_batch(&self, owner: &OwnerId, keys: &[ShortKey]) -> Result<()> {
        (**self).delete_batch(owner, keys).await
    }

    async fn check_connection(&self) -> Result<()> {
        (**self).check_connection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WriteOnly;

    #[async_trait]
    impl Storage for WriteOnly {
        fn name(&self) -> &'static str {
            "write-only"
        }

        async fn save(&self, _: &OwnerId, _: &str, _: &ShortKey) -> Result<()> {
            Ok(())
        }

        async fn get_original_url(&self, key: &ShortKey) -> Result<String> {
            Err(StorageError::NotFound(key.to_string()))
        }

        async fn get_short_key(&self, _: &str) -> Result<Option<ShortKey>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn optional_capabilities_default_to_unsupported() {
        let storage = WriteOnly;
        let owner = OwnerId::new("owner");

        let err = storage.list_by_owner(&owner).await.unwrap_err();
        assert_eq!(err, StorageError::Unsupported("write-only"));

        let err = storage.delete_batch(&owner, &[]).await.unwrap_err();
        assert!(err.is_unsupported());

        let err = storage.check_connection().await.unwrap_err();
        assert!(err.is_unsupported());
    }

    #[tokio::test]
    async fn arc_forwards_to_inner_storage() {
        let storage: std::sync::Arc<dyn Storage> = std::sync::Arc::new(WriteOnly);
        assert_eq!(storage.name(), "write-only");
        let err = storage
            .get_original_url(&ShortKey::new_unchecked("abc"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
