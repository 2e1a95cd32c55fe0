use async_trait::async_trait;
use burrow_core::{
    BatchEntry, BatchItem, OwnerId, Resolution, SaveOutcome, ShortKey, Shortened, Shortener,
    ShortenerError, Storage, StorageError, UrlMapping,
};
use burrow_generator::Generator;
use std::sync::Arc;
use tracing::{debug, info, trace};
use url::Url;

type Result<T> = std::result::Result<T, ShortenerError>;

/// The concrete [`Shortener`] used by the gateway.
///
/// Wraps a [`Storage`] (normally a
/// [`CompositeStorage`](../burrow_storage/struct.CompositeStorage.html)) and
/// a [`Generator`]:
/// - URL validation happens before any storage call
/// - a URL that already has a key gets that key back with
///   [`SaveOutcome::Conflict`] and nothing is written
/// - otherwise a fresh key is generated and saved
///
/// Generated keys are not retried on collision. A duplicate key is rejected
/// by the backends that enforce uniqueness and surfaces as a storage error
/// only when every backend rejected it.
#[derive(Debug)]
pub struct ShortenerService<S, G> {
    storage: Arc<S>,
    generator: Arc<G>,
}

impl<S, G> Clone for ShortenerService<S, G> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<S: Storage, G: Generator> ShortenerService<S, G> {
    pub fn new(storage: S, generator: G) -> Self {
        Self::from_shared(Arc::new(storage), Arc::new(generator))
    }

    /// Creates a service over storage and a generator that are shared elsewhere.
    pub fn from_shared(storage: Arc<S>, generator: Arc<G>) -> Self {
        Self { storage, generator }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Trims the input and checks that it is an absolute URL with a host.
    ///
    /// The trimmed input, not the parsed form, is what gets stored, so that
    /// reverse lookups match the caller's exact text.
    fn validate_url(raw: &str) -> Result<&str> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        let parsed = Url::parse(trimmed)
            .map_err(|e| ShortenerError::InvalidUrl(format!("{trimmed}: {e}")))?;
        if !parsed.has_host() {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a host: {trimmed}"
            )));
        }

        Ok(trimmed)
    }

    /// Reuses the existing key for `url` or generates and saves a new one.
    /// `url` must already be validated.
    async fn shorten_valid(&self, owner: &OwnerId, url: &str) -> Result<Shortened> {
        if let Some(key) = self.storage.get_short_key(url).await? {
            debug!(key = %key, "url already shortened");
            return Ok(Shortened {
                key,
                outcome: SaveOutcome::Conflict,
            });
        }

        let key = self.generator.generate();
        self.storage.save(owner, url, &key).await?;

        debug!(key = %key, owner = %owner, "created short key");
        Ok(Shortened {
            key,
            outcome: SaveOutcome::Created,
        })
    }
}

#[async_trait]
impl<S: Storage, G: Generator> Shortener for ShortenerService<S, G> {
    async fn shorten(&self, owner: &OwnerId, original_url: &str) -> Result<Shortened> {
        let url = Self::validate_url(original_url)?;
        self.shorten_valid(owner, url).await
    }

    async fn shorten_batch(
        &self,
        owner: &OwnerId,
        items: Vec<BatchItem>,
    ) -> Result<Vec<BatchEntry>> {
        if items.is_empty() {
            return Err(ShortenerError::EmptyBatch);
        }

        // Reject the whole batch before anything is written.
        for item in &items {
            Self::validate_url(&item.original_url)?;
        }

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let url = Self::validate_url(&item.original_url)?;
            let shortened = self.shorten_valid(owner, url).await?;
            entries.push(BatchEntry {
                correlation_id: item.correlation_id,
                key: shortened.key,
                outcome: shortened.outcome,
            });
        }

        info!(owner = %owner, count = entries.len(), "shortened batch");
        Ok(entries)
    }

    async fn resolve(&self, key: &str) -> Result<Resolution> {
        let key = ShortKey::new(key)?;

        match self.storage.get_original_url(&key).await {
            Ok(url) => Ok(Resolution::Found(url)),
            Err(StorageError::NotFound(_)) => Ok(Resolution::NotFound),
            Err(StorageError::Deleted(_)) => Ok(Resolution::Deleted),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<UrlMapping>> {
        Ok(self.storage.list_by_owner(owner).await?)
    }

    async fn delete_batch(&self, owner: &OwnerId, keys: Vec<String>) -> Result<()> {
        if keys.is_empty() {
            return Err(ShortenerError::EmptyBatch);
        }

        let requested = keys.len();
        let keys: Vec<ShortKey> = keys
            .into_iter()
            .filter_map(|raw| match ShortKey::new(raw) {
                Ok(key) => Some(key),
                Err(err) => {
                    trace!(error = %err, "dropping invalid key from delete batch");
                    None
                }
            })
            .collect();

        if keys.is_empty() {
            debug!(owner = %owner, requested, "no valid keys to delete");
            return Ok(());
        }

        self.storage.delete_batch(owner, &keys).await?;
        info!(owner = %owner, requested, accepted = keys.len(), "processed delete batch");
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(self.storage.check_connection().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_generator::SeqGenerator;
    use burrow_storage::{CompositeStorage, FileStorage, InMemoryStorage};
    use tempfile::TempDir;

    fn owner(s: &str) -> OwnerId {
        OwnerId::new(s)
    }

    fn test_service() -> ShortenerService<InMemoryStorage, SeqGenerator> {
        ShortenerService::new(InMemoryStorage::new(), SeqGenerator::with_prefix("AbCd"))
    }

    fn item(id: &str, url: &str) -> BatchItem {
        BatchItem {
            correlation_id: id.to_string(),
            original_url: url.to_string(),
        }
    }

    /// Generates the same key every time.
    struct FixedGenerator;

    impl Generator for FixedGenerator {
        fn generate(&self) -> ShortKey {
            ShortKey::new_unchecked("SameSame")
        }
    }

    #[tokio::test]
    async fn shorten_creates_then_conflicts() {
        let service = test_service();

        let first = service.shorten(&owner("u1"), "https://a.example/").await.unwrap();
        assert_eq!(first.outcome, SaveOutcome::Created);
        assert_eq!(first.key.as_str(), "AbCd0000");

        let second = service.shorten(&owner("u1"), "https://a.example/").await.unwrap();
        assert_eq!(second.outcome, SaveOutcome::Conflict);
        assert_eq!(second.key, first.key);

        // No second write happened.
        assert_eq!(service.storage().len(), 1);
    }

    #[tokio::test]
    async fn shorten_trims_surrounding_whitespace() {
        let service = test_service();

        let created = service
            .shorten(&owner("u1"), "  https://a.example/\n")
            .await
            .unwrap();
        assert_eq!(
            service.storage().get_short_key("https://a.example/").await.unwrap(),
            Some(created.key)
        );
    }

    #[tokio::test]
    async fn shorten_rejects_invalid_urls_before_storage() {
        let service = test_service();

        for raw in ["", "   ", "not a url", "/relative/path", "mailto:someone@example.com"] {
            let err = service.shorten(&owner("u1"), raw).await.unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidUrl(_)), "{raw:?}");
        }
        assert!(service.storage().is_empty());
    }

    #[tokio::test]
    async fn conflict_is_reported_across_owners() {
        let service = test_service();

        let created = service.shorten(&owner("u1"), "https://a.example/").await.unwrap();
        let reused = service.shorten(&owner("u2"), "https://a.example/").await.unwrap();

        assert_eq!(reused.outcome, SaveOutcome::Conflict);
        assert_eq!(reused.key, created.key);
    }

    #[tokio::test]
    async fn colliding_generated_key_surfaces_storage_error() {
        let service = ShortenerService::new(InMemoryStorage::new(), FixedGenerator);

        service.shorten(&owner("u1"), "https://a.example/").await.unwrap();
        let err = service
            .shorten(&owner("u1"), "https://b.example/")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::Storage(StorageError::AllBackendsFailed(_))
                | ShortenerError::Storage(StorageError::ConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn resolve_follows_lifecycle() {
        let service = test_service();

        let created = service.shorten(&owner("u1"), "https://a.example/").await.unwrap();
        assert_eq!(
            service.resolve(created.key.as_str()).await.unwrap(),
            Resolution::Found("https://a.example/".to_string())
        );

        service
            .delete_batch(&owner("u1"), vec![created.key.to_string()])
            .await
            .unwrap();
        assert_eq!(
            service.resolve(created.key.as_str()).await.unwrap(),
            Resolution::Deleted
        );
    }

    #[tokio::test]
    async fn resolve_unknown_and_invalid_keys() {
        let service = test_service();

        assert_eq!(
            service.resolve("nosuchkey").await.unwrap(),
            Resolution::NotFound
        );
        assert!(matches!(
            service.resolve("no/such key").await.unwrap_err(),
            ShortenerError::InvalidShortKey(_)
        ));
        assert!(matches!(
            service.resolve("waytoolongkey").await.unwrap_err(),
            ShortenerError::InvalidShortKey(_)
        ));
    }

    #[tokio::test]
    async fn batch_preserves_order_and_correlation_ids() {
        let service = test_service();
        service.shorten(&owner("u1"), "https://b.example/").await.unwrap();

        let entries = service
            .shorten_batch(
                &owner("u1"),
                vec![
                    item("one", "https://a.example/"),
                    item("two", "https://b.example/"),
                    item("three", "https://c.example/"),
                ],
            )
            .await
            .unwrap();

        let ids: Vec<_> = entries.iter().map(|e| e.correlation_id.as_str()).collect();
        assert_eq!(ids, vec!["one", "two", "three"]);
        assert_eq!(entries[0].outcome, SaveOutcome::Created);
        assert_eq!(entries[1].outcome, SaveOutcome::Conflict);
        assert_eq!(entries[1].key.as_str(), "AbCd0000");
        assert_eq!(entries[2].outcome, SaveOutcome::Created);
    }

    #[tokio::test]
    async fn batch_with_invalid_url_writes_nothing() {
        let service = test_service();

        let err = service
            .shorten_batch(
                &owner("u1"),
                vec![item("ok", "https://a.example/"), item("bad", "nope")],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenerError::InvalidUrl(_)));
        assert!(service.storage().is_empty());
    }

    #[tokio::test]
    async fn empty_batches_are_rejected() {
        let service = test_service();

        assert_eq!(
            service.shorten_batch(&owner("u1"), Vec::new()).await.unwrap_err(),
            ShortenerError::EmptyBatch
        );
        assert_eq!(
            service.delete_batch(&owner("u1"), Vec::new()).await.unwrap_err(),
            ShortenerError::EmptyBatch
        );
    }

    #[tokio::test]
    async fn delete_batch_drops_invalid_keys() {
        let service = test_service();
        let created = service.shorten(&owner("u1"), "https://a.example/").await.unwrap();

        service
            .delete_batch(
                &owner("u1"),
                vec!["x".to_string(), "bad key!".to_string(), created.key.to_string()],
            )
            .await
            .unwrap();

        assert_eq!(
            service.resolve(created.key.as_str()).await.unwrap(),
            Resolution::Deleted
        );

        // Nothing valid left is still a successful no-op.
        service
            .delete_batch(&owner("u1"), vec!["??".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_by_owner_returns_only_callers_mappings() {
        let service = test_service();
        service.shorten(&owner("u1"), "https://a.example/").await.unwrap();
        service.shorten(&owner("u2"), "https://b.example/").await.unwrap();
        service.shorten(&owner("u1"), "https://c.example/").await.unwrap();

        let listed = service.list_by_owner(&owner("u1")).await.unwrap();
        let urls: Vec<_> = listed.iter().map(|m| m.original_url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example/", "https://c.example/"]);
    }

    #[tokio::test]
    async fn scenario_over_composite_storage() {
        let dir = TempDir::new().unwrap();
        let memory: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let file: Arc<dyn Storage> = Arc::new(
            FileStorage::open(dir.path().join("urls.jsonl"))
                .await
                .unwrap(),
        );
        let service = ShortenerService::new(
            CompositeStorage::new(vec![memory, file]),
            SeqGenerator::with_prefix("AbCd"),
        );

        let created = service.shorten(&owner("u1"), "https://a.example/").await.unwrap();
        assert_eq!(created.outcome, SaveOutcome::Created);

        let repeated = service.shorten(&owner("u1"), "https://a.example/").await.unwrap();
        assert_eq!(repeated.outcome, SaveOutcome::Conflict);
        assert_eq!(repeated.key, created.key);

        assert_eq!(
            service.resolve(created.key.as_str()).await.unwrap(),
            Resolution::Found("https://a.example/".to_string())
        );

        service
            .delete_batch(&owner("u1"), vec![created.key.to_string()])
            .await
            .unwrap();
        assert_eq!(
            service.resolve(created.key.as_str()).await.unwrap(),
            Resolution::Deleted
        );
    }

    #[tokio::test]
    async fn shortening_a_deleted_url_issues_a_fresh_key() {
        let dir = TempDir::new().unwrap();
        let memory: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let file: Arc<dyn Storage> = Arc::new(
            FileStorage::open(dir.path().join("urls.jsonl"))
                .await
                .unwrap(),
        );
        let service = ShortenerService::new(
            CompositeStorage::new(vec![memory, file]),
            SeqGenerator::with_prefix("AbCd"),
        );

        let first = service.shorten(&owner("u1"), "https://a.example/").await.unwrap();
        service
            .delete_batch(&owner("u1"), vec![first.key.to_string()])
            .await
            .unwrap();

        let again = service.shorten(&owner("u1"), "https://a.example/").await.unwrap();
        assert_eq!(again.outcome, SaveOutcome::Created);
        assert_ne!(again.key, first.key);
        assert_eq!(
            service.resolve(again.key.as_str()).await.unwrap(),
            Resolution::Found("https://a.example/".to_string())
        );
        assert_eq!(
            service.resolve(first.key.as_str()).await.unwrap(),
            Resolution::Deleted
        );
    }

    #[tokio::test]
    async fn health_check_without_database_fails() {
        let dir = TempDir::new().unwrap();
        let memory: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let file: Arc<dyn Storage> = Arc::new(
            FileStorage::open(dir.path().join("urls.jsonl"))
                .await
                .unwrap(),
        );
        let service = ShortenerService::new(
            CompositeStorage::new(vec![memory, file]),
            SeqGenerator::with_prefix("AbCd"),
        );

        assert!(matches!(
            service.health_check().await.unwrap_err(),
            ShortenerError::Storage(StorageError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_shortens_produce_distinct_keys() {
        let service = Arc::new(ShortenerService::new(
            InMemoryStorage::new(),
            burrow_generator::RandomGenerator::new(),
        ));
        let mut handles = Vec::new();

        for i in 0..100 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .shorten(&owner("u1"), &format!("https://example{i}.com/"))
                    .await
                    .unwrap()
                    .key
            }));
        }

        let mut keys = std::collections::HashSet::new();
        for handle in handles {
            keys.insert(handle.await.unwrap());
        }
        assert_eq!(keys.len(), 100);
        assert_eq!(service.storage().len(), 100);
    }
}
