use crate::mapping::UrlMapping;
use crate::owner::OwnerId;
use crate::short_key::ShortKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Whether a create request wrote a new mapping or found an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new key was generated and persisted.
    Created,
    /// The URL already had a key; nothing was written.
    Conflict,
}

/// The result of shortening a single URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortened {
    pub key: ShortKey,
    pub outcome: SaveOutcome,
}

/// The result of resolving a short key.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(String),
    NotFound,
    Deleted,
}

/// One item of a batch create request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

/// One item of a batch create response, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub correlation_id: String,
    pub key: ShortKey,
    pub outcome: SaveOutcome,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Shortens a URL for `owner`, reusing an existing key when one is known.
    async fn shorten(&self, owner: &OwnerId, original_url: &str) -> Result<Shortened>;

    /// Shortens every item of a batch, preserving request order.
    async fn shorten_batch(&self, owner: &OwnerId, items: Vec<BatchItem>)
        -> Result<Vec<BatchEntry>>;

    /// Resolves a raw short key to its original URL.
    async fn resolve(&self, key: &str) -> Result<Resolution>;

    /// Lists the live mappings created by `owner`.
    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<UrlMapping>>;

    /// Soft-deletes the owner's keys. Completion is best-effort.
    async fn delete_batch(&self, owner: &OwnerId, keys: Vec<String>) -> Result<()>;

    /// Reports whether the configured backends are reachable.
    async fn health_check(&self) -> Result<()>;
}
