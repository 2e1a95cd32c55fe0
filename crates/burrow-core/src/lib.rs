//! Core types and traits for the Burrow URL shortener.
//!
//! This crate provides the types shared by the storage adapters, the
//! shortener service and the HTTP gateway: validated identifiers, the
//! error taxonomy and the [`Storage`] capability set every backend answers.

pub mod error;
pub mod mapping;
pub mod owner;
pub mod short_key;
pub mod shortener;
pub mod storage;

pub use error::{BackendFailure, ShortenerError, StorageError};
pub use mapping::UrlMapping;
pub use owner::OwnerId;
pub use short_key::ShortKey;
pub use shortener::{BatchEntry, BatchItem, Resolution, SaveOutcome, Shortened, Shortener};
pub use storage::Storage;
