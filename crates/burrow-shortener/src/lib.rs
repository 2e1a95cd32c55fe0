//! URL shortener service implementation.
//!
//! [`ShortenerService`] sits between the HTTP gateway and the storage layer:
//! it validates input, reuses existing keys, generates new ones and maps
//! storage outcomes onto the [`Shortener`](burrow_core::Shortener) contract.

pub mod service;

pub use service::ShortenerService;
