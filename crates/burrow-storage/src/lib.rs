//! Storage adapters for the Burrow URL shortener.
//!
//! Three backends implement the [`Storage`] capability set:
//!
//! - [`InMemoryStorage`]: the fast path, lives for the process lifetime
//! - [`FileStorage`]: an append-only JSON-lines log, a durability backstop
//! - [`PostgresStorage`]: a relational table with a unique key constraint
//!   and batched soft-delete
//!
//! [`CompositeStorage`] stacks them in priority order behind the same trait.

pub mod composite;
pub mod file;
pub mod memory;
pub mod postgres;

pub use burrow_core::error::{Result, StorageError};
pub use burrow_core::Storage;
pub use composite::CompositeStorage;
pub use file::FileStorage;
pub use memory::InMemoryStorage;
pub use postgres::{PostgresOptions, PostgresStorage};
