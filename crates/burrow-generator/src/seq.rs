use crate::Generator;
use burrow_core::short_key::GENERATED_LENGTH;
use burrow_core::ShortKey;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic generator producing `prefix` followed by a zero-padded
/// counter, e.g. `"AbCd0000"`, `"AbCd0001"`.
///
/// Keys are padded to the generated key length; longer prefixes or counters
/// simply produce longer keys. Useful for tests and local demos where
/// predictable keys matter more than unguessable ones.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            prefix: self.prefix.clone(),
        }
    }
}

impl SeqGenerator {
    /// Creates a new sequential generator with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_offset(prefix, 0)
    }

    /// Creates a new sequential generator starting from a specific counter value.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }
}

impl Generator for SeqGenerator {
    fn generate(&self) -> ShortKey {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        let width = GENERATED_LENGTH.saturating_sub(self.prefix.len());
        ShortKey::new_unchecked(format!("{}{:0width$}", self.prefix, count, width = width))
    }
}
