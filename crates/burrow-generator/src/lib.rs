pub mod random;
pub mod seq;

pub use random::RandomGenerator;
pub use seq::SeqGenerator;

use burrow_core::ShortKey;

/// Trait for generating short keys.
///
/// Implementations are pure generators that don't interact with storage.
/// They make no uniqueness promise; callers look up before writing and
/// storage backends reject duplicate keys.
pub trait Generator: Send + Sync + 'static {
    /// Produces a candidate short key.
    fn generate(&self) -> ShortKey;
}
