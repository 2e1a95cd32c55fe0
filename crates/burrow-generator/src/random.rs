use crate::Generator;
use burrow_core::short_key::GENERATED_LENGTH;
use burrow_core::ShortKey;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates 8-character keys drawn uniformly from `[a-zA-Z0-9]`.
///
/// Each call samples the calling thread's own generator, so concurrent
/// callers never contend on (or correlate through) a shared stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortKey {
        let key: String = std::iter::repeat_with(|| {
            ALPHABET[rand::random_range(0..ALPHABET.len())] as char
        })
        .take(GENERATED_LENGTH)
        .collect();
        ShortKey::new_unchecked(key)
    }
}
