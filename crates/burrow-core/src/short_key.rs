use crate::error::ShortenerError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::Display;

/// A validated short key identifying a shortened URL.
///
/// Keys must be 3-10 characters long and contain only alphanumeric
/// characters, hyphens, or underscores. Generated keys are always
/// [`GENERATED_LENGTH`] alphanumeric characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortKey(String);

/// Length of keys produced by the key generators.
pub const GENERATED_LENGTH: usize = 8;

const MIN_LENGTH: usize = 3;
/// Matches the width of the `short_key` column.
const MAX_LENGTH: usize = 10;

impl ShortKey {
    /// Creates a new `ShortKey` after validating the input.
    ///
    /// Valid keys are 3-10 characters and contain only `[a-zA-Z0-9_-]`.
    pub fn new(key: impl Into<String>) -> std::result::Result<Self, ShortenerError> {
        let key = key.into();
        Self::validate(&key)?;
        Ok(Self(key))
    }

    /// Creates a `ShortKey` without validation.
    ///
    /// Use this only for keys produced by trusted internal sources
    /// (generators, rows read back from a backend).
    pub fn new_unchecked(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Builds the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the short key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    fn validate(key: &str) -> std::result::Result<(), ShortenerError> {
        if key.len() < MIN_LENGTH || key.len() > MAX_LENGTH {
            return Err(ShortenerError::InvalidShortKey(format!(
                "length must be between {} and {}, got {}",
                MIN_LENGTH,
                MAX_LENGTH,
                key.len()
            )));
        }

        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ShortenerError::InvalidShortKey(format!(
                "must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                key
            )));
        }

        Ok(())
    }
}

impl Display for ShortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ShortKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_keys() {
        assert!(ShortKey::new("abc").is_ok());
        assert!(ShortKey::new("AbCd1234").is_ok());
        assert!(ShortKey::new("Abc-12_xyz").is_ok());
        assert!(ShortKey::new("a".repeat(10)).is_ok());
        assert!(ShortKey::new("nosuchkey").is_ok());
    }

    #[test]
    fn too_short() {
        assert!(ShortKey::new("ab").is_err());
        assert!(ShortKey::new("").is_err());
    }

    #[test]
    fn too_long() {
        assert!(ShortKey::new("a".repeat(11)).is_err());
        assert!(ShortKey::new("doesnotexist").is_err());
    }

    #[test]
    fn invalid_characters() {
        assert!(ShortKey::new("abc def").is_err());
        assert!(ShortKey::new("abc/def").is_err());
        assert!(ShortKey::new("abc!def").is_err());
    }

    #[test]
    fn to_url_trims_trailing_slash() {
        let key = ShortKey::new("abc123").unwrap();
        assert_eq!(key.to_url("http://localhost:8080"), "http://localhost:8080/abc123");
        assert_eq!(key.to_url("http://localhost:8080/"), "http://localhost:8080/abc123");
    }

    #[test]
    fn display() {
        let key = ShortKey::new_unchecked("AbCd1234");
        assert_eq!(key.to_string(), "AbCd1234");
        assert_eq!(key.as_str(), "AbCd1234");
    }
}
