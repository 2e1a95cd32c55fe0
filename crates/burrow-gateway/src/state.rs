use std::sync::Arc;
use std::time::Duration;

use burrow_core::{ShortKey, Shortener};

pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    base_url: String,
    delete_timeout: Duration,
}

impl AppState {
    pub fn new(shortener: Arc<dyn Shortener>, public_base_url: impl Into<String>) -> Self {
        Self {
            shortener,
            base_url: public_base_url.into(),
            delete_timeout: DEFAULT_DELETE_TIMEOUT,
        }
    }

    /// Sets the deadline for background batch deletes.
    pub fn with_delete_timeout(mut self, timeout: Duration) -> Self {
        self.delete_timeout = timeout;
        self
    }

    pub fn shortener(&self) -> &Arc<dyn Shortener> {
        &self.shortener
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn delete_timeout(&self) -> Duration {
        self.delete_timeout
    }

    /// Public URL that redirects to the mapping behind `key`.
    pub fn short_url(&self, key: &ShortKey) -> String {
        key.to_url(&self.base_url)
    }
}
