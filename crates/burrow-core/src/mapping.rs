use crate::owner::OwnerId;
use crate::short_key::ShortKey;
use serde::{Deserialize, Serialize};

/// A live short key to original URL mapping, as returned by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlMapping {
    pub owner_id: OwnerId,
    pub short_key: ShortKey,
    pub original_url: String,
}
