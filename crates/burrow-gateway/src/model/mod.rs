mod url;

pub use self::url::{BatchShortenItem, ShortenRequest, ShortenResponse, UserUrl};
