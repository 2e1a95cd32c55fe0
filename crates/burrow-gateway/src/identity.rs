use axum::extract::Request;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use burrow_core::OwnerId;
use tracing::{debug, warn};

/// Name of the cookie carrying the caller's owner id.
pub const OWNER_COOKIE: &str = "user_id";

/// Lifetime of a freshly minted owner cookie, in seconds.
pub const OWNER_COOKIE_MAX_AGE: u64 = 86_400;

/// Attaches an [`OwnerId`] to every request.
///
/// The id comes from the `user_id` cookie when it holds a valid UUID.
/// Otherwise a new id is minted and returned in a `Set-Cookie` header.
/// Handlers read it with `Extension<OwnerId>`.
pub async fn owner_identity(mut request: Request, next: Next) -> Response {
    let (owner, minted) = match owner_from_headers(request.headers()) {
        Some(owner) => (owner, false),
        None => {
            let owner = OwnerId::generate();
            debug!(owner = %owner, "minted owner id");
            (owner, true)
        }
    };

    request.extensions_mut().insert(owner.clone());
    let mut response = next.run(request).await;

    if minted {
        match HeaderValue::from_str(&owner_cookie(&owner)) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => warn!(error = %err, "failed to encode owner cookie"),
        }
    }

    response
}

/// Finds the owner cookie among every `Cookie` header and validates it.
pub fn owner_from_headers(headers: &HeaderMap) -> Option<OwnerId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == OWNER_COOKIE)
        .and_then(|(_, value)| OwnerId::parse(value.trim_matches('"')))
}

fn owner_cookie(owner: &OwnerId) -> String {
    format!("{OWNER_COOKIE}={owner}; Path=/; Max-Age={OWNER_COOKIE_MAX_AGE}; HttpOnly")
}
