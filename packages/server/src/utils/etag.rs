use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Strong entity tag for a response body: quoted hex SHA-256 of its JSON form.
///
/// JSON is hashed whatever format the client negotiated, so the tag for a
/// given state is the same across `.json` and `.xml` requests.
pub fn compute<T: Serialize>(body: &T) -> Result<String, AppError> {
    let canonical = serde_json::to_vec(body)
        .map_err(|e| AppError::Internal(format!("ETag encoding failed: {e}")))?;
    Ok(format!("\"{}\"", hex::encode(Sha256::digest(&canonical))))
}

/// Whether a conditional header value (a comma-separated entity-tag list)
/// names `etag`. `*` only matches when `allow_wildcard` is set.
pub fn header_matches(header: &str, etag: &str, allow_wildcard: bool) -> bool {
    let bare = etag.trim_matches('"');
    header.split(',').map(str::trim).any(|candidate| {
        if candidate == "*" {
            return allow_wildcard;
        }
        let candidate = candidate.strip_prefix("W/").unwrap_or(candidate);
        candidate == etag || candidate.trim_matches('"') == bare
    })
}
