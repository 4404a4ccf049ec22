//! ETag helpers for room reads.
//!
//! A room's ETag names its store version, so `If-None-Match` lets pollers
//! skip unchanged rooms.

use actix_web::http::header::{HeaderMap, IF_NONE_MATCH};

use crate::error::AppError;
use crate::errors::ErrorCode;

/// Generate an ETag for a room resource.
///
/// Format: `"room-{code}-v{version}"` (quoted, per RFC 7232)
///
/// # Example
/// ```
/// # use cardtable::http::etag::room_etag;
/// let etag = room_etag("ABC123", 5);
/// assert_eq!(etag, r#""room-ABC123-v5""#);
/// ```
pub fn room_etag(code: &str, version: i32) -> String {
    format!(r#""room-{code}-v{version}""#)
}

/// Parse the version out of a room ETag.
///
/// # Errors
/// `AppError::bad_request` with `ErrorCode::InvalidHeader` when the value is
/// not of the form `"room-{code}-v{version}"`.
pub fn parse_room_version_from_etag(s: &str) -> Result<i32, AppError> {
    let s = s.trim().trim_start_matches("W/").trim_matches('"');

    let Some(rest) = s.strip_prefix("room-") else {
        return Err(AppError::bad_request(
            ErrorCode::InvalidHeader,
            format!("Invalid ETag format: expected \"room-{{code}}-v{{version}}\", got: \"{s}\""),
        ));
    };
    let version_start = rest.rfind("-v").ok_or_else(|| {
        AppError::bad_request(
            ErrorCode::InvalidHeader,
            format!("Invalid ETag format: missing version marker in \"{s}\""),
        )
    })? + 2;

    let version_str = &rest[version_start..];
    version_str.parse::<i32>().map_err(|_| {
        AppError::bad_request(
            ErrorCode::InvalidHeader,
            format!("Invalid ETag format: version must be a valid integer, got: \"{version_str}\""),
        )
    })
}

/// Whether `If-None-Match` already names `etag` (or is `*`).
pub fn if_none_match_hits(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(IF_NONE_MATCH)
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}
