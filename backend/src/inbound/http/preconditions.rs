//! Conditional request helpers for optimistic concurrency.
//!
//! Student representations carry their version as a strong entity tag of the
//! quoted-integer form `"3"`. Reads honour `If-None-Match`; writes demand an
//! `If-Match` token, which the domain parses and checks against the persisted
//! version.

use actix_web::HttpRequest;
use actix_web::http::header;

use crate::domain::Error;

/// Format a persisted version as its entity tag; version 3 becomes `"3"`.
pub fn etag_for_version(version: i32) -> String {
    format!("\"{version}\"")
}

/// Extract the `If-Match` token for a write.
///
/// Fails with `428 Precondition Required` when the header is absent. The
/// token itself is returned verbatim; parsing it is the domain's concern.
pub fn require_if_match(req: &HttpRequest) -> Result<String, Error> {
    let value = req.headers().get(header::IF_MATCH).ok_or_else(|| {
        Error::precondition_required("If-Match header is required for updates")
    })?;
    value
        .to_str()
        .map(|raw| raw.trim().to_owned())
        .map_err(|_| Error::version_invalid("If-Match header is not valid UTF-8"))
}

/// True when the request's `If-None-Match` header matches `etag`, meaning the
/// client's cached representation is still fresh.
pub fn none_match_satisfied(req: &HttpRequest, etag: &str) -> bool {
    let Some(value) = req.headers().get(header::IF_NONE_MATCH) else {
        return false;
    };
    let Ok(raw) = value.to_str() else {
        return false;
    };
    raw.split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate == etag)
}
