//! Precondition evaluation for `If-Match` and `If-None-Match`

/// What to send back for a conditional request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 200 with headers and (for GET) the body
    Full,
    /// 304 with headers only
    NotModified,
    /// 412, no representation headers, no body
    PreconditionFailed,
}

/// Decide the response for the current ETag and the raw precondition headers.
///
/// Both headers hold comma separated ETags. A header consisting of `*` alone
/// (bare or quoted) matches any existing resource. `If-Match` is checked first.
pub fn evaluate(etag: &str, if_match: Option<&str>, if_none_match: Option<&str>) -> Disposition {
    if let Some(header) = if_match {
        if !matches_any(header, etag) {
            return Disposition::PreconditionFailed;
        }
    }
    if let Some(header) = if_none_match {
        if matches_any(header, etag) {
            return Disposition::NotModified;
        }
    }
    Disposition::Full
}

fn matches_any(header: &str, etag: &str) -> bool {
    let header = header.trim();
    if header == "*" || header == "\"*\"" {
        return true;
    }
    header.split(',').map(str::trim).any(|token| token == etag)
}
