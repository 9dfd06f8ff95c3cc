//! Validator token generation

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Build an ETag for one representation of a resource.
///
/// The token is a SHA-256 digest over the resource identity, its
/// last-modified time (whole seconds), the representation format tag and the
/// deployment tag, so a redeploy or a format switch yields a new token.
/// Weak tokens carry the `W/` prefix.
pub fn generate_etag(
    identity: &str,
    modified: DateTime<Utc>,
    format_version: &str,
    app_version: &str,
    weak: bool,
) -> String {
    let timestamp = modified.timestamp().to_string();

    let mut hasher = Sha256::new();
    for field in [identity, timestamp.as_str(), format_version, app_version] {
        hasher.update(field.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hex::encode(hasher.finalize());

    if weak {
        format!("W/\"{}\"", digest)
    } else {
        format!("\"{}\"", digest)
    }
}
