//! Conditional HTTP responses
//!
//! Applies [`evaluate`](super::evaluate) to a request and assembles the
//! response with the standard representation headers.

use axum::{
    http::{
        header::{self, HeaderName},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use super::conditional::{evaluate, Disposition};
use crate::error::{AppError, Result};

/// RFC 7231 IMF-fixdate
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

const ALLOW_VALUE: &str = "GET, HEAD";
const CACHE_CONTROL_VALUE: &str = "no-cache";
const VARY_VALUE: &str = "Accept";

/// Validators and media type of the representation being served
#[derive(Debug, Clone)]
pub struct Representation {
    pub etag: String,
    pub last_modified: DateTime<Utc>,
    pub content_type: String,
}

/// Format a timestamp as an HTTP date
pub fn http_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format(HTTP_DATE_FORMAT).to_string()
}

/// Build the response for a GET or HEAD request.
///
/// `render` produces the body and is only called for a full GET response.
pub fn conditional_response<F>(
    method: &Method,
    request_headers: &HeaderMap,
    representation: &Representation,
    render: F,
) -> Result<Response>
where
    F: FnOnce() -> Result<String>,
{
    let if_match = header_list(request_headers, header::IF_MATCH);
    let if_none_match = header_list(request_headers, header::IF_NONE_MATCH);

    match evaluate(&representation.etag, if_match.as_deref(), if_none_match.as_deref()) {
        Disposition::PreconditionFailed => Ok(StatusCode::PRECONDITION_FAILED.into_response()),
        Disposition::NotModified => {
            Ok((StatusCode::NOT_MODIFIED, representation_headers(representation)?).into_response())
        }
        Disposition::Full => {
            let headers = representation_headers(representation)?;
            if *method == Method::HEAD {
                return Ok((StatusCode::OK, headers).into_response());
            }
            Ok((StatusCode::OK, headers, render()?).into_response())
        }
    }
}

fn representation_headers(representation: &Representation) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ETAG, header_value(&representation.etag)?);
    headers.insert(
        header::LAST_MODIFIED,
        header_value(&http_date(representation.last_modified))?,
    );
    headers.insert(header::ALLOW, HeaderValue::from_static(ALLOW_VALUE));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
    headers.insert(header::VARY, HeaderValue::from_static(VARY_VALUE));
    headers.insert(header::CONTENT_TYPE, header_value(&representation.content_type)?);
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(format!("Invalid header value '{}': {}", value, e)))
}

/// All values of a request header joined with commas; unreadable values count as empty
fn header_list(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .map(|v| v.to_str().unwrap_or(""))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}
