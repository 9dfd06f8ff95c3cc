//! IIIF presentation routes
//!
//! GET and HEAD for annotation pages and single annotations, with format
//! negotiation and ETag preconditions.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method},
    response::Response,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::cache::{conditional_response, generate_etag, Representation};
use crate::error::{AppError, Result};
use crate::iiif::{self, IiifVersion};
use crate::state::AppState;

/// Create the presentation router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:dataset_id/:local_id/annopage/:page_id", get(annotation_page))
        .route("/:dataset_id/:local_id/anno/:annotation_id", get(annotation))
}

/// Optional `?format=2|3` override
#[derive(Debug, Default, Deserialize)]
pub struct FormatQuery {
    pub format: Option<String>,
}

/// Annotation page in IIIF v2 or v3
async fn annotation_page(
    State(state): State<AppState>,
    method: Method,
    Path((dataset_id, local_id, page_id)): Path<(String, String, String)>,
    Query(query): Query<FormatQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let page = state
        .pages()
        .fetch_page(&dataset_id, &local_id, &page_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Annotation page {}/{}/annopage/{}",
                dataset_id, local_id, page_id
            ))
        })?;

    let version = negotiate(&query, &headers);
    let identity = page.key();
    let representation = representation(&state, &identity, page.modified, version);
    tracing::debug!(page = %identity, version = version.tag(), "Serving annotation page");

    conditional_response(&method, &headers, &representation, || {
        iiif::render_page(version, &page, state.urls())
    })
}

/// Single annotation in IIIF v2 or v3
async fn annotation(
    State(state): State<AppState>,
    method: Method,
    Path((dataset_id, local_id, annotation_id)): Path<(String, String, String)>,
    Query(query): Query<FormatQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let page = state
        .pages()
        .fetch_annotation_page(&dataset_id, &local_id, &annotation_id)
        .await?
        .filter(|page| page.annotation(&annotation_id).is_some())
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Annotation {}/{}/anno/{}",
                dataset_id, local_id, annotation_id
            ))
        })?;

    let version = negotiate(&query, &headers);
    let identity = page.annotation_key(&annotation_id);
    let representation = representation(&state, &identity, page.modified, version);
    tracing::debug!(annotation = %identity, version = version.tag(), "Serving annotation");

    conditional_response(&method, &headers, &representation, || {
        iiif::render_annotation(version, &page, &annotation_id, state.urls())
    })
}

fn negotiate(query: &FormatQuery, headers: &HeaderMap) -> IiifVersion {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());
    IiifVersion::resolve(query.format.as_deref(), accept)
}

fn representation(
    state: &AppState,
    identity: &str,
    modified: DateTime<Utc>,
    version: IiifVersion,
) -> Representation {
    Representation {
        etag: generate_etag(
            identity,
            modified,
            version.tag(),
            &state.config().fulltext.app_version,
            true,
        ),
        last_modified: modified,
        content_type: version.content_type(),
    }
}
