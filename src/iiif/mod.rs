//! IIIF Presentation rendering
//!
//! Version negotiation plus the v2 (`sc:AnnotationList`) and v3
//! (`AnnotationPage`) JSON-LD templates for annotation pages.

mod format;
pub mod v2;
pub mod v3;

pub use format::{IiifVersion, CONTEXT_V2, CONTEXT_V3, MEDIA_TYPE_JSONLD};

use crate::error::{AppError, Result};
use crate::model::{Annotation, Page, Target};

/// Base urls used to build the ids in rendered documents
#[derive(Debug, Clone)]
pub struct IiifUrls {
    pub iiif_base_url: String,
    pub resource_base_url: String,
}

impl IiifUrls {
    pub fn annotation_page(&self, page: &Page) -> String {
        format!(
            "{}/{}/{}/annopage/{}",
            self.iiif_base_url.trim_end_matches('/'),
            page.dataset_id,
            page.local_id,
            page.page_id
        )
    }

    pub fn annotation(&self, page: &Page, annotation: &Annotation) -> String {
        format!(
            "{}/{}/{}/anno/{}",
            self.iiif_base_url.trim_end_matches('/'),
            page.dataset_id,
            page.local_id,
            annotation.id
        )
    }

    pub fn resource(&self, page: &Page) -> String {
        format!(
            "{}/{}/{}/{}",
            self.resource_base_url.trim_end_matches('/'),
            page.dataset_id,
            page.local_id,
            page.resource.id
        )
    }

    /// Canvas reference, with a media fragment for a region
    pub fn target(&self, page: &Page, target: Option<&Target>) -> String {
        match target {
            Some(target) => format!("{}#xywh={}", page.target_id, target.xywh()),
            None => page.target_id.clone(),
        }
    }
}

/// Render a whole annotation page in the requested version
pub fn render_page(version: IiifVersion, page: &Page, urls: &IiifUrls) -> Result<String> {
    let json = match version {
        IiifVersion::V2 => serde_json::to_string(&v2::AnnotationPageV2::new(page, urls))?,
        IiifVersion::V3 => serde_json::to_string(&v3::AnnotationPageV3::new(page, urls))?,
    };
    Ok(json)
}

/// Render one annotation of a page as a standalone document
pub fn render_annotation(
    version: IiifVersion,
    page: &Page,
    annotation_id: &str,
    urls: &IiifUrls,
) -> Result<String> {
    let annotation = page.annotation(annotation_id).ok_or_else(|| {
        AppError::NotFound(format!("Annotation {}", page.annotation_key(annotation_id)))
    })?;
    let json = match version {
        IiifVersion::V2 => {
            serde_json::to_string(&v2::AnnotationV2::standalone(page, annotation, urls))?
        }
        IiifVersion::V3 => {
            serde_json::to_string(&v3::AnnotationV3::standalone(page, annotation, urls))?
        }
    };
    Ok(json)
}
