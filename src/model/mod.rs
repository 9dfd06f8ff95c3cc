//! Annotation page entity model
//!
//! Normalized in-memory representation of one page's annotations. The
//! loader builds these, the repository stores them and the IIIF templates
//! render them.

mod types;

pub use types::{
    Annotation, AnnotationType, Page, Target, TextResource, UnknownAnnotationType,
};
