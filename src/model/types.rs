//! Annotation page entities
//!
//! A [`Page`] is the per-canvas aggregate produced by the loader: one
//! transcribed [`TextResource`] plus the positional [`Annotation`]s that
//! point into it. Entities are immutable once a page has been built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Annotation granularity, stored as a single upper-case letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub enum AnnotationType {
    /// Single word (`W`)
    Word,
    /// Line of text (`L`)
    Line,
    /// Block or paragraph (`B`)
    Block,
    /// The whole page (`P`), the only type that may lack a target
    Page,
    /// Media fragment (`M`)
    Media,
    /// Caption (`C`)
    Caption,
}

impl AnnotationType {
    /// Single-letter storage code
    pub fn code(self) -> char {
        match self {
            AnnotationType::Word => 'W',
            AnnotationType::Line => 'L',
            AnnotationType::Block => 'B',
            AnnotationType::Page => 'P',
            AnnotationType::Media => 'M',
            AnnotationType::Caption => 'C',
        }
    }

    /// Lower-case granularity name used by the IIIF templates
    pub fn name(self) -> &'static str {
        match self {
            AnnotationType::Word => "word",
            AnnotationType::Line => "line",
            AnnotationType::Block => "block",
            AnnotationType::Page => "page",
            AnnotationType::Media => "media",
            AnnotationType::Caption => "caption",
        }
    }

    /// Whether an annotation of this type must carry at least one target
    pub fn requires_target(self) -> bool {
        self != AnnotationType::Page
    }
}

impl TryFrom<char> for AnnotationType {
    type Error = UnknownAnnotationType;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code.to_ascii_uppercase() {
            'W' => Ok(AnnotationType::Word),
            'L' => Ok(AnnotationType::Line),
            'B' => Ok(AnnotationType::Block),
            'P' => Ok(AnnotationType::Page),
            'M' => Ok(AnnotationType::Media),
            'C' => Ok(AnnotationType::Caption),
            other => Err(UnknownAnnotationType(other)),
        }
    }
}

impl From<AnnotationType> for char {
    fn from(kind: AnnotationType) -> Self {
        kind.code()
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Rejected annotation type letter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown annotation type '{0}'")]
pub struct UnknownAnnotationType(pub char);

/// Pixel rectangle on the canvas image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub x: u32,
    pub y: u32,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
}

impl Target {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Media fragment form, `x,y,w,h`
    pub fn xywh(&self) -> String {
        format!("{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// The full text a page's annotations refer to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResource {
    pub id: String,
    pub dataset_id: String,
    pub local_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// One positional annotation (word, line, block or the whole page)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Start character offset into the resource text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_start: Option<u32>,
    /// End character offset into the resource text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_end: Option<u32>,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl Annotation {
    /// Character range, when both offsets were present in the document
    pub fn text_range(&self) -> Option<(u32, u32)> {
        Some((self.text_start?, self.text_end?))
    }
}

/// Annotation page: everything known about one canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub dataset_id: String,
    pub local_id: String,
    pub page_id: String,
    /// Canvas (target image) base url, without any `#xywh=` fragment
    pub target_id: String,
    pub modified: DateTime<Utc>,
    pub resource: TextResource,
    pub annotations: Vec<Annotation>,
}

impl Page {
    /// Look up an annotation by id
    pub fn annotation(&self, annotation_id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == annotation_id)
    }

    /// Identity key of the page, also the ETag identity of its annotation page
    pub fn key(&self) -> String {
        format!("{}/{}/annopage/{}", self.dataset_id, self.local_id, self.page_id)
    }

    /// Identity key of one annotation on this page, also its ETag identity
    pub fn annotation_key(&self, annotation_id: &str) -> String {
        format!("{}/{}/anno/{}", self.dataset_id, self.local_id, annotation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_page() -> Page {
        Page {
            dataset_id: "ds1".to_string(),
            local_id: "lc1".to_string(),
            page_id: "pg1".to_string(),
            target_id: "https://iiif.example.org/ds1/lc1/canvas/p1".to_string(),
            modified: Utc.with_ymd_and_hms(2015, 2, 22, 23, 0, 0).unwrap(),
            resource: TextResource {
                id: "ft1".to_string(),
                dataset_id: "ds1".to_string(),
                local_id: "lc1".to_string(),
                language: Some("en".to_string()),
                value: Some("Wickie willah Koeckebacke!".to_string()),
            },
            annotations: vec![
                Annotation {
                    id: "an1".to_string(),
                    annotation_type: AnnotationType::Word,
                    motivation: None,
                    language: None,
                    text_start: Some(0),
                    text_end: Some(7),
                    targets: vec![Target::new(60, 100, 30, 14)],
                },
                Annotation {
                    id: "an2".to_string(),
                    annotation_type: AnnotationType::Page,
                    motivation: None,
                    language: Some("en".to_string()),
                    text_start: None,
                    text_end: None,
                    targets: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_annotation_type_codes() {
        for code in ['W', 'L', 'B', 'P', 'M', 'C'] {
            let kind = AnnotationType::try_from(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert_eq!(AnnotationType::try_from('w').unwrap(), AnnotationType::Word);
        assert_eq!(
            AnnotationType::try_from('X'),
            Err(UnknownAnnotationType('X'))
        );
    }

    #[test]
    fn test_only_page_annotations_may_lack_targets() {
        assert!(!AnnotationType::Page.requires_target());
        assert!(AnnotationType::Word.requires_target());
        assert!(AnnotationType::Line.requires_target());
        assert!(AnnotationType::Block.requires_target());
    }

    #[test]
    fn test_annotation_type_serializes_as_letter() {
        let json = serde_json::to_string(&AnnotationType::Line).unwrap();
        assert_eq!(json, "\"L\"");
        let parsed: AnnotationType = serde_json::from_str("\"B\"").unwrap();
        assert_eq!(parsed, AnnotationType::Block);
        assert!(serde_json::from_str::<AnnotationType>("\"Q\"").is_err());
    }

    #[test]
    fn test_page_json_survives_storage() {
        let page = sample_page();
        let json = serde_json::to_string(&page).unwrap();
        let restored: Page = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, page);
    }

    #[test]
    fn test_page_lookup_and_keys() {
        let page = sample_page();
        assert_eq!(page.annotation("an2").unwrap().annotation_type, AnnotationType::Page);
        assert!(page.annotation("an9").is_none());
        assert_eq!(page.key(), "ds1/lc1/annopage/pg1");
        assert_eq!(page.annotation_key("an1"), "ds1/lc1/anno/an1");
        assert_eq!(page.annotations[0].text_range(), Some((0, 7)));
        assert_eq!(page.annotations[1].text_range(), None);
        assert_eq!(page.annotations[0].targets[0].xywh(), "60,100,30,14");
    }
}
