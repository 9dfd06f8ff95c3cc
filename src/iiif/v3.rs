//! IIIF Presentation 3 templates

use serde::Serialize;

use super::{IiifUrls, CONTEXT_V3};
use crate::model::{Annotation, Page};

const ANNOTATION_PAGE_TYPE: &str = "AnnotationPage";
const ANNOTATION_TYPE: &str = "Annotation";
const BODY_TYPE: &str = "SpecificResource";
const SELECTOR_TYPE: &str = "TextPositionSelector";
const DEFAULT_MOTIVATION: &str = "transcribing";

#[derive(Debug, Serialize)]
pub struct AnnotationPageV3 {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub items: Vec<AnnotationV3>,
}

impl AnnotationPageV3 {
    pub fn new(page: &Page, urls: &IiifUrls) -> Self {
        Self {
            context: CONTEXT_V3,
            id: urls.annotation_page(page),
            kind: ANNOTATION_PAGE_TYPE,
            items: page
                .annotations
                .iter()
                .map(|annotation| AnnotationV3::new(page, annotation, urls))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationV3 {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<&'static str>,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub motivation: String,
    pub text_granularity: &'static str,
    pub body: BodyV3,
    pub target: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BodyV3 {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<TextPositionSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TextPositionSelector {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub start: u32,
    pub end: u32,
}

impl AnnotationV3 {
    pub fn new(page: &Page, annotation: &Annotation, urls: &IiifUrls) -> Self {
        let target = if annotation.targets.is_empty() {
            vec![urls.target(page, None)]
        } else {
            annotation
                .targets
                .iter()
                .map(|target| urls.target(page, Some(target)))
                .collect()
        };

        Self {
            context: None,
            id: urls.annotation(page, annotation),
            kind: ANNOTATION_TYPE,
            motivation: motivation(annotation),
            text_granularity: annotation.annotation_type.name(),
            body: BodyV3 {
                kind: BODY_TYPE,
                source: urls.resource(page),
                selector: annotation.text_range().map(|(start, end)| TextPositionSelector {
                    kind: SELECTOR_TYPE,
                    start,
                    end,
                }),
                language: annotation.language.clone(),
            },
            target,
        }
    }

    /// Annotation served on its own, carrying the JSON-LD context
    pub fn standalone(page: &Page, annotation: &Annotation, urls: &IiifUrls) -> Self {
        Self {
            context: Some(CONTEXT_V3),
            ..Self::new(page, annotation, urls)
        }
    }
}

/// Short motivation name: the fragment or last path segment of the stored url
fn motivation(annotation: &Annotation) -> String {
    annotation
        .motivation
        .as_deref()
        .and_then(|url| url.rsplit(&['#', '/'][..]).next())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_MOTIVATION)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iiif::fixtures::{page, urls};
    use serde_json::json;

    #[test]
    fn test_annotation_page() {
        let page = page();
        let value = serde_json::to_value(AnnotationPageV3::new(&page, &urls())).unwrap();

        assert_eq!(value["@context"], CONTEXT_V3);
        assert_eq!(value["type"], "AnnotationPage");
        assert_eq!(value["items"].as_array().unwrap().len(), 2);
        assert_eq!(
            value["items"][1],
            json!({
                "id": "https://iiif.europeana.eu/presentation/ds1/lc1/anno/an1",
                "type": "Annotation",
                "motivation": "transcribing",
                "textGranularity": "word",
                "body": {
                    "type": "SpecificResource",
                    "source": "http://data.europeana.eu/fulltext/ds1/lc1/ft1",
                    "selector": { "type": "TextPositionSelector", "start": 0, "end": 5 }
                },
                "target": ["https://iiif.europeana.eu/image/ds1/lc1/canvas1#xywh=10,20,30,40"]
            })
        );
    }

    #[test]
    fn test_standalone_page_annotation() {
        let page = page();
        let value = serde_json::to_value(AnnotationV3::standalone(&page, &page.annotations[0], &urls())).unwrap();
        assert_eq!(value["@context"], CONTEXT_V3);
        assert_eq!(value["textGranularity"], "page");
        assert!(value["body"].get("selector").is_none());
        assert_eq!(value["body"]["language"], "nl");
        assert_eq!(value["target"], json!(["https://iiif.europeana.eu/image/ds1/lc1/canvas1"]));
    }
}
