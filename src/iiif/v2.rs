//! IIIF Presentation 2 templates

use serde::Serialize;

use super::{IiifUrls, CONTEXT_V2};
use crate::model::{Annotation, Page};

const ANNOTATION_LIST_TYPE: &str = "sc:AnnotationList";
const ANNOTATION_TYPE: &str = "oa:Annotation";
const PAINTING: &str = "sc:painting";
const TEXT_TYPE: &str = "dctypes:Text";

#[derive(Debug, Serialize)]
pub struct AnnotationPageV2 {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub resources: Vec<AnnotationV2>,
}

impl AnnotationPageV2 {
    pub fn new(page: &Page, urls: &IiifUrls) -> Self {
        Self {
            context: CONTEXT_V2,
            id: urls.annotation_page(page),
            kind: ANNOTATION_LIST_TYPE,
            resources: page
                .annotations
                .iter()
                .map(|annotation| AnnotationV2::new(page, annotation, urls))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnnotationV2 {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<&'static str>,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub motivation: &'static str,
    #[serde(rename = "dc:type")]
    pub dc_type: &'static str,
    pub resource: ResourceV2,
    pub on: Vec<String>,
}

/// Reference into the page's full text
#[derive(Debug, Serialize)]
pub struct ResourceV2 {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl AnnotationV2 {
    pub fn new(page: &Page, annotation: &Annotation, urls: &IiifUrls) -> Self {
        let mut resource_id = urls.resource(page);
        if let Some((from, to)) = annotation.text_range() {
            resource_id.push_str(&format!("#char={},{}", from, to));
        }

        let on = if annotation.targets.is_empty() {
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
            motivation: PAINTING,
            dc_type: annotation.annotation_type.name(),
            resource: ResourceV2 {
                id: resource_id,
                kind: TEXT_TYPE,
                language: annotation.language.clone(),
            },
            on,
        }
    }

    /// Annotation served on its own, carrying the JSON-LD context
    pub fn standalone(page: &Page, annotation: &Annotation, urls: &IiifUrls) -> Self {
        Self {
            context: Some(CONTEXT_V2),
            ..Self::new(page, annotation, urls)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iiif::fixtures::{page, urls};
    use serde_json::json;

    #[test]
    fn test_annotation_page() {
        let page = page();
        let value = serde_json::to_value(AnnotationPageV2::new(&page, &urls())).unwrap();

        assert_eq!(value["@context"], CONTEXT_V2);
        assert_eq!(value["@type"], "sc:AnnotationList");
        assert_eq!(value["@id"], "https://iiif.europeana.eu/presentation/ds1/lc1/annopage/1");
        assert_eq!(value["resources"].as_array().unwrap().len(), 2);

        let word = &value["resources"][1];
        assert!(word.get("@context").is_none());
        assert_eq!(
            word,
            &json!({
                "@id": "https://iiif.europeana.eu/presentation/ds1/lc1/anno/an1",
                "@type": "oa:Annotation",
                "motivation": "sc:painting",
                "dc:type": "word",
                "resource": {
                    "@id": "http://data.europeana.eu/fulltext/ds1/lc1/ft1#char=0,5",
                    "@type": "dctypes:Text"
                },
                "on": ["https://iiif.europeana.eu/image/ds1/lc1/canvas1#xywh=10,20,30,40"]
            })
        );
    }

    #[test]
    fn test_page_annotation_targets_whole_canvas() {
        let page = page();
        let value = serde_json::to_value(AnnotationV2::standalone(&page, &page.annotations[0], &urls())).unwrap();
        assert_eq!(value["@context"], CONTEXT_V2);
        assert_eq!(value["dc:type"], "page");
        assert_eq!(value["resource"]["@id"], "http://data.europeana.eu/fulltext/ds1/lc1/ft1");
        assert_eq!(value["resource"]["language"], "nl");
        assert_eq!(value["on"], json!(["https://iiif.europeana.eu/image/ds1/lc1/canvas1"]));
    }
}
