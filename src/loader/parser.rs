//! Streaming fulltext XML parser
//!
//! Reads one EDM fulltext document (an `rdf:RDF` wrapper holding one
//! `edm:FullTextResource` and any number of `oa:Annotation` records) with
//! the quick-xml pull reader and builds a [`Page`].
//!
//! Problems inside a single annotation record only drop that record. Problems
//! with the document as a whole (resource ids, duplicate resources, broken
//! XML, an incomplete page) are returned as a [`LoaderError`].
//!
//! ```text
//! <rdf:RDF>
//!   <edm:FullTextResource rdf:about="<base>/<dataset>/<local>/<resource>">
//!     <dc:language/> <rdf:value/>
//!   </edm:FullTextResource>
//!   <oa:Annotation rdf:ID="/<id>">
//!     <dc:type/> <oa:motivatedBy rdf:resource/>
//!     <oa:hasBody> <oa:SpecificResource rdf:about="...#char=<from>,<to>"/> </oa:hasBody>
//!     <oa:hasTarget rdf:resource="<canvas>#xywh=<x>,<y>,<w>,<h>"/>
//!   </oa:Annotation>
//! </rdf:RDF>
//! ```

use std::collections::HashMap;
use std::io::BufRead;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::error::{LoaderError, RecordError, Result};
use super::identifier::{parse_resource_url, IdentifierError};
use super::progress::{ProgressSink, RecordOutcome};
use crate::model::{Annotation, AnnotationType, Page, Target, TextResource};

const RDF: &[u8] = b"RDF";
const FULLTEXT_RESOURCE: &[u8] = b"FullTextResource";
const RESOURCE_ABOUT: &[u8] = b"about";
const RESOURCE_VALUE: &[u8] = b"value";
const LANGUAGE: &[u8] = b"language";

const ANNOTATION: &[u8] = b"Annotation";
const ANNOTATION_ID: &[u8] = b"ID";
const ANNOTATION_TYPE: &[u8] = b"type";
const ANNOTATION_MOTIVATION: &[u8] = b"motivatedBy";
const ANNOTATION_BODY: &[u8] = b"hasBody";
const ANNOTATION_TARGET: &[u8] = b"hasTarget";
const SPECIFIC_RESOURCE: &[u8] = b"SpecificResource";
const REFERENCE: &[u8] = b"resource";

const CHAR_FRAGMENT: &str = "#char=";
const XYWH_FRAGMENT: &str = "#xywh=";

/// Parser configuration
#[derive(Debug, Clone)]
pub struct ParserSettings {
    /// Every FullTextResource url must start with this prefix
    pub resource_base_url: String,
}

/// Fulltext document parser.
///
/// Holds configuration only, so one instance can be shared between any
/// number of worker threads.
#[derive(Debug, Clone)]
pub struct XmlParser {
    settings: ParserSettings,
}

impl XmlParser {
    pub fn new(settings: ParserSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    /// Parse one fulltext document into an annotation page.
    ///
    /// `file` is only used to label log lines and errors. `modified` is the
    /// last-modified time chosen by the caller; a page without one fails
    /// validation.
    pub fn parse<R: BufRead>(
        &self,
        page_id: &str,
        input: R,
        file: &str,
        modified: Option<DateTime<Utc>>,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Page> {
        let mut document = DocumentReader {
            reader: Reader::from_reader(input),
            file,
            base_url: &self.settings.resource_base_url,
            entities: HashMap::new(),
            progress,
        };

        let mut builder = PageBuilder {
            page_id: page_id.to_string(),
            modified,
            ..PageBuilder::default()
        };
        document.read(&mut builder)?;

        let page = builder.build(file)?;
        tracing::debug!(file, annotations = page.annotations.len(), "processed OK");
        Ok(page)
    }
}

/// Page fields collected while reading
#[derive(Debug, Default)]
struct PageBuilder {
    page_id: String,
    modified: Option<DateTime<Utc>>,
    resource: Option<TextResource>,
    target_id: Option<String>,
    annotations: Vec<Annotation>,
}

impl PageBuilder {
    fn build(self, file: &str) -> Result<Page> {
        let incomplete = |reason: &str| LoaderError::IncompleteAggregate {
            file: file.to_string(),
            reason: reason.to_string(),
        };

        let resource = self
            .resource
            .ok_or_else(|| incomplete("no dataset and local id defined"))?;
        if resource.dataset_id.is_empty() {
            return Err(incomplete("no dataset id defined"));
        }
        if resource.local_id.is_empty() {
            return Err(incomplete("no local id defined"));
        }
        if self.page_id.is_empty() {
            return Err(incomplete("no page id defined"));
        }
        let target_id = self
            .target_id
            .filter(|t| !t.is_empty())
            .ok_or_else(|| incomplete("no target id defined"))?;
        if self.annotations.is_empty() {
            return Err(incomplete("page doesn't contain any annotations"));
        }
        let modified = self
            .modified
            .ok_or_else(|| incomplete("no last modified date set"))?;

        Ok(Page {
            dataset_id: resource.dataset_id.clone(),
            local_id: resource.local_id.clone(),
            page_id: self.page_id,
            target_id,
            modified,
            resource,
            annotations: self.annotations,
        })
    }
}

/// Raw values of one annotation record, validated by [`AnnotationDraft::finish`]
#[derive(Debug, Default)]
struct AnnotationDraft {
    id: Option<String>,
    type_text: Option<String>,
    motivation: Option<String>,
    language: Option<String>,
    body_urls: Vec<String>,
    target_urls: Vec<Option<String>>,
}

/// A validated annotation plus the canvas url its targets point at
#[derive(Debug)]
struct ParsedAnnotation {
    annotation: Annotation,
    canvas: Option<String>,
}

impl AnnotationDraft {
    fn finish(self, file: &str) -> std::result::Result<ParsedAnnotation, RecordError> {
        let id = self
            .id
            .ok_or_else(|| RecordError::MissingData("annotation id".to_string()))?;

        let code = self
            .type_text
            .as_deref()
            .and_then(|t| t.trim().chars().next())
            .ok_or_else(|| RecordError::MissingData("annotation type".to_string()))?;
        let annotation_type = code
            .to_uppercase()
            .next()
            .ok_or_else(|| RecordError::MissingData("annotation type".to_string()))
            .and_then(|c| {
                AnnotationType::try_from(c).map_err(|e| RecordError::IllegalValue(e.to_string()))
            })?;

        let mut canvas = None;
        let mut targets = Vec::new();
        for url in self.target_urls {
            let url = url
                .filter(|u| !u.is_empty())
                .ok_or_else(|| RecordError::MissingData("annotation target url".to_string()))?;
            match url.split_once(XYWH_FRAGMENT) {
                Some((base, coordinates)) => {
                    targets.push(parse_xywh(coordinates)?);
                    canvas.get_or_insert_with(|| base.to_string());
                }
                None if annotation_type.requires_target() => {
                    return Err(RecordError::MissingData(format!(
                        "{} in target url {}",
                        XYWH_FRAGMENT, url
                    )));
                }
                None => {
                    canvas.get_or_insert(url);
                }
            }
        }
        if annotation_type.requires_target() && targets.is_empty() {
            return Err(RecordError::MissingData("annotation target".to_string()));
        }

        let (text_start, text_end) = text_offsets(&self.body_urls, file);

        Ok(ParsedAnnotation {
            annotation: Annotation {
                id,
                annotation_type,
                motivation: self.motivation.filter(|m| !m.is_empty()),
                language: self.language,
                text_start,
                text_end,
                targets,
            },
            canvas,
        })
    }
}

/// Offsets from the first body url with a `#char=` fragment
fn text_offsets(body_urls: &[String], file: &str) -> (Option<u32>, Option<u32>) {
    let Some(coordinates) = body_urls
        .iter()
        .find_map(|url| url.split_once(CHAR_FRAGMENT).map(|(_, c)| c))
    else {
        if let Some(url) = body_urls.first() {
            tracing::warn!(file, "No {} defined in resource text {}", CHAR_FRAGMENT, url);
        }
        return (None, None);
    };

    let mut from_to = coordinates.split(',');
    let from = parse_offset(from_to.next(), "from", file);
    let to = parse_offset(from_to.next(), "to", file);
    (from, to)
}

fn parse_offset(value: Option<&str>, which: &str, file: &str) -> Option<u32> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => {
            tracing::warn!(file, "Empty resource text {} value", which);
            None
        }
        Some(v) => match v.parse() {
            Ok(offset) => Some(offset),
            Err(_) => {
                tracing::error!(file, "Resource text {} value '{}' is not an integer", which, v);
                None
            }
        },
    }
}

fn parse_xywh(coordinates: &str) -> std::result::Result<Target, RecordError> {
    let illegal = || {
        RecordError::IllegalValue(format!(
            "target '{}' doesn't have 4 integers separated with a comma",
            coordinates
        ))
    };

    let values = coordinates
        .split(',')
        .map(|v| v.trim().parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| illegal())?;
    match values.as_slice() {
        [x, y, w, h] => Ok(Target::new(*x, *y, *w, *h)),
        _ => Err(illegal()),
    }
}

/// Entity lookup: the five predefined XML entities, then DTD declarations
fn resolve_entity<'e>(entities: &'e HashMap<String, String>, name: &str) -> Option<&'e str> {
    match name {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        _ => entities.get(name).map(String::as_str),
    }
}

/// Collect `<!ENTITY name "value">` declarations from a DOCTYPE internal subset
fn parse_entity_declarations(doctype: &str) -> HashMap<String, String> {
    const DECLARATION: &str = "<!ENTITY";

    let mut entities = HashMap::new();
    let mut rest = doctype;
    while let Some(start) = rest.find(DECLARATION) {
        rest = rest[start + DECLARATION.len()..].trim_start();

        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = &rest[..name_end];
        let after_name = rest[name_end..].trim_start();

        // parameter entities are not used by fulltext documents
        if name == "%" || name.is_empty() {
            continue;
        }
        let Some(quote) = after_name.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let value = &after_name[1..];
        if let Some(end) = value.find(quote) {
            entities.insert(name.to_string(), value[..end].to_string());
        }
    }
    entities
}

/// Pull-parser state for one document
struct DocumentReader<'a, R> {
    reader: Reader<R>,
    file: &'a str,
    base_url: &'a str,
    entities: HashMap<String, String>,
    progress: Option<&'a dyn ProgressSink>,
}

impl<'a, R: BufRead> DocumentReader<'a, R> {
    fn read(&mut self, page: &mut PageBuilder) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::DocType(doctype)) => {
                    self.entities = parse_entity_declarations(&String::from_utf8_lossy(&doctype));
                }
                Ok(Event::Start(element)) => match element.local_name().as_ref() {
                    RDF => {}
                    FULLTEXT_RESOURCE => self.read_resource(&element, false, page)?,
                    ANNOTATION => self.read_annotation(&element, false, page)?,
                    other => {
                        self.log_unknown(other);
                        self.skip_element()?;
                    }
                },
                Ok(Event::Empty(element)) => match element.local_name().as_ref() {
                    FULLTEXT_RESOURCE => self.read_resource(&element, true, page)?,
                    ANNOTATION => self.read_annotation(&element, true, page)?,
                    other => self.log_unknown(other),
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(self.xml_error(e)),
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    /// The FullTextResource: ids from `rdf:about`, language and text from children
    fn read_resource(
        &mut self,
        element: &BytesStart<'_>,
        empty: bool,
        page: &mut PageBuilder,
    ) -> Result<()> {
        if page.resource.is_some() {
            return Err(LoaderError::DuplicateResource {
                file: self.file.to_string(),
            });
        }

        let url = self
            .attribute(element, RESOURCE_ABOUT)?
            .filter(|u| !u.is_empty())
            .ok_or_else(|| LoaderError::MissingData {
                file: self.file.to_string(),
                reason: "no resource text url was defined".to_string(),
            })?;
        let ids = parse_resource_url(&url, self.base_url).map_err(|e| match e {
            IdentifierError::OutsideBaseUrl { url, base_url } => {
                LoaderError::ConfigurationMismatch {
                    file: self.file.to_string(),
                    url,
                    base_url,
                }
            }
            IdentifierError::SegmentCount { url, .. } => LoaderError::MalformedIdentifier {
                file: self.file.to_string(),
                url,
            },
        })?;

        let mut resource = TextResource {
            id: ids.resource_id,
            dataset_id: ids.dataset_id,
            local_id: ids.local_id,
            language: None,
            value: None,
        };

        if !empty {
            let mut buf = Vec::new();
            loop {
                match self.reader.read_event_into(&mut buf) {
                    Ok(Event::Start(child)) => match child.local_name().as_ref() {
                        LANGUAGE => resource.language = non_empty(self.read_text()?.trim()),
                        RESOURCE_VALUE => resource.value = non_empty(&self.read_text()?),
                        other => {
                            self.log_unknown(other);
                            self.skip_element()?;
                        }
                    },
                    Ok(Event::Empty(child)) => match child.local_name().as_ref() {
                        LANGUAGE | RESOURCE_VALUE => {}
                        other => self.log_unknown(other),
                    },
                    Ok(Event::End(_)) => break,
                    Ok(Event::Eof) => return Err(self.unexpected_eof(FULLTEXT_RESOURCE)),
                    Err(e) => return Err(self.xml_error(e)),
                    _ => {}
                }
                buf.clear();
            }
        }

        page.resource = Some(resource);
        Ok(())
    }

    /// One oa:Annotation record; record-level failures are logged and skipped
    fn read_annotation(
        &mut self,
        element: &BytesStart<'_>,
        empty: bool,
        page: &mut PageBuilder,
    ) -> Result<()> {
        let mut draft = AnnotationDraft {
            id: self
                .attribute(element, ANNOTATION_ID)?
                .map(|id| id.strip_prefix('/').map(str::to_string).unwrap_or(id)),
            ..AnnotationDraft::default()
        };
        if !empty {
            self.read_annotation_children(&mut draft)?;
        }

        let annotation_id = draft.id.clone();
        let outcome = match draft.finish(self.file) {
            Ok(parsed) => {
                if page.target_id.is_none() {
                    page.target_id = parsed.canvas;
                }
                page.annotations.push(parsed.annotation);
                RecordOutcome::Accepted
            }
            Err(reason) => {
                tracing::error!(
                    file = self.file,
                    annotation_id = ?annotation_id,
                    "Skipping annotation because {}",
                    reason
                );
                RecordOutcome::Skipped
            }
        };
        if let Some(progress) = self.progress {
            progress.record(outcome);
        }
        Ok(())
    }

    fn read_annotation_children(&mut self, draft: &mut AnnotationDraft) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(child)) => match child.local_name().as_ref() {
                    ANNOTATION_TYPE => draft.type_text = Some(self.read_text()?),
                    ANNOTATION_MOTIVATION => {
                        draft.motivation = self.attribute(&child, REFERENCE)?;
                        self.skip_element()?;
                    }
                    ANNOTATION_BODY => {
                        if let Some(url) = self.attribute(&child, REFERENCE)? {
                            draft.body_urls.push(url);
                        }
                        self.read_body(draft)?;
                    }
                    ANNOTATION_TARGET => {
                        draft.target_urls.push(self.attribute(&child, REFERENCE)?);
                        self.skip_element()?;
                    }
                    // confidence, styledBy and friends
                    _ => self.skip_element()?,
                },
                Ok(Event::Empty(child)) => match child.local_name().as_ref() {
                    ANNOTATION_TYPE => draft.type_text = Some(String::new()),
                    ANNOTATION_MOTIVATION => draft.motivation = self.attribute(&child, REFERENCE)?,
                    ANNOTATION_BODY => {
                        if let Some(url) = self.attribute(&child, REFERENCE)? {
                            draft.body_urls.push(url);
                        }
                    }
                    ANNOTATION_TARGET => draft.target_urls.push(self.attribute(&child, REFERENCE)?),
                    _ => {}
                },
                Ok(Event::End(_)) => break,
                Ok(Event::Eof) => return Err(self.unexpected_eof(ANNOTATION)),
                Err(e) => return Err(self.xml_error(e)),
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    /// Contents of oa:hasBody, at any depth: SpecificResource urls and language
    fn read_body(&mut self, draft: &mut AnnotationDraft) -> Result<()> {
        let mut buf = Vec::new();
        let mut depth = 0usize;
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(child)) => {
                    let name = child.local_name();
                    if name.as_ref().eq_ignore_ascii_case(SPECIFIC_RESOURCE) {
                        self.push_specific_resource(&child, draft)?;
                        depth += 1;
                    } else if name.as_ref().eq_ignore_ascii_case(LANGUAGE) {
                        if let Some(language) = non_empty(self.read_text()?.trim()) {
                            draft.language = Some(language);
                        }
                    } else {
                        self.skip_element()?;
                    }
                }
                Ok(Event::Empty(child)) => {
                    if child.local_name().as_ref().eq_ignore_ascii_case(SPECIFIC_RESOURCE) {
                        self.push_specific_resource(&child, draft)?;
                    }
                }
                Ok(Event::End(_)) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Ok(Event::Eof) => return Err(self.unexpected_eof(ANNOTATION_BODY)),
                Err(e) => return Err(self.xml_error(e)),
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    fn push_specific_resource(
        &self,
        element: &BytesStart<'_>,
        draft: &mut AnnotationDraft,
    ) -> Result<()> {
        match self.attribute(element, RESOURCE_ABOUT)?.filter(|u| !u.is_empty()) {
            Some(url) => draft.body_urls.push(url),
            None => tracing::warn!(file = self.file, "No specific resource text defined"),
        }
        Ok(())
    }

    /// Text content up to the end of the current element, entities expanded
    fn read_text(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Text(t)) => {
                    let unescaped = t
                        .unescape_with(|name| resolve_entity(&self.entities, name))
                        .map_err(|e| self.xml_error(e))?;
                    text.push_str(&unescaped);
                }
                Ok(Event::CData(data)) => text.push_str(&String::from_utf8_lossy(&data)),
                Ok(Event::Start(_)) => depth += 1,
                Ok(Event::End(_)) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Ok(Event::Eof) => return Err(self.unexpected_eof(b"text")),
                Err(e) => return Err(self.xml_error(e)),
                _ => {}
            }
            buf.clear();
        }
        Ok(text)
    }

    /// Consume everything up to and including the end of the current element
    fn skip_element(&mut self) -> Result<()> {
        let mut buf = Vec::new();
        let mut depth = 0usize;
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(_)) => depth += 1,
                Ok(Event::End(_)) => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                Ok(Event::Eof) => return Err(self.unexpected_eof(b"element")),
                Err(e) => return Err(self.xml_error(e)),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Attribute value by local name, entities expanded
    fn attribute(&self, element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
        for attribute in element.attributes() {
            let attribute = attribute.map_err(|e| self.xml_error(e.into()))?;
            if attribute.key.local_name().as_ref() == name {
                let value = attribute
                    .decode_and_unescape_value_with(&self.reader, |entity| {
                        resolve_entity(&self.entities, entity)
                    })
                    .map_err(|e| self.xml_error(e))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn log_unknown(&self, name: &[u8]) {
        tracing::info!(
            file = self.file,
            element = %String::from_utf8_lossy(name),
            "Unknown xml element"
        );
    }

    fn xml_error(&self, source: quick_xml::Error) -> LoaderError {
        LoaderError::Xml {
            file: self.file.to_string(),
            source,
        }
    }

    fn unexpected_eof(&self, element: &[u8]) -> LoaderError {
        LoaderError::UnexpectedEof {
            file: self.file.to_string(),
            element: String::from_utf8_lossy(element).into_owned(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
