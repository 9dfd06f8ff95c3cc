//! IIIF Presentation version negotiation

/// JSON-LD media type of every representation
pub const MEDIA_TYPE_JSONLD: &str = "application/ld+json";

pub const CONTEXT_V2: &str = "http://iiif.io/api/presentation/2/context.json";
pub const CONTEXT_V3: &str = "http://iiif.io/api/presentation/3/context.json";

/// Supported IIIF Presentation API versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IiifVersion {
    #[default]
    V2,
    V3,
}

impl IiifVersion {
    /// Short tag used in the `format` query parameter and in ETags
    pub fn tag(&self) -> &'static str {
        match self {
            IiifVersion::V2 => "2",
            IiifVersion::V3 => "3",
        }
    }

    pub fn context(&self) -> &'static str {
        match self {
            IiifVersion::V2 => CONTEXT_V2,
            IiifVersion::V3 => CONTEXT_V3,
        }
    }

    /// `Content-Type` header value for this version
    pub fn content_type(&self) -> String {
        format!("{};profile=\"{}\"", MEDIA_TYPE_JSONLD, self.context())
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "2" => Some(IiifVersion::V2),
            "3" => Some(IiifVersion::V3),
            _ => None,
        }
    }

    fn from_context(context: &str) -> Option<Self> {
        match context {
            CONTEXT_V2 => Some(IiifVersion::V2),
            CONTEXT_V3 => Some(IiifVersion::V3),
            _ => None,
        }
    }

    /// Pick the version for a request.
    ///
    /// A recognised `format` query value wins, then the first `profile`
    /// parameter in `Accept` naming a known context, then V2.
    pub fn resolve(query_format: Option<&str>, accept: Option<&str>) -> Self {
        if let Some(version) = query_format.and_then(Self::from_tag) {
            return version;
        }
        accept
            .and_then(|accept| accept_profiles(accept).find_map(Self::from_context))
            .unwrap_or_default()
    }
}

/// Values of every `profile=` parameter in an Accept header, unquoted and trimmed
fn accept_profiles(accept: &str) -> impl Iterator<Item = &str> {
    accept
        .split(',')
        .flat_map(|media_range| media_range.split(';').skip(1))
        .filter_map(|parameter| {
            let (name, value) = parameter.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("profile")
                .then(|| value.trim().trim_matches('"').trim())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCEPT_V2: &str = "application/ld+json;profile=\"http://iiif.io/api/presentation/2/context.json\"";
    const ACCEPT_V3: &str = "application/ld+json;profile=\"http://iiif.io/api/presentation/3/context.json\"";

    #[test]
    fn test_default_is_v2() {
        assert_eq!(IiifVersion::resolve(None, None), IiifVersion::V2);
        assert_eq!(IiifVersion::resolve(None, Some("application/json")), IiifVersion::V2);
        assert_eq!(IiifVersion::resolve(Some("4"), None), IiifVersion::V2);
    }

    #[test]
    fn test_query_parameter() {
        assert_eq!(IiifVersion::resolve(Some("3"), None), IiifVersion::V3);
        assert_eq!(IiifVersion::resolve(Some("2"), None), IiifVersion::V2);
    }

    #[test]
    fn test_query_parameter_overrides_accept() {
        assert_eq!(IiifVersion::resolve(Some("3"), Some(ACCEPT_V2)), IiifVersion::V3);
        assert_eq!(IiifVersion::resolve(Some("2"), Some(ACCEPT_V3)), IiifVersion::V2);
    }

    #[test]
    fn test_unknown_query_falls_back_to_accept() {
        assert_eq!(IiifVersion::resolve(Some("x"), Some(ACCEPT_V3)), IiifVersion::V3);
    }

    #[test]
    fn test_accept_profile() {
        assert_eq!(IiifVersion::resolve(None, Some(ACCEPT_V3)), IiifVersion::V3);
        assert_eq!(IiifVersion::resolve(None, Some(ACCEPT_V2)), IiifVersion::V2);
        // padded profile value
        assert_eq!(
            IiifVersion::resolve(
                None,
                Some("application/ld+json; profile=\"http://iiif.io/api/presentation/3/context.json \"")
            ),
            IiifVersion::V3
        );
        assert_eq!(
            IiifVersion::resolve(None, Some(&format!("text/html, {}", ACCEPT_V3))),
            IiifVersion::V3
        );
    }

    #[test]
    fn test_content_type() {
        assert_eq!(IiifVersion::V2.content_type(), ACCEPT_V2);
        assert_eq!(IiifVersion::V3.content_type(), ACCEPT_V3);
        assert_eq!(IiifVersion::V3.tag(), "3");
    }
}
