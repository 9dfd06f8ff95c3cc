//! Resource url decomposition
//!
//! Fulltext resource urls have the shape
//! `<baseUrl><datasetId>/<localId>/<resourceId>`. This is the single place
//! where that shape is taken apart.

use thiserror::Error;

/// The three ids carried by a resource url
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentifier {
    pub dataset_id: String,
    pub local_id: String,
    pub resource_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The url does not start with the configured base url
    #[error("'{url}' doesn't start with '{base_url}'")]
    OutsideBaseUrl { url: String, base_url: String },

    /// Wrong number of path segments after the base url
    #[error("expected 3 ids in '{url}', found {found}")]
    SegmentCount { url: String, found: usize },
}

/// Split a resource url into its dataset, local and resource id.
///
/// Empty segments (doubled or trailing slashes) are ignored; exactly three
/// non-empty segments must remain.
pub fn parse_resource_url(url: &str, base_url: &str) -> Result<ResourceIdentifier, IdentifierError> {
    let Some(remainder) = url.strip_prefix(base_url) else {
        return Err(IdentifierError::OutsideBaseUrl {
            url: url.to_string(),
            base_url: base_url.to_string(),
        });
    };

    let segments: Vec<&str> = remainder.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [dataset_id, local_id, resource_id] => Ok(ResourceIdentifier {
            dataset_id: dataset_id.to_string(),
            local_id: local_id.to_string(),
            resource_id: resource_id.to_string(),
        }),
        _ => Err(IdentifierError::SegmentCount {
            url: url.to_string(),
            found: segments.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://data.europeana.eu/fulltext/";

    #[test]
    fn test_parse_resource_url() {
        let id = parse_resource_url("http://data.europeana.eu/fulltext/9200396/BibliographicResource_3000118435009/8ebb67ccf9f8a1dcc2ea119c60954111", BASE).unwrap();
        assert_eq!(id.dataset_id, "9200396");
        assert_eq!(id.local_id, "BibliographicResource_3000118435009");
        assert_eq!(id.resource_id, "8ebb67ccf9f8a1dcc2ea119c60954111");
    }

    #[test]
    fn test_rejoined_ids_reproduce_url() {
        let url = "http://data.europeana.eu/fulltext/ds1/lc1/ft1";
        let id = parse_resource_url(url, BASE).unwrap();
        let rebuilt = format!("{}{}/{}/{}", BASE, id.dataset_id, id.local_id, id.resource_id);
        assert_eq!(rebuilt, url);
        assert_eq!(parse_resource_url(&rebuilt, BASE).unwrap(), id);
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let id = parse_resource_url("http://data.europeana.eu/fulltext/ds1/lc1/ft1/", BASE).unwrap();
        assert_eq!(id.resource_id, "ft1");
    }

    #[test]
    fn test_wrong_base_url() {
        let err = parse_resource_url("https://example.org/fulltext/ds1/lc1/ft1", BASE).unwrap_err();
        assert!(matches!(err, IdentifierError::OutsideBaseUrl { .. }));
    }

    #[test]
    fn test_wrong_segment_count() {
        assert_eq!(
            parse_resource_url("http://data.europeana.eu/fulltext/ds1/lc1", BASE),
            Err(IdentifierError::SegmentCount {
                url: "http://data.europeana.eu/fulltext/ds1/lc1".to_string(),
                found: 2,
            })
        );
        assert!(matches!(
            parse_resource_url("http://data.europeana.eu/fulltext/ds1/lc1/ft1/extra", BASE),
            Err(IdentifierError::SegmentCount { found: 4, .. })
        ));
        assert!(matches!(
            parse_resource_url("http://data.europeana.eu/fulltext/", BASE),
            Err(IdentifierError::SegmentCount { found: 0, .. })
        ));
    }
}
