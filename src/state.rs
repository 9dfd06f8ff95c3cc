//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::db::PageRepository;
use crate::iiif::IiifUrls;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pages: Arc<dyn PageRepository>,
    urls: IiifUrls,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config, pages: Arc<dyn PageRepository>) -> Self {
        let urls = IiifUrls {
            iiif_base_url: config.fulltext.iiif_base_url.clone(),
            resource_base_url: config.fulltext.resource_base_url.clone(),
        };
        Self {
            inner: Arc::new(AppStateInner { config, pages, urls }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the page repository
    pub fn pages(&self) -> &dyn PageRepository {
        self.inner.pages.as_ref()
    }

    /// Base urls for rendered documents
    pub fn urls(&self) -> &IiifUrls {
        &self.inner.urls
    }
}
