//! Projects tracking snapshots onto presentable objects.
//!
//! Only the first result of a snapshot is ever considered. Engines report
//! results in their own priority order, and a second simultaneously tracked
//! object is dropped rather than queued.
//!
//! A recognized object is presentable when a navigation target can be derived
//! from it:
//!
//! 1. the object's name is itself an absolute URL with an allowed scheme, or
//! 2. a base URL is configured and the identifier joins onto it without
//!    leaving the base URL's origin or path.

use url::Url;

use crate::config::NavigationConfig;
use crate::engine::TrackingSnapshot;
use crate::error::{RecognitionError, Result};
use crate::types::TrackableObject;

#[derive(Debug, Clone)]
pub struct TrackableResolver {
    base_url: Option<Url>,
    allowed_schemes: Vec<String>,
}

impl TrackableResolver {
    pub fn new(config: &NavigationConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .map(parse_base_url)
            .transpose()?;

        Ok(Self {
            base_url,
            allowed_schemes: config
                .allowed_schemes
                .iter()
                .map(|scheme| scheme.to_ascii_lowercase())
                .collect(),
        })
    }

    /// The first result's trackable, if it has a non-blank identifier and name.
    pub fn resolve(&self, snapshot: &TrackingSnapshot) -> Option<TrackableObject> {
        let trackable = snapshot.results.first()?.trackable.as_ref()?;
        if trackable.identifier.trim().is_empty() || trackable.name.trim().is_empty() {
            return None;
        }
        Some(TrackableObject::new(
            trackable.identifier.clone(),
            trackable.name.clone(),
        ))
    }

    pub fn navigation_target(&self, object: &TrackableObject) -> Option<Url> {
        if let Ok(url) = Url::parse(object.name.trim()) {
            if self.scheme_allowed(&url) {
                return Some(url);
            }
        }

        let base = self.base_url.as_ref()?;
        let joined = base.join(object.identifier.trim()).ok()?;
        if joined.origin() != base.origin()
            || !joined.path().starts_with(base.path())
            || !self.scheme_allowed(&joined)
        {
            return None;
        }
        Some(joined)
    }

    pub fn is_presentable(&self, object: &TrackableObject) -> bool {
        self.navigation_target(object).is_some()
    }

    fn scheme_allowed(&self, url: &Url) -> bool {
        self.allowed_schemes.iter().any(|s| s == url.scheme())
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|source| RecognitionError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;
    // Without a trailing slash, joining would replace the last path segment.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
