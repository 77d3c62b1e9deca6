use std::rc::Rc;

use tracing::{debug, warn};
use url::Url;

use super::narrative::Narrative;
use crate::Result;

/// Maps a content object to the image source its viewer loads
pub trait ObjectResolver {
    fn source_url(&self, object_id: &str) -> String;

    /// Rewrite a site-relative media path for the current deployment
    fn site_url(&self, path: &str) -> String {
        path.to_string()
    }
}

/// Resolves IIIF manifests from object metadata, falling back to the
/// manifests generated alongside the site.
pub struct ManifestResolver {
    origin: String,
    base_path: String,
    narrative: Rc<Narrative>,
}

impl ManifestResolver {
    pub fn new(page_url: &str, narrative: Rc<Narrative>) -> Result<Self> {
        let page = Url::parse(page_url)?;
        let origin = page.origin().ascii_serialization();
        let base_path = base_path_of(page.path());
        debug!(origin = %origin, base_path = %base_path, "Manifest resolver ready");
        Ok(Self {
            origin,
            base_path,
            narrative,
        })
    }

    /// Site base path (`""` or `/prefix`)
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn local_manifest_url(&self, object_id: &str) -> String {
        format!(
            "{}{}/iiif/objects/{}/manifest.json",
            self.origin, self.base_path, object_id
        )
    }
}

impl ObjectResolver for ManifestResolver {
    fn source_url(&self, object_id: &str) -> String {
        match self.narrative.object(object_id) {
            Some(object) => match object
                .iiif_manifest
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
            {
                Some(manifest) => manifest.to_string(),
                None => self.local_manifest_url(object_id),
            },
            None => {
                warn!(object = %object_id, "Object not found in story data, using local manifest");
                self.local_manifest_url(object_id)
            }
        }
    }

    /// Prefix a site-relative path with the base path; other URLs pass through
    fn site_url(&self, path: &str) -> String {
        if path.starts_with('/') && !path.starts_with("//") {
            format!("{}{}", self.base_path, path)
        } else {
            path.to_string()
        }
    }
}

/// Page path segments minus the trailing `stories/<story>` pair
fn base_path_of(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 3 {
        return String::new();
    }
    format!("/{}", segments[..segments.len() - 2].join("/"))
}
