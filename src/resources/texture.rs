use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::assets::element::{ElementHandle, ElementKind};
use crate::resources::image::Image;
use crate::resources::options::OptionSet;

/// Where a texture's pixels come from.
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Pixels decoded once from a fetched address.
    Image(Image),
    /// A live scene element whose content is read on every upload.
    Element(ElementHandle),
}

// ============================================================================
// Texture Asset
// ============================================================================

/// A resolved resource: decoded or live pixels plus the options applied at load time.
#[derive(Debug)]
pub struct Texture {
    pub uuid: Uuid,
    pub name: String,
    pub source: TextureSource,
    pub options: Arc<OptionSet>,

    version: AtomicU64,
    // Last element content version this texture has picked up.
    seen_content: AtomicU64,
}

impl Texture {
    #[must_use]
    pub fn from_image(name: &str, image: Image, options: Arc<OptionSet>) -> Self {
        Self::new(name, TextureSource::Image(image), options, 0)
    }

    #[must_use]
    pub fn from_element(name: &str, element: ElementHandle, options: Arc<OptionSet>) -> Self {
        let seen = element.content_version();
        Self::new(name, TextureSource::Element(element), options, seen)
    }

    fn new(name: &str, source: TextureSource, options: Arc<OptionSet>, seen: u64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            source,
            options,
            version: AtomicU64::new(0),
            seen_content: AtomicU64::new(seen),
        }
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    /// Flags the texture for re-upload.
    pub fn needs_update(&self) {
        self.version.fetch_add(1, Ordering::Relaxed);
    }

    /// The pixels to upload right now.
    #[must_use]
    pub fn image(&self) -> Option<Image> {
        match &self.source {
            TextureSource::Image(image) => Some(image.clone()),
            TextureSource::Element(element) => element.content(),
        }
    }

    #[must_use]
    pub fn is_video(&self) -> bool {
        matches!(&self.source, TextureSource::Element(e) if e.kind() == ElementKind::Video)
    }

    /// Picks up new content from a wrapped element. Returns `true` if the
    /// texture changed and was flagged for re-upload.
    pub fn sync_element(&self) -> bool {
        let TextureSource::Element(element) = &self.source else {
            return false;
        };
        let current = element.content_version();
        let previous = self.seen_content.swap(current, Ordering::AcqRel);
        if previous == current {
            return false;
        }
        self.needs_update();
        true
    }
}
