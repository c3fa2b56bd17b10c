//! Scene element collaborators.
//!
//! Sources that are not addresses refer to elements that already live in the
//! host scene (an `<img>` or `<video>` in a DOM-like registry). The engine
//! only needs to look them up, read a named attribute, and notice when their
//! content changes; [`ElementRegistry`] and [`SceneElement`] capture exactly
//! that. [`MemoryRegistry`] and [`MemoryElement`] are simple in-process
//! implementations for hosts without a registry of their own.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::resources::image::Image;

/// What kind of element a handle points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Image,
    Video,
    /// Anything else, carrying its tag name.
    Other(String),
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("img"),
            Self::Video => f.write_str("video"),
            Self::Other(tag) => f.write_str(tag),
        }
    }
}

/// A live element in the host scene.
pub trait SceneElement: Send + Sync + fmt::Debug {
    fn kind(&self) -> ElementKind;

    /// Reads a named attribute off the element.
    fn attribute(&self, name: &str) -> Option<String>;

    /// The element's current frame or decoded picture, if it has one yet.
    fn content(&self) -> Option<Image>;

    /// Bumped by the host whenever [`content`](Self::content) changes
    /// (a new video frame, an image that finished re-decoding).
    fn content_version(&self) -> u64;
}

pub type ElementHandle = Arc<dyn SceneElement>;

/// Resolves selector-style references to elements.
pub trait ElementRegistry: Send + Sync {
    fn query(&self, selector: &str) -> Option<ElementHandle>;
}

/// A registry with no elements; every selector fails to match.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoElements;

impl ElementRegistry for NoElements {
    fn query(&self, _selector: &str) -> Option<ElementHandle> {
        None
    }
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// Selector → element map. Selectors are matched verbatim.
#[derive(Default)]
pub struct MemoryRegistry {
    elements: RwLock<FxHashMap<String, ElementHandle>>,
}

impl MemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, selector: impl Into<String>, element: ElementHandle) {
        self.elements.write().insert(selector.into(), element);
    }

    pub fn remove(&self, selector: &str) -> Option<ElementHandle> {
        self.elements.write().remove(selector)
    }
}

impl ElementRegistry for MemoryRegistry {
    fn query(&self, selector: &str) -> Option<ElementHandle> {
        self.elements.read().get(selector).cloned()
    }
}

#[derive(Debug)]
pub struct MemoryElement {
    kind: ElementKind,
    attributes: RwLock<FxHashMap<String, String>>,
    content: RwLock<Option<Image>>,
    version: AtomicU64,
}

impl MemoryElement {
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: RwLock::default(),
            content: RwLock::new(None),
            version: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.write().insert(name.into(), value.into());
    }

    /// Replaces the element's content and bumps its version.
    pub fn set_content(&self, image: Image) {
        *self.content.write() = Some(image);
        self.version.fetch_add(1, Ordering::Release);
    }
}

impl SceneElement for MemoryElement {
    fn kind(&self) -> ElementKind {
        self.kind.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.read().get(name).cloned()
    }

    fn content(&self) -> Option<Image> {
        self.content.read().clone()
    }

    fn content_version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}
