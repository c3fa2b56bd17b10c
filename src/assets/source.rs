//! Source Resolver
//!
//! Classifies a raw texture source string as either a fetchable address or a
//! reference to an element already in the scene.
//!
//! Classification order:
//! 1. absolute URLs with a fetchable scheme (`http`, `https`, `file`, `data`)
//! 2. selector-looking strings (`#id`, `.class`, `[attr]`, or a bare word
//!    without `.` or `/`), looked up in the [`ElementRegistry`]
//! 3. anything else is first offered to the registry (`img.hero`,
//!    `video:first-child`); explicit paths (`./`, `../`, `/`) skip this step
//! 4. what the registry does not know is a relative path, joined onto the
//!    base address, or malformed if it carried a foreign scheme
//!
//! Element references additionally carry the option overrides parsed from
//! the element's override attribute.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use url::Url;

use crate::assets::element::{ElementHandle, ElementRegistry};
use crate::errors::{Error, Result, SourceResolutionError};
use crate::resources::options::OptionFragment;
use crate::resources::schema::AttributeSchema;
use crate::settings::LoaderSettings;

const FETCHABLE_SCHEMES: &[&str] = &["http", "https", "file", "data"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    NetworkAddress,
    ElementReference,
}

/// A classified source string.
#[derive(Clone)]
pub enum SourceDescriptor {
    Address { raw: String, url: Url },
    Element { raw: String, element: ElementHandle },
}

impl SourceDescriptor {
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Address { .. } => SourceKind::NetworkAddress,
            Self::Element { .. } => SourceKind::ElementReference,
        }
    }

    /// The source string as the host wrote it.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Address { raw, .. } | Self::Element { raw, .. } => raw,
        }
    }

    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Address { url, .. } => Some(url),
            Self::Element { .. } => None,
        }
    }

    #[must_use]
    pub fn element(&self) -> Option<&ElementHandle> {
        match self {
            Self::Element { element, .. } => Some(element),
            Self::Address { .. } => None,
        }
    }
}

impl fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address { url, .. } => f.debug_tuple("Address").field(&url.as_str()).finish(),
            Self::Element { raw, element } => f
                .debug_struct("Element")
                .field("selector", raw)
                .field("kind", &element.kind())
                .finish(),
        }
    }
}

/// A descriptor plus any element-local option overrides.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub descriptor: SourceDescriptor,
    pub overrides: OptionFragment,
}

pub struct SourceResolver {
    registry: Arc<dyn ElementRegistry>,
    schema: Arc<AttributeSchema>,
    base: Url,
    override_attribute: String,
}

impl SourceResolver {
    pub fn new(
        settings: &LoaderSettings,
        registry: Arc<dyn ElementRegistry>,
        schema: Arc<AttributeSchema>,
    ) -> Result<Self> {
        let base = match &settings.base_url {
            Some(base) => directory_url(base)?,
            None => root_url(&settings.asset_root)?,
        };
        Ok(Self {
            registry,
            schema,
            base,
            override_attribute: settings.override_attribute.clone(),
        })
    }

    /// The address relative paths are joined onto.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn resolve(&self, raw: &str) -> std::result::Result<ResolvedSource, SourceResolutionError> {
        let source = raw.trim();
        if source.is_empty() {
            return Err(SourceResolutionError::Empty);
        }

        match Url::parse(source) {
            Ok(url) if FETCHABLE_SCHEMES.contains(&url.scheme()) => return Self::absolute(source, url),
            // Pseudo-class selectors such as `video:first-child` parse as URLs.
            Ok(url) => {
                let reason = format!("unsupported scheme `{}`", url.scheme());
                return self.lookup(source).ok_or_else(|| malformed(source, reason));
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {}
            Err(e) => {
                return self.lookup(source).ok_or_else(|| malformed(source, e.to_string()));
            }
        }

        if looks_like_selector(source) {
            return self
                .lookup(source)
                .ok_or_else(|| SourceResolutionError::NoMatch(source.to_string()));
        }

        if !is_explicit_path(source) {
            if let Some(resolved) = self.lookup(source) {
                return Ok(resolved);
            }
        }

        let url = self
            .base
            .join(source)
            .map_err(|e| malformed(source, e.to_string()))?;
        Ok(ResolvedSource {
            descriptor: SourceDescriptor::Address {
                raw: source.to_string(),
                url,
            },
            overrides: OptionFragment::new(),
        })
    }

    fn absolute(source: &str, url: Url) -> std::result::Result<ResolvedSource, SourceResolutionError> {
        if matches!(url.scheme(), "http" | "https") && url.host_str().is_none_or(str::is_empty) {
            return Err(malformed(source, "missing host".to_string()));
        }
        Ok(ResolvedSource {
            descriptor: SourceDescriptor::Address {
                raw: source.to_string(),
                url,
            },
            overrides: OptionFragment::new(),
        })
    }

    fn lookup(&self, selector: &str) -> Option<ResolvedSource> {
        let element = self.registry.query(selector)?;

        let overrides = element
            .attribute(&self.override_attribute)
            .map(|style| OptionFragment::parse_style(&style, &self.schema))
            .unwrap_or_default();

        Some(ResolvedSource {
            descriptor: SourceDescriptor::Element {
                raw: selector.to_string(),
                element,
            },
            overrides,
        })
    }
}

fn malformed(source: &str, reason: String) -> SourceResolutionError {
    SourceResolutionError::MalformedAddress {
        address: source.to_string(),
        reason,
    }
}

fn looks_like_selector(source: &str) -> bool {
    let class_selector = source
        .strip_prefix('.')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '-');
    source.starts_with(['#', '[']) || class_selector || !source.contains(['.', '/', '\\'])
}

fn is_explicit_path(source: &str) -> bool {
    source.starts_with(['/', '\\']) || source.starts_with("./") || source.starts_with("../")
}

fn directory_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::InvalidBase(format!("{base}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn root_url(root: &Path) -> Result<Url> {
    let absolute = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()?.join(root)
    };
    Url::from_directory_path(&absolute)
        .map_err(|()| Error::InvalidBase(absolute.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::element::{ElementKind, MemoryElement, MemoryRegistry};
    use crate::resources::constants::Constant;
    use crate::resources::options::TextureOption;
    use crate::resources::schema::Value;

    fn resolver(registry: MemoryRegistry) -> SourceResolver {
        SourceResolver::new(
            &LoaderSettings::default().with_base_url("https://cdn.example.com/textures"),
            Arc::new(registry),
            Arc::new(AttributeSchema::phong().unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn absolute_urls_are_addresses() {
        let resolved = resolver(MemoryRegistry::new())
            .resolve("https://example.com/a.png")
            .unwrap();
        assert_eq!(resolved.descriptor.kind(), SourceKind::NetworkAddress);
        assert_eq!(resolved.descriptor.url().unwrap().host_str(), Some("example.com"));
        assert!(resolved.overrides.is_empty());
    }

    #[test]
    fn relative_paths_join_the_base() {
        let resolved = resolver(MemoryRegistry::new()).resolve("wood/crate.jpg").unwrap();
        assert_eq!(
            resolved.descriptor.url().unwrap().as_str(),
            "https://cdn.example.com/textures/wood/crate.jpg"
        );
        assert_eq!(resolved.descriptor.raw(), "wood/crate.jpg");

        let dotted = resolver(MemoryRegistry::new()).resolve("./a.png").unwrap();
        assert_eq!(dotted.descriptor.kind(), SourceKind::NetworkAddress);
    }

    #[test]
    fn class_selectors_are_not_paths() {
        assert!(looks_like_selector(".hero-image"));
        assert!(looks_like_selector("#hero"));
        assert!(!looks_like_selector("./hero.png"));
        assert!(!looks_like_selector("../hero.png"));
        assert!(!looks_like_selector("hero.png"));
    }

    #[test]
    fn empty_and_malformed_sources_fail() {
        let resolver = resolver(MemoryRegistry::new());
        assert_eq!(resolver.resolve("  ").unwrap_err(), SourceResolutionError::Empty);
        assert!(matches!(
            resolver.resolve("http://"),
            Err(SourceResolutionError::MalformedAddress { .. })
        ));
        assert!(matches!(
            resolver.resolve("mailto:someone@example.com"),
            Err(SourceResolutionError::MalformedAddress { .. })
        ));
    }

    #[test]
    fn selectors_resolve_through_the_registry() {
        let registry = MemoryRegistry::new();
        registry.insert(
            "#sky",
            Arc::new(
                MemoryElement::new(ElementKind::Image)
                    .with_attribute("texture", "wrapS: RepeatWrapping; nonsense"),
            ),
        );
        let resolver = resolver(registry);

        let resolved = resolver.resolve("#sky").unwrap();
        assert_eq!(resolved.descriptor.kind(), SourceKind::ElementReference);
        assert_eq!(
            resolved.overrides.get(TextureOption::WrapS),
            Some(&Value::Constant(Constant::RepeatWrapping))
        );

        assert_eq!(
            resolver.resolve("#missing").unwrap_err(),
            SourceResolutionError::NoMatch("#missing".into())
        );
        assert_eq!(
            resolver.resolve("video").unwrap_err(),
            SourceResolutionError::NoMatch("video".into())
        );
    }

    #[test]
    fn element_without_override_attribute_has_no_overrides() {
        let registry = MemoryRegistry::new();
        registry.insert("#clip", Arc::new(MemoryElement::new(ElementKind::Video)));
        let resolved = resolver(registry).resolve("#clip").unwrap();
        assert!(resolved.overrides.is_empty());
    }

    #[test]
    fn pseudo_class_selectors_reach_the_registry() {
        let registry = MemoryRegistry::new();
        registry.insert("video:first-child", Arc::new(MemoryElement::new(ElementKind::Video)));
        let resolver = resolver(registry);

        let resolved = resolver.resolve("video:first-child").unwrap();
        assert_eq!(resolved.descriptor.kind(), SourceKind::ElementReference);
        assert_eq!(resolved.descriptor.raw(), "video:first-child");

        assert!(matches!(
            resolver.resolve("video:last-child"),
            Err(SourceResolutionError::MalformedAddress { .. })
        ));
    }

    #[test]
    fn dotted_selectors_prefer_registered_elements() {
        let registry = MemoryRegistry::new();
        registry.insert("img.hero", Arc::new(MemoryElement::new(ElementKind::Image)));
        registry.insert("./img.hero", Arc::new(MemoryElement::new(ElementKind::Image)));
        let resolver = resolver(registry);

        let resolved = resolver.resolve("img.hero").unwrap();
        assert_eq!(resolved.descriptor.kind(), SourceKind::ElementReference);

        // Unregistered dotted names and explicit paths stay addresses.
        let unknown = resolver.resolve("img.poster").unwrap();
        assert_eq!(
            unknown.descriptor.url().unwrap().as_str(),
            "https://cdn.example.com/textures/img.poster"
        );
        let explicit = resolver.resolve("./img.hero").unwrap();
        assert_eq!(explicit.descriptor.kind(), SourceKind::NetworkAddress);
    }
}
