//! Resource Loader
//!
//! Turns a [`SourceDescriptor`] plus an [`OptionSet`] into a [`Texture`].
//! Addresses go through the external [`TextureFetcher`]; element references
//! are wrapped live without fetching anything.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::runtime::{Handle, Runtime};

use crate::assets::element::ElementKind;
use crate::assets::io::{TextureFetcher, source_filename};
use crate::assets::source::SourceDescriptor;
use crate::errors::{LoadError, SlotError, UnsupportedElementError};
use crate::resources::options::OptionSet;
use crate::resources::texture::Texture;

fn get_asset_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create asset loader runtime"))
}

/// The caller's runtime if there is one, otherwise a shared background runtime.
#[must_use]
pub fn runtime_handle() -> Handle {
    Handle::try_current().unwrap_or_else(|_| get_asset_runtime().handle().clone())
}

#[derive(Clone)]
pub struct TextureLoader {
    fetcher: Arc<dyn TextureFetcher>,
    timeout: Option<Duration>,
}

impl TextureLoader {
    #[must_use]
    pub fn new(fetcher: Arc<dyn TextureFetcher>, timeout: Option<Duration>) -> Self {
        Self { fetcher, timeout }
    }

    /// Fails early for element references that no load could ever turn into
    /// a texture.
    pub fn check_supported(source: &SourceDescriptor) -> Result<(), UnsupportedElementError> {
        match source {
            SourceDescriptor::Element { raw, element } => match element.kind() {
                ElementKind::Image | ElementKind::Video => Ok(()),
                ElementKind::Other(tag) => Err(UnsupportedElementError {
                    selector: raw.clone(),
                    kind: tag,
                }),
            },
            SourceDescriptor::Address { .. } => Ok(()),
        }
    }

    /// Starts one independent load. The returned future owns everything it
    /// needs and can be spawned.
    #[must_use]
    pub fn load(
        &self,
        source: SourceDescriptor,
        options: Arc<OptionSet>,
    ) -> BoxFuture<'static, Result<Arc<Texture>, SlotError>> {
        if let Err(e) = Self::check_supported(&source) {
            return Box::pin(async move { Err(e.into()) });
        }

        match source {
            SourceDescriptor::Element { raw, element } => {
                let texture = Arc::new(Texture::from_element(&raw, element, options));
                Box::pin(async move { Ok(texture) })
            }
            SourceDescriptor::Address { url, .. } => {
                let fetch = self.fetcher.fetch(&url);
                let timeout = self.timeout;
                let name = source_filename(&url).to_string();
                Box::pin(async move {
                    let image = match timeout {
                        Some(limit) => tokio::time::timeout(limit, fetch)
                            .await
                            .map_err(|_| LoadError::Timeout(limit))??,
                        None => fetch.await?,
                    };
                    Ok(Arc::new(Texture::from_image(&name, image, options)))
                })
            }
        }
    }
}
