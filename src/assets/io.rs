use std::path::Path;

use base64::Engine;
use futures::future::BoxFuture;
use url::Url;

use crate::errors::LoadError;
use crate::resources::image::{Image, PixelLayout};

/// Fetch/decode primitive for address sources.
///
/// Implementations must not share in-flight requests between calls; each
/// call is an independent attempt.
pub trait TextureFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> BoxFuture<'static, Result<Image, LoadError>>;
}

/// Default fetcher: local files, `data:` URIs, and HTTP (feature `http`),
/// decoded with the `image` crate on the blocking thread pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssetFetcher;

impl AssetFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reads the raw bytes behind an address.
    pub async fn read_bytes(url: &Url) -> Result<Vec<u8>, LoadError> {
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| LoadError::Io(format!("not a local path: {url}")))?;
                read_file(&path).await
            }
            "data" => decode_data_uri(url.as_str()),
            "http" | "https" => read_http(url).await,
            other => Err(LoadError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Unified image decoding helper (offloads to the blocking thread pool).
    pub async fn decode_image_async(bytes: Vec<u8>, label: String) -> Result<Image, LoadError> {
        tokio::task::spawn_blocking(move || Self::decode_image_cpu(&bytes, &label)).await?
    }

    /// CPU image decoding logic.
    pub fn decode_image_cpu(bytes: &[u8], label: &str) -> Result<Image, LoadError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| LoadError::Decode(format!("Failed to decode image {label}: {e}")))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Image::new(
            Some(label),
            width,
            height,
            PixelLayout::Rgba8,
            rgba.into_raw(),
        ))
    }
}

impl TextureFetcher for AssetFetcher {
    fn fetch(&self, url: &Url) -> BoxFuture<'static, Result<Image, LoadError>> {
        let url = url.clone();
        Box::pin(async move {
            let bytes = Self::read_bytes(&url).await?;
            let label = source_filename(&url).to_string();
            Self::decode_image_async(bytes, label).await
        })
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| LoadError::Io(format!("{}: {e}", path.display())))
}

#[cfg(feature = "http")]
async fn read_http(url: &Url) -> Result<Vec<u8>, LoadError> {
    let response = ehttp::fetch_async(ehttp::Request::get(url.as_str()))
        .await
        .map_err(LoadError::Network)?;
    if !response.ok {
        return Err(LoadError::Http {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(response.bytes)
}

#[cfg(not(feature = "http"))]
async fn read_http(url: &Url) -> Result<Vec<u8>, LoadError> {
    Err(LoadError::UnsupportedScheme(format!(
        "{} (enable the `http` feature)",
        url.scheme()
    )))
}

/// Decodes `data:[<mime>];base64,<payload>`.
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, LoadError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| LoadError::Decode("not a data URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::Decode("data URI has no payload".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(LoadError::Decode(
            "only base64 data URIs are supported".to_string(),
        ));
    }
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

/// The file name part of an address, used as a label.
#[must_use]
pub fn source_filename(url: &Url) -> &str {
    if url.scheme() == "data" {
        return "data-uri";
    }
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or(url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_requires_base64() {
        assert_eq!(decode_data_uri("data:text/plain;base64,aGk=").unwrap(), b"hi");
        assert!(decode_data_uri("data:text/plain,hi").is_err());
        assert!(decode_data_uri("data:text/plain;base64").is_err());
    }

    #[test]
    fn filename_of_an_address() {
        let url = Url::parse("https://example.com/textures/crate.jpg?v=2").unwrap();
        assert_eq!(source_filename(&url), "crate.jpg");
        let root = Url::parse("https://example.com/").unwrap();
        assert_eq!(source_filename(&root), "https://example.com/");
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            AssetFetcher::decode_image_cpu(b"definitely not a png", "junk"),
            Err(LoadError::Decode(_))
        ));
    }
}
