use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

// Global Image ID generator (uses u64 for cheap identity comparisons)
static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Pixel layout of decoded image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Rgba8,
}

impl PixelLayout {
    #[must_use]
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgba8 => 4,
        }
    }
}

#[derive(Debug)]
pub struct ImageInner {
    pub id: u64,
    pub uuid: Uuid,
    label: Cow<'static, str>,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

/// Decoded, immutable CPU-side pixel data. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Image(Arc<ImageInner>);

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}
impl Eq for Image {}
impl std::hash::Hash for Image {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl Image {
    #[must_use]
    pub fn new(label: Option<&str>, width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            (width * height * layout.bytes_per_pixel()) as usize,
            "image data does not match its dimensions"
        );
        Self(Arc::new(ImageInner {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            uuid: Uuid::new_v4(),
            label: label.map_or(Cow::Borrowed("Unnamed Image"), |s| Cow::Owned(s.to_string())),
            width,
            height,
            layout,
            data,
        }))
    }

    /// A 1x1 image of a single color, handy as a placeholder.
    #[must_use]
    pub fn solid(label: &str, rgba: [u8; 4]) -> Self {
        Self::new(Some(label), 1, 1, PixelLayout::Rgba8, rgba.to_vec())
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.0.label
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height
    }

    #[inline]
    #[must_use]
    pub fn layout(&self) -> PixelLayout {
        self.0.layout
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.0.data
    }
}
