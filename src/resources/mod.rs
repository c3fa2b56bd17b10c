//! Core data definitions, independent of how anything is loaded:
//! - Schema: attribute declarations and typed values
//! - Constants: named engine constants
//! - Options: per-texture sampling/upload options
//! - Texture / Image: resolved resources
//! - Material: the record the renderer reads

pub mod attributes;
pub mod constants;
pub mod image;
pub mod material;
pub mod options;
pub mod schema;
pub mod texture;
pub mod version_tracker;

pub use attributes::{AttrName, AttrValue, AttributeMap, MapSlot, ScalarAttr};
pub use constants::{Constant, ConstantKind};
pub use image::{Image, PixelLayout};
pub use material::{MaterialRecord, MaterialTextures, SharedMaterial};
pub use options::{OptionFragment, OptionSet, TextureOption};
pub use schema::{AttributeSchema, AttributeSpec, ResolvedAttributes, Value, ValueKind};
pub use texture::{Texture, TextureSource};
pub use version_tracker::ChangeTracker;
