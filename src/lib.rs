//! # Tessera
//!
//! Incremental texture resolution and material binding for declarative
//! scene components.
//!
//! A host hands a [`PhongComponent`] the full attribute map of a material
//! every time anything changes. The component works out what actually
//! changed: scalar values are written straight into the [`MaterialRecord`],
//! and only texture slots whose source string differs start a new load.
//! Loads race freely; per-slot generation tokens guarantee the material only
//! ever shows the result of the latest request.
//!
//! # Modules
//!
//! - [`resources`]: schema, constants, texture options, textures, material record
//! - [`assets`]: source resolution, fetching, loading, and the slot tracker
//! - [`component`]: the host-facing [`PhongComponent`]
//! - [`events`]: slot notifications
//! - [`settings`]: [`LoaderSettings`]
//! - [`errors`]: error taxonomy

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod assets;
pub mod component;
pub mod errors;
pub mod events;
pub mod resources;
pub mod settings;

pub use assets::{
    AssetFetcher, CompletionOutcome, ElementHandle, ElementKind, ElementRegistry, LoadCompletion,
    MemoryElement, MemoryRegistry, NoElements, SceneElement, SlotRequest, SlotState, SlotTracker,
    SourceDescriptor, SourceKind, SourceResolver, TextureFetcher, TextureLoader,
};
pub use component::{PhongComponent, UpdateReport};
pub use errors::{
    Error, LoadError, OptionParseError, Result, SchemaError, SlotError, SourceResolutionError,
    UnsupportedElementError,
};
pub use events::{EventSink, SlotEvent};
pub use resources::{
    AttrName, AttrValue, AttributeMap, AttributeSchema, Constant, ConstantKind, Image, MapSlot,
    MaterialRecord, OptionFragment, OptionSet, ScalarAttr, SharedMaterial, Texture, TextureOption,
    Value,
};
pub use settings::LoaderSettings;
