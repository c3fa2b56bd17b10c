pub mod element;
pub mod io;
pub mod loader;
pub mod source;
pub mod tracker;

pub use element::{
    ElementHandle, ElementKind, ElementRegistry, MemoryElement, MemoryRegistry, NoElements,
    SceneElement,
};
pub use io::{AssetFetcher, TextureFetcher};
pub use loader::{TextureLoader, runtime_handle};
pub use source::{ResolvedSource, SourceDescriptor, SourceKind, SourceResolver};
pub use tracker::{CompletionOutcome, LoadCompletion, SlotRequest, SlotState, SlotTracker, TextureSlot};
