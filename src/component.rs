//! Phong Component
//!
//! [`PhongComponent`] is the entry point a host drives. It owns the schema,
//! the slot tracker, and the material record, and glues them together:
//!
//! - **Schema**: types the raw attribute map, substituting defaults for
//!   anything it refuses
//! - **Scalars**: written straight into the [`MaterialRecord`]
//! - **Texture slots**: diffed by the [`SlotTracker`], which only loads what
//!   changed
//! - **Completions**: applied on the owner's thread, never from a load task
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tessera::{AssetFetcher, AttributeMap, LoaderSettings, NoElements, PhongComponent};
//!
//! let mut phong = PhongComponent::new(
//!     &LoaderSettings::default().with_asset_root("assets"),
//!     Arc::new(NoElements),
//!     Arc::new(AssetFetcher::new()),
//! )?;
//!
//! phong.update(&AttributeMap::new().with("map", "crate.png").with("wrapS", "RepeatWrapping"));
//!
//! // Once per frame:
//! phong.process_completions();
//! phong.tick();
//! if phong.material().write().take_dirty() {
//!     // ... re-upload ...
//! }
//! ```

use std::sync::Arc;

use smallvec::SmallVec;
use tokio::runtime::Handle;

use crate::assets::element::ElementRegistry;
use crate::assets::io::TextureFetcher;
use crate::assets::loader::{TextureLoader, runtime_handle};
use crate::assets::source::SourceResolver;
use crate::assets::tracker::{CompletionOutcome, LoadCompletion, SlotRequest, SlotState, SlotTracker};
use crate::errors::{OptionParseError, Result};
use crate::events::{EventSink, SlotEvent};
use crate::resources::attributes::{AttributeMap, MapSlot, ScalarAttr};
use crate::resources::material::{MaterialRecord, SharedMaterial};
use crate::resources::options::{OptionFragment, OptionSet};
use crate::resources::schema::AttributeSchema;
use crate::settings::LoaderSettings;

/// What one [`PhongComponent::update`] call did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateReport {
    /// Slots that started a new load.
    pub issued: SmallVec<[MapSlot; 4]>,
    /// Slots whose source could not be resolved.
    pub failed: SmallVec<[MapSlot; 4]>,
    /// Slots whose source was removed.
    pub cleared: SmallVec<[MapSlot; 4]>,
    /// Scalars whose value changed.
    pub scalars_changed: SmallVec<[ScalarAttr; 4]>,
    /// Attribute values replaced by their default.
    pub rejected_options: Vec<OptionParseError>,
}

impl UpdateReport {
    /// `true` when the update neither loaded nor changed anything.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.issued.is_empty()
            && self.failed.is_empty()
            && self.cleared.is_empty()
            && self.scalars_changed.is_empty()
    }
}

pub struct PhongComponent {
    schema: Arc<AttributeSchema>,
    tracker: SlotTracker,
    material: SharedMaterial,
    events: EventSink,
}

impl PhongComponent {
    /// Creates a component whose loads run on the current tokio runtime, or
    /// on a shared background runtime when called outside of one.
    pub fn new(
        settings: &LoaderSettings,
        registry: Arc<dyn ElementRegistry>,
        fetcher: Arc<dyn TextureFetcher>,
    ) -> Result<Self> {
        Self::with_runtime(settings, registry, fetcher, runtime_handle())
    }

    pub fn with_runtime(
        settings: &LoaderSettings,
        registry: Arc<dyn ElementRegistry>,
        fetcher: Arc<dyn TextureFetcher>,
        runtime: Handle,
    ) -> Result<Self> {
        let schema = Arc::new(AttributeSchema::phong()?);
        let resolver = SourceResolver::new(settings, registry, schema.clone())?;
        let loader = TextureLoader::new(fetcher, settings.load_timeout());
        let defaults = OptionSet::from_schema(&schema);
        let tracker = SlotTracker::new(
            resolver,
            loader,
            defaults,
            runtime,
            settings.cancel_superseded,
        );

        Ok(Self {
            schema,
            tracker,
            material: MaterialRecord::new().into_shared(),
            events: EventSink::new(settings.event_capacity),
        })
    }

    /// Applies the full current attribute map.
    ///
    /// Scalars are written immediately. Each texture slot whose source differs
    /// from its last request starts exactly one new load; slots with an
    /// unchanged source are left alone even if texture options changed.
    pub fn update(&mut self, attributes: &AttributeMap) -> UpdateReport {
        let resolved = self.schema.resolve(attributes);
        let mut report = UpdateReport::default();

        for rejected in resolved.rejected() {
            self.events.emit(SlotEvent::OptionRejected(rejected.clone()));
        }
        report.rejected_options = resolved.rejected().to_vec();

        {
            let mut material = self.material.write();
            for &attr in ScalarAttr::ALL {
                if let Some(value) = resolved.get(attr) {
                    if material.apply_scalar(attr, value) {
                        report.scalars_changed.push(attr);
                    }
                }
            }
        }

        let globals = OptionFragment::from_attributes(&resolved);
        for &slot in MapSlot::ALL {
            let source = resolved.source(slot);
            match self.tracker.request(slot, source, &globals) {
                SlotRequest::Unchanged => {}
                SlotRequest::Issued { .. } => report.issued.push(slot),
                SlotRequest::Cleared => {
                    self.material.write().bind_texture(slot, None);
                    self.events.emit(SlotEvent::Cleared { slot });
                    report.cleared.push(slot);
                }
                SlotRequest::Failed { error, .. } => {
                    self.events.emit(SlotEvent::Failed {
                        slot,
                        source: source.unwrap_or_default().to_string(),
                        error,
                    });
                    report.failed.push(slot);
                }
            }
        }

        report
    }

    /// Applies every completion that has already arrived. Call once per
    /// frame. Returns how many were still current.
    pub fn process_completions(&mut self) -> usize {
        let mut current = 0;
        while let Some(completion) = self.tracker.try_next_completion() {
            if !matches!(self.apply(completion), CompletionOutcome::Stale { .. }) {
                current += 1;
            }
        }
        current
    }

    /// Waits for the next load to finish and applies it. Returns `None` when
    /// nothing is left to wait for.
    pub async fn next_completion(&mut self) -> Option<CompletionOutcome> {
        let completion = self.tracker.next_completion().await?;
        Some(self.apply(completion))
    }

    /// Waits until no load is running and applies everything. Returns the
    /// outcomes in arrival order.
    pub async fn settle(&mut self) -> Vec<CompletionOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.next_completion().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    fn apply(&mut self, completion: LoadCompletion) -> CompletionOutcome {
        let outcome = self.tracker.complete(completion);
        match &outcome {
            CompletionOutcome::Applied {
                slot,
                source,
                generation,
                texture,
            } => {
                self.material.write().bind_texture(*slot, Some(texture.clone()));
                self.events.emit(SlotEvent::Loaded {
                    slot: *slot,
                    source: source.clone(),
                    generation: *generation,
                });
            }
            CompletionOutcome::Failed {
                slot,
                source,
                error,
                ..
            } => {
                self.events.emit(SlotEvent::Failed {
                    slot: *slot,
                    source: source.clone(),
                    error: error.clone(),
                });
            }
            CompletionOutcome::Stale { .. } => {}
        }
        outcome
    }

    /// Picks up new frames from element-backed textures. Returns `true` if
    /// the material needs re-uploading because of it.
    pub fn tick(&mut self) -> bool {
        self.material.write().refresh_element_textures()
    }

    /// Cancels every load and unbinds every texture. Scalars are kept.
    pub fn remove(&mut self) {
        self.tracker.clear();
        let mut material = self.material.write();
        for &slot in MapSlot::ALL {
            material.bind_texture(slot, None);
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn material(&self) -> &SharedMaterial {
        &self.material
    }

    #[must_use]
    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    /// Receiver for slot events.
    #[must_use]
    pub fn events(&self) -> flume::Receiver<SlotEvent> {
        self.events.receiver()
    }

    /// Removes and returns all queued slot events.
    pub fn drain_events(&self) -> Vec<SlotEvent> {
        self.events.drain()
    }

    #[must_use]
    pub fn slot_state(&self, slot: MapSlot) -> SlotState {
        self.tracker.state(slot)
    }

    #[must_use]
    pub fn generation(&self, slot: MapSlot) -> u64 {
        self.tracker.generation(slot)
    }

    #[must_use]
    pub fn requested_source(&self, slot: MapSlot) -> Option<&str> {
        self.tracker.slot(slot).and_then(|s| s.requested())
    }

    /// Total loads started since creation.
    #[must_use]
    pub fn loads_issued(&self) -> u64 {
        self.tracker.loads_issued()
    }

    #[must_use]
    pub fn tracker(&self) -> &SlotTracker {
        &self.tracker
    }
}
