//! Slot Tracker
//!
//! Owns one [`TextureSlot`] per referenced [`MapSlot`] and decides, per
//! attribute update, which slots need a new load.
//!
//! # Generations
//!
//! Every time a slot's requested source changes its generation is bumped and
//! a load tagged with that generation is spawned. Loads report back through a
//! channel as [`LoadCompletion`]s; [`SlotTracker::complete`] only accepts a
//! completion whose generation is still the slot's current one. Anything
//! older was superseded and is dropped without touching the slot.
//!
//! ```text
//!  Unloaded ──changed source──▶ Loading ──current ok──▶ Loaded
//!      ▲                          │  ▲                     │
//!      │                          │  └──changed source─────┤
//!   cleared                 current err                    │
//!      │                          ▼                        │
//!      └──────────────────────  Failed ◀───────────────────┘
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use rustc_hash::FxHashMap;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::AbortHandle;

use crate::assets::loader::TextureLoader;
use crate::assets::source::SourceResolver;
use crate::errors::{LoadError, SlotError};
use crate::resources::attributes::MapSlot;
use crate::resources::options::{OptionFragment, OptionSet};
use crate::resources::texture::Texture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SlotState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// Per-slot bookkeeping.
#[derive(Debug, Default)]
pub struct TextureSlot {
    requested: Option<String>,
    generation: u64,
    applied: Option<Arc<Texture>>,
    state: SlotState,
    task: Option<AbortHandle>,
}

impl TextureSlot {
    #[must_use]
    pub fn requested(&self) -> Option<&str> {
        self.requested.as_deref()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn applied(&self) -> Option<&Arc<Texture>> {
        self.applied.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> SlotState {
        self.state
    }

    fn disown_task(&mut self, abort: bool) {
        if let Some(task) = self.task.take() {
            if abort {
                task.abort();
            }
        }
    }
}

/// A finished load, tagged with the generation it was issued for.
#[derive(Debug)]
pub struct LoadCompletion {
    pub slot: MapSlot,
    pub generation: u64,
    pub source: String,
    pub result: Result<Arc<Texture>, SlotError>,
}

/// What a source request did to a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotRequest {
    /// Same source as last time; nothing happened.
    Unchanged,
    /// A load was spawned for this generation.
    Issued { generation: u64 },
    /// The source was removed; the slot is back to `Unloaded`.
    Cleared,
    /// The source could not be resolved; the slot is now `Failed`.
    Failed { generation: u64, error: SlotError },
}

/// What applying a completion did to a slot.
#[derive(Debug)]
pub enum CompletionOutcome {
    Applied {
        slot: MapSlot,
        source: String,
        generation: u64,
        texture: Arc<Texture>,
    },
    Failed {
        slot: MapSlot,
        source: String,
        generation: u64,
        error: SlotError,
    },
    /// Superseded by a newer request and dropped.
    Stale { slot: MapSlot, generation: u64 },
}

pub struct SlotTracker {
    slots: FxHashMap<MapSlot, TextureSlot>,
    resolver: SourceResolver,
    loader: TextureLoader,
    defaults: OptionSet,
    runtime: Handle,
    cancel_superseded: bool,
    completions_tx: flume::Sender<LoadCompletion>,
    completions_rx: flume::Receiver<LoadCompletion>,
    outstanding: Arc<Outstanding>,
    loads_issued: u64,
}

/// Running load tasks, with a wakeup whenever one stops.
#[derive(Default)]
struct Outstanding {
    count: AtomicUsize,
    stopped: Notify,
}

/// Held by a load task; dropped when it finishes or is aborted.
struct OutstandingGuard(Arc<Outstanding>);

impl OutstandingGuard {
    fn new(outstanding: &Arc<Outstanding>) -> Self {
        outstanding.count.fetch_add(1, Ordering::AcqRel);
        Self(outstanding.clone())
    }
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.0.count.fetch_sub(1, Ordering::AcqRel);
        self.0.stopped.notify_waiters();
    }
}

impl SlotTracker {
    #[must_use]
    pub fn new(
        resolver: SourceResolver,
        loader: TextureLoader,
        defaults: OptionSet,
        runtime: Handle,
        cancel_superseded: bool,
    ) -> Self {
        let (completions_tx, completions_rx) = flume::unbounded();
        Self {
            slots: FxHashMap::default(),
            resolver,
            loader,
            defaults,
            runtime,
            cancel_superseded,
            completions_tx,
            completions_rx,
            outstanding: Arc::default(),
            loads_issued: 0,
        }
    }

    /// Requests `source` for `slot`, issuing a load if it differs from the
    /// slot's last requested source.
    pub fn request(
        &mut self,
        slot: MapSlot,
        source: Option<&str>,
        globals: &OptionFragment,
    ) -> SlotRequest {
        if source.is_none() && !self.slots.contains_key(&slot) {
            return SlotRequest::Unchanged;
        }

        let cancel = self.cancel_superseded;
        let entry = self.slots.entry(slot).or_default();
        if entry.requested.as_deref() == source {
            return SlotRequest::Unchanged;
        }

        entry.generation += 1;
        entry.requested = source.map(str::to_string);
        entry.disown_task(cancel);
        let generation = entry.generation;

        let Some(source) = source else {
            log::debug!("Slot `{slot}` cleared at generation {generation}");
            entry.applied = None;
            entry.state = SlotState::Unloaded;
            return SlotRequest::Cleared;
        };

        let resolved = match self.resolver.resolve(source) {
            Ok(resolved) => resolved,
            Err(e) => {
                entry.state = SlotState::Failed;
                return SlotRequest::Failed {
                    generation,
                    error: e.into(),
                };
            }
        };

        if let Err(e) = TextureLoader::check_supported(&resolved.descriptor) {
            entry.state = SlotState::Failed;
            return SlotRequest::Failed {
                generation,
                error: e.into(),
            };
        }

        let options = Arc::new(OptionSet::merge(&self.defaults, globals, &resolved.overrides));
        let load = self.loader.load(resolved.descriptor, options);
        let tx = self.completions_tx.clone();
        let guard = OutstandingGuard::new(&self.outstanding);
        let source = source.to_string();

        log::debug!("Slot `{slot}` loading `{source}` (generation {generation})");
        let task = self.runtime.spawn(async move {
            let _guard = guard;
            let result = AssertUnwindSafe(load)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(LoadError::TaskJoin("load panicked".to_string()).into()));
            let completion = LoadCompletion {
                slot,
                generation,
                source,
                result,
            };
            if tx.send(completion).is_err() {
                log::debug!("Slot `{slot}` completion dropped: tracker is gone");
            }
        });

        entry.task = Some(task.abort_handle());
        entry.state = SlotState::Loading;
        self.loads_issued += 1;
        SlotRequest::Issued { generation }
    }

    /// Applies a completion to its slot if it is still current.
    pub fn complete(&mut self, completion: LoadCompletion) -> CompletionOutcome {
        let LoadCompletion {
            slot,
            generation,
            source,
            result,
        } = completion;

        let Some(entry) = self.slots.get_mut(&slot).filter(|e| e.generation == generation) else {
            log::debug!("Discarding stale load of `{source}` for slot `{slot}` (generation {generation})");
            return CompletionOutcome::Stale { slot, generation };
        };

        entry.task = None;
        match result {
            Ok(texture) => {
                entry.applied = Some(texture.clone());
                entry.state = SlotState::Loaded;
                CompletionOutcome::Applied {
                    slot,
                    source,
                    generation,
                    texture,
                }
            }
            Err(error) => {
                // Keep the last good texture visible.
                entry.state = SlotState::Failed;
                CompletionOutcome::Failed {
                    slot,
                    source,
                    generation,
                    error,
                }
            }
        }
    }

    /// A completion that has already arrived, if any.
    #[must_use]
    pub fn try_next_completion(&self) -> Option<LoadCompletion> {
        self.completions_rx.try_recv().ok()
    }

    /// Waits for the next completion. Returns `None` once every spawned load
    /// has finished (or been aborted) and its completion has been taken.
    pub async fn next_completion(&self) -> Option<LoadCompletion> {
        loop {
            // Tasks send before they stop counting as outstanding.
            let stopped = self.outstanding.stopped.notified();
            if let Ok(completion) = self.completions_rx.try_recv() {
                return Some(completion);
            }
            if self.pending_tasks() == 0 {
                return self.completions_rx.try_recv().ok();
            }
            tokio::select! {
                completion = self.completions_rx.recv_async() => return completion.ok(),
                () = stopped => {}
            }
        }
    }

    /// Spawned loads whose task is still running, including superseded ones
    /// that were not aborted.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.outstanding.count.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn slot(&self, slot: MapSlot) -> Option<&TextureSlot> {
        self.slots.get(&slot)
    }

    #[must_use]
    pub fn state(&self, slot: MapSlot) -> SlotState {
        self.slots.get(&slot).map_or(SlotState::Unloaded, TextureSlot::state)
    }

    #[must_use]
    pub fn generation(&self, slot: MapSlot) -> u64 {
        self.slots.get(&slot).map_or(0, TextureSlot::generation)
    }

    /// Total loads spawned since creation.
    #[must_use]
    pub fn loads_issued(&self) -> u64 {
        self.loads_issued
    }

    /// Slots currently waiting on a load.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.slots
            .values()
            .filter(|s| s.state == SlotState::Loading)
            .count()
    }

    /// Forgets every slot, aborting their loads.
    pub fn clear(&mut self) {
        for (_, mut slot) in self.slots.drain() {
            slot.disown_task(true);
        }
    }
}

impl Drop for SlotTracker {
    fn drop(&mut self) {
        self.clear();
    }
}
