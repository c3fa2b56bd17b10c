//! Slot Events
//!
//! Outbound notifications about texture slots. Every event is logged when it
//! is emitted; the queue is an optional second channel for hosts that want
//! to react programmatically.

use std::fmt;

use crate::errors::{OptionParseError, SlotError};
use crate::resources::attributes::MapSlot;

#[derive(Debug, Clone, PartialEq)]
pub enum SlotEvent {
    /// A load finished and its texture is now bound.
    Loaded {
        slot: MapSlot,
        source: String,
        generation: u64,
    },
    /// The slot's latest request failed. Any previously bound texture stays.
    Failed {
        slot: MapSlot,
        source: String,
        error: SlotError,
    },
    /// The source was removed and the slot unbound.
    Cleared { slot: MapSlot },
    /// An attribute value was refused and replaced by its default.
    OptionRejected(OptionParseError),
}

impl fmt::Display for SlotEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded {
                slot,
                source,
                generation,
            } => write!(f, "`{slot}` loaded `{source}` (generation {generation})"),
            Self::Failed { slot, source, error } => {
                write!(f, "`{slot}` failed to load `{source}`: {error}")
            }
            Self::Cleared { slot } => write!(f, "`{slot}` cleared"),
            Self::OptionRejected(e) => write!(f, "{e}; using the default"),
        }
    }
}

/// Bounded event queue. When the receiver falls behind, new events are
/// dropped from the queue (they have already been logged).
pub struct EventSink {
    tx: flume::Sender<SlotEvent>,
    rx: flume::Receiver<SlotEvent>,
}

impl EventSink {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = flume::bounded(capacity.max(1));
        Self { tx, rx }
    }

    pub fn emit(&self, event: SlotEvent) {
        match &event {
            SlotEvent::Loaded { .. } => log::info!("{event}"),
            SlotEvent::Cleared { .. } => log::debug!("{event}"),
            SlotEvent::Failed { .. } | SlotEvent::OptionRejected(_) => log::warn!("{event}"),
        }
        if let Err(flume::TrySendError::Full(dropped)) = self.tx.try_send(event) {
            log::trace!("Event queue full, dropping: {dropped}");
        }
    }

    /// A receiver for the queued events. All receivers share one queue.
    #[must_use]
    pub fn receiver(&self) -> flume::Receiver<SlotEvent> {
        self.rx.clone()
    }

    /// Removes and returns everything currently queued.
    pub fn drain(&self) -> Vec<SlotEvent> {
        self.rx.drain().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceResolutionError;

    #[test]
    fn full_queue_drops_new_events() {
        let sink = EventSink::new(1);
        sink.emit(SlotEvent::Cleared { slot: MapSlot::Map });
        sink.emit(SlotEvent::Failed {
            slot: MapSlot::BumpMap,
            source: "#gone".into(),
            error: SourceResolutionError::NoMatch("#gone".into()).into(),
        });
        assert_eq!(sink.drain(), vec![SlotEvent::Cleared { slot: MapSlot::Map }]);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn events_describe_themselves() {
        let event = SlotEvent::Loaded {
            slot: MapSlot::NormalMap,
            source: "n.png".into(),
            generation: 3,
        };
        assert_eq!(event.to_string(), "`normalMap` loaded `n.png` (generation 3)");
    }
}
