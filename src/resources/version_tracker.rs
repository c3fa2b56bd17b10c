/// Change tracker - version counter plus a dirty flag owned by the consumer.
///
/// Writers call [`changed`](Self::changed); the renderer reads the flag with
/// [`take_dirty`](Self::take_dirty) once per frame. Writers never clear it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeTracker {
    version: u64,
    dirty: bool,
}

impl ChangeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: 0,
            dirty: false,
        }
    }

    /// Marks as modified, increments version by 1
    pub fn changed(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.dirty = true;
    }

    /// Gets the current version number
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the dirty flag and clears it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_sets_dirty_and_bumps_version() {
        let mut tracker = ChangeTracker::new();
        assert!(!tracker.is_dirty());
        tracker.changed();
        tracker.changed();
        assert_eq!(tracker.version(), 2);
        assert!(tracker.take_dirty());
        assert!(!tracker.take_dirty());
        assert_eq!(tracker.version(), 2);
    }
}
