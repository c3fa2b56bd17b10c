//! Loader Settings
//!
//! Configuration for how texture sources are resolved and loaded.
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use tessera::LoaderSettings;
//!
//! let settings = LoaderSettings::default()
//!     .with_asset_root("assets")
//!     .with_load_timeout(Duration::from_secs(10));
//!
//! // Or from JSON:
//! let settings = LoaderSettings::from_json(r#"{"load_timeout_ms": 5000}"#)?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Directory relative texture paths are resolved against.
    pub asset_root: PathBuf,

    /// When set, relative texture paths are joined onto this URL instead of
    /// `asset_root` (e.g. `https://cdn.example.com/textures/`).
    pub base_url: Option<String>,

    /// Element attribute holding per-element texture option overrides.
    pub override_attribute: String,

    /// Per-load timeout in milliseconds. `None` waits indefinitely.
    pub load_timeout_ms: Option<u64>,

    /// Abort the task of a load once a newer request supersedes it.
    /// Stale results are discarded either way.
    pub cancel_superseded: bool,

    /// Capacity of the slot event queue. Events beyond it are dropped from
    /// the queue (they are still logged).
    pub event_capacity: usize,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            base_url: None,
            override_attribute: "texture".to_string(),
            load_timeout_ms: None,
            cancel_superseded: true,
            event_capacity: 256,
        }
    }
}

impl LoaderSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_override_attribute(mut self, name: impl Into<String>) -> Self {
        self.override_attribute = name.into();
        self
    }

    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    #[must_use]
    pub fn with_cancel_superseded(mut self, cancel: bool) -> Self {
        self.cancel_superseded = cancel;
        self
    }

    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}
