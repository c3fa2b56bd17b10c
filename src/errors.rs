//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! Errors are split by the stage that produces them:
//! - [`SchemaError`]: an attribute schema declaration is inconsistent (fatal at construction)
//! - [`OptionParseError`]: an attribute value supplied by the host is not recognised
//! - [`SourceResolutionError`]: a texture source string cannot be classified
//! - [`UnsupportedElementError`]: a referenced scene element has no decoding strategy
//! - [`LoadError`]: fetching or decoding a texture failed
//!
//! The three per-slot failures are gathered into [`SlotError`], which is what
//! slot events carry. The umbrella [`Error`] covers everything and is what
//! [`Result<T>`] uses.

use std::time::Duration;

use thiserror::Error;

use crate::resources::attributes::AttrName;
use crate::resources::schema::ValueKind;

// ============================================================================
// Schema & Attribute Errors
// ============================================================================

/// An attribute schema declaration is invalid.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid schema entry `{attribute}`: {reason}")]
pub struct SchemaError {
    /// Canonical name of the offending attribute.
    pub attribute: &'static str,
    /// Human-readable description of the problem.
    pub reason: String,
}

/// A value supplied in an attribute map is not accepted by the schema.
///
/// The offending attribute falls back to its schema default; every other
/// attribute keeps resolving normally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionParseError {
    /// The value is not in the attribute's enumeration of legal values.
    #[error("`{value}` is not an allowed value for `{attribute}` (expected one of {allowed:?})")]
    NotAllowed {
        attribute: AttrName,
        value: String,
        allowed: &'static [&'static str],
    },

    /// The value names an engine constant that does not exist.
    #[error("`{value}` is not a known constant for `{attribute}`")]
    UnknownConstant { attribute: AttrName, value: String },

    /// The value has the wrong type for the attribute.
    #[error("`{attribute}` expects {expected:?}, got `{found}`")]
    TypeMismatch {
        attribute: AttrName,
        expected: ValueKind,
        found: String,
    },

    /// The value could not be parsed as a color.
    #[error("`{value}` is not a valid color for `{attribute}`")]
    InvalidColor { attribute: AttrName, value: String },
}

impl OptionParseError {
    /// The attribute whose value was rejected.
    #[must_use]
    pub fn attribute(&self) -> AttrName {
        match self {
            Self::NotAllowed { attribute, .. }
            | Self::UnknownConstant { attribute, .. }
            | Self::TypeMismatch { attribute, .. }
            | Self::InvalidColor { attribute, .. } => *attribute,
        }
    }
}

// ============================================================================
// Per-Slot Failures
// ============================================================================

/// A texture source string could not be classified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceResolutionError {
    /// The source string is empty.
    #[error("Texture source is empty")]
    Empty,

    /// The source looked like an element selector but nothing matched it.
    #[error("Selector `{0}` matched no element")]
    NoMatch(String),

    /// The source looked like an address but could not be parsed.
    #[error("Malformed address `{address}`: {reason}")]
    MalformedAddress { address: String, reason: String },
}

/// The referenced element exists but cannot back a texture.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Element `{selector}` of kind `{kind}` cannot be used as a texture")]
pub struct UnsupportedElementError {
    pub selector: String,
    pub kind: String,
}

/// Fetching or decoding a texture failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Local file I/O failed.
    #[error("IO error: {0}")]
    Io(String),

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP response error for {url}: status {status}")]
    Http { url: String, status: u16 },

    /// The address uses a scheme no fetcher understands.
    #[error("Unsupported address scheme `{0}`")]
    UnsupportedScheme(String),

    /// The bytes could not be decoded as an image.
    #[error("Image decode error: {0}")]
    Decode(String),

    /// The load did not finish within the configured timeout.
    #[error("Load timed out after {0:?}")]
    Timeout(Duration),

    /// The load task panicked or was aborted.
    #[error("Task join error: {0}")]
    TaskJoin(String),
}

impl From<image::ImageError> for LoadError {
    fn from(err: image::ImageError) -> Self {
        LoadError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for LoadError {
    fn from(err: base64::DecodeError) -> Self {
        LoadError::Decode(err.to_string())
    }
}

impl From<tokio::task::JoinError> for LoadError {
    fn from(err: tokio::task::JoinError) -> Self {
        LoadError::TaskJoin(err.to_string())
    }
}

/// Every way a single texture slot can end up `Failed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error(transparent)]
    Resolution(#[from] SourceResolutionError),

    #[error(transparent)]
    UnsupportedElement(#[from] UnsupportedElementError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

// ============================================================================
// Umbrella Error
// ============================================================================

/// The main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    OptionParse(#[from] OptionParseError),

    #[error(transparent)]
    Slot(#[from] SlotError),

    /// JSON parsing error (attribute maps, settings).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured base URL or asset root is unusable.
    #[error("Invalid base address `{0}`")]
    InvalidBase(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SourceResolutionError> for Error {
    fn from(err: SourceResolutionError) -> Self {
        Error::Slot(err.into())
    }
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        Error::Slot(err.into())
    }
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
