//! Error types for the capx score model
//!
//! Defines the error hierarchy for model construction, with fatal errors
//! (missing archive entries, missing `defaultTime`, malformed tuplets) kept
//! separate from missing-optional data, which always resolves to defaults
//! and never surfaces here.

use thiserror::Error;

/// Top-level error for score model operations
#[derive(Debug, Error)]
pub enum ScoreError {
    /// Fatal XML parsing error
    #[error("XML parsing failed: {0}")]
    Parse(#[from] ParseError),

    /// Archive container error
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Duration computation failed for an event
    #[error("duration computation failed: {0}")]
    Duration(#[from] DurationError),

    /// A staff fragment without a `defaultTime` attribute cannot anchor
    /// duration computation for its voices.
    #[error("staff of part '{part}' in system {system} has no defaultTime attribute")]
    MissingDefaultTime { part: String, system: usize },

    /// Persist was called on a score that was built from a string, not an
    /// archive.
    #[error("score has no backing archive to persist into")]
    NoBackingArchive,

    /// XML serialization error on write-back
    #[error("XML serialization failed: {0}")]
    Serialize(String),
}

/// Fatal XML parsing errors
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// XML is malformed (not well-formed)
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// Required structural element or attribute is missing
    #[error("Missing required element: {0}")]
    MissingRequiredElement(String),
}

/// Errors from the zip container layer
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The well-known content entry is absent from the container.
    #[error("archive has no entry named '{entry}'")]
    MissingEntry { entry: String },
}

/// Errors from exact duration computation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DurationError {
    /// A value that should parse as `n` or `n/d` did not
    #[error("invalid rational value: '{0}'")]
    InvalidRational(String),

    /// A `duration` element without a `base` attribute is malformed
    #[error("duration element has no base attribute")]
    MissingBase,

    /// Attribute present but unparseable (dots, tuplet count, ...)
    #[error("invalid {name} attribute: '{value}'")]
    InvalidAttribute { name: &'static str, value: String },

    /// The tuplet power-of-two search exhausted its iteration bound.
    /// Malformed descriptors surface here instead of looping.
    #[error("tuplet ratio search did not converge for count {count}")]
    TupletNonConvergent { count: i64 },

    /// A time signature that is neither a named signature nor a rational
    #[error("unknown time signature: '{0}'")]
    UnknownTimeSignature(String),
}
