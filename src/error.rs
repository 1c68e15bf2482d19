//! Error types for firmware image exploration.
//!
//! Failures fall in two groups. Structural problems (the external parser
//! rejected the buffer, the tree handed us an invalid node, the descriptor is
//! shorter than its layout) abort the whole explore. Report cache problems
//! are reported to the caller but never prevent a freshly computed report
//! from being returned.

use std::path::PathBuf;
use thiserror::Error;

use crate::io::error::IoError;

/// Main error type for image exploration.
#[derive(Debug, Error)]
pub enum ImageInfoError {
    /// The external structural parser rejected the image
    #[error("Structural parse failed: {message}")]
    StructuralParse { message: String },

    /// Traversal reached a node the tree reports as invalid
    #[error("Invalid tree node encountered while {context}")]
    InvalidNode { context: String },

    /// A fixed-layout structure is shorter than its definition
    #[error("Truncated {what}: expected {expected} bytes, found {actual}")]
    TruncatedData {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Reports directory could not be created or a report file not written/read
    #[error("Report cache I/O error at {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Refused to overwrite an existing cached report
    #[error("Report already exists at {}", path.display())]
    ReportExists { path: PathBuf },

    /// Cached report is missing keys or holds mistyped values
    #[error("Malformed report {}: {message}", path.display())]
    MalformedReport { path: PathBuf, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Image file loading errors
    #[error("Image I/O error: {0}")]
    ImageIo(#[from] IoError),
}

impl ImageInfoError {
    /// Whether this error aborts an explore. Cache failures do not: the
    /// report is still returned, just not persisted.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ImageInfoError::CacheIo { .. } | ImageInfoError::ReportExists { .. }
        )
    }

    pub(crate) fn truncated(what: &'static str, expected: usize, actual: usize) -> Self {
        ImageInfoError::TruncatedData {
            what,
            expected,
            actual,
        }
    }
}

/// Result type alias for image exploration
pub type Result<T> = std::result::Result<T, ImageInfoError>;
