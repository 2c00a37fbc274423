//! Error taxonomy for the geometry and estimation pipeline.

use thiserror::Error;

/// Result type for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors raised while preparing a model or computing an estimate.
///
/// None of these are fatal to the pipeline: the caller shows a message and
/// stops computing for the current model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// No mesh data found after parsing or merging.
    #[error("no mesh data found in model")]
    EmptyModel,

    /// File extension is not one of the supported container kinds.
    #[error("unsupported file format: .{extension}")]
    UnsupportedFormat {
        /// The rejected extension, lower-cased.
        extension: String,
    },

    /// Zero triangles or zero enclosed volume; there is nothing to estimate.
    #[error("model has no printable volume")]
    DegenerateGeometry,

    /// Buffer length or attribute layout is inconsistent.
    #[error("corrupt triangle buffer: {reason}")]
    CorruptBuffer {
        /// What was wrong with the buffer.
        reason: String,
    },

    /// Material name not present in the catalog.
    #[error("unknown material: {name}")]
    UnknownMaterial {
        /// Requested material.
        name: String,
    },

    /// Color variant name not present for the current material.
    #[error("unknown color variant '{variant}' for material {material}")]
    UnknownVariant {
        /// Current material.
        material: String,
        /// Requested variant.
        variant: String,
    },

    /// Color string is not `#rrggbb`.
    #[error("invalid color: {value}")]
    InvalidColor {
        /// The rejected string.
        value: String,
    },

    /// Container content could not be read.
    #[error("failed to load model: {message}")]
    Load {
        /// Description of the failure.
        message: String,
    },
}

impl GeometryError {
    /// Soft errors mean "no estimate" rather than a failed upload.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::DegenerateGeometry)
    }

    /// Create a `Load` error with the given message.
    #[must_use]
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    /// Create a `CorruptBuffer` error with the given reason.
    #[must_use]
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptBuffer {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for GeometryError {
    fn from(e: std::io::Error) -> Self {
        Self::load(format!("I/O error: {e}"))
    }
}
