//! Mesh input adapter: container bytes → `RawModel` → `LoadedModel`.
//!
//! Only the two container kinds the shop accepts are recognized, by file
//! extension: `.stl` (single mesh) and `.3mf` (multi-part scene).

mod stl;
mod threemf;

use std::path::Path;

use crate::error::{GeometryError, GeometryResult};
use crate::model::{LoadedModel, RawModel};
use crate::validation::BufferValidator;

pub use stl::parse_stl;
pub use threemf::parse_3mf;

/// Supported container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Stl,
    ThreeMf,
}

impl ModelFormat {
    /// Detect the format from a file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` for anything but `stl` and `3mf`.
    pub fn from_extension(extension: &str) -> GeometryResult<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "stl" => Ok(Self::Stl),
            "3mf" => Ok(Self::ThreeMf),
            other => Err(GeometryError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    /// Detect the format from a file name or path.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` when the extension is missing or unknown.
    pub fn from_path<P: AsRef<Path>>(path: P) -> GeometryResult<Self> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::ThreeMf => "3mf",
        }
    }
}

/// Parse container bytes without normalizing.
///
/// # Errors
///
/// Returns `Load` if the bytes are not a valid container of `format`.
pub fn parse(format: ModelFormat, bytes: &[u8]) -> GeometryResult<RawModel> {
    match format {
        ModelFormat::Stl => parse_stl(bytes).map(RawModel::Mesh),
        ModelFormat::ThreeMf => parse_3mf(bytes).map(RawModel::Scene),
    }
}

/// Parse and normalize an uploaded file.
///
/// The format is decided from `file_name` before the bytes are looked at.
///
/// # Errors
///
/// `UnsupportedFormat`, `Load` or `EmptyModel`.
pub fn load_bytes(file_name: &str, bytes: &[u8]) -> GeometryResult<LoadedModel> {
    let format = ModelFormat::from_path(file_name)?;
    let raw = parse(format, bytes)?;
    let model = LoadedModel::from_raw(raw)?;

    let validator = BufferValidator::new(model.calculation_buffer());
    if !validator.is_watertight() {
        tracing::warn!(
            "{}: surface is not closed, volume is approximate ({} triangles)",
            file_name,
            validator.triangle_count()
        );
    }
    tracing::info!(
        "Loaded {} ({:?}): {} triangles",
        file_name,
        format,
        validator.triangle_count()
    );
    Ok(model)
}

/// Read and load a model file from disk.
///
/// # Errors
///
/// `UnsupportedFormat` (checked before reading), `Load` for I/O or parse
/// failures, `EmptyModel`.
pub async fn load_path<P: AsRef<Path>>(path: P) -> GeometryResult<LoadedModel> {
    let path = path.as_ref();
    ModelFormat::from_path(path)?;
    let bytes = tokio::fs::read(path).await?;
    let name = path.to_string_lossy();
    load_bytes(&name, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(ModelFormat::from_path("part.STL").unwrap(), ModelFormat::Stl);
        assert_eq!(ModelFormat::from_path("a/b/plate.3mf").unwrap(), ModelFormat::ThreeMf);
        assert_eq!(
            ModelFormat::from_path("part.obj"),
            Err(GeometryError::UnsupportedFormat {
                extension: "obj".into()
            })
        );
        assert!(ModelFormat::from_path("noext").is_err());
    }

    #[test]
    fn test_unsupported_rejected_before_parsing() {
        // bytes are garbage; the extension alone decides
        let err = load_bytes("model.step", b"\x00\x01").unwrap_err();
        assert!(matches!(err, GeometryError::UnsupportedFormat { .. }));
    }
}
