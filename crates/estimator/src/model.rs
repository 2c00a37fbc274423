//! Prepared models: normalized geometry plus the buffer used for estimates.

use shared::{Estimate, EstimateParameters, EstimateRequest, MaterialProfile, PrintSpeedModel};

use crate::bounds::Bounds;
use crate::cost;
use crate::error::GeometryResult;
use crate::merge::merge_scene;
use crate::mesh::TriangleBuffer;
use crate::normalize::{center_buffer, center_scene};
use crate::scene::SceneNode;
use crate::volume;

/// Parser output before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawModel {
    /// Simple-mesh container (STL).
    Mesh(TriangleBuffer),
    /// Multi-part container (3MF).
    Scene(SceneNode),
}

/// A model ready for display and estimation.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedModel {
    /// Centered single buffer with flat normals.
    Mesh(TriangleBuffer),
    /// Centered hierarchy for rendering and its merged buffer for estimates.
    Scene {
        root: SceneNode,
        merged: TriangleBuffer,
    },
}

impl LoadedModel {
    /// Normalize parser output.
    ///
    /// # Errors
    ///
    /// Returns `EmptyModel` for a scene without usable meshes.
    pub fn from_raw(raw: RawModel) -> GeometryResult<Self> {
        match raw {
            RawModel::Mesh(buffer) => {
                let centered = center_buffer(&buffer).ensure_normals();
                tracing::debug!("Loaded mesh: {} triangles", centered.triangle_count());
                Ok(Self::Mesh(centered))
            }
            RawModel::Scene(root) => {
                let root = center_scene(root)?;
                let merged = merge_scene(&root)?;
                tracing::debug!(
                    "Loaded scene: {} meshes, {} merged triangles",
                    root.mesh_count(),
                    merged.triangle_count()
                );
                Ok(Self::Scene { root, merged })
            }
        }
    }

    /// Buffer used for volume, bounds and estimates.
    pub fn calculation_buffer(&self) -> &TriangleBuffer {
        match self {
            Self::Mesh(buffer) => buffer,
            Self::Scene { merged, .. } => merged,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_buffer(self.calculation_buffer())
    }

    /// Enclosed volume before scaling, mm³.
    pub fn volume_mm3(&self) -> f64 {
        volume::enclosed_volume(self.calculation_buffer())
    }

    /// Estimate request for the current geometry and parameters.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` when there is no volume to estimate.
    pub fn request(
        &self,
        params: &EstimateParameters,
        material: &MaterialProfile,
    ) -> GeometryResult<EstimateRequest> {
        let measurement = volume::measure(self.calculation_buffer())?;
        Ok(EstimateRequest {
            volume_mm3: measurement.volume_mm3,
            scale: params.scale,
            infill_percent: params.infill_percent,
            density: material.density,
            price_per_kg: material.price_per_kg,
            speed_model: PrintSpeedModel::default(),
        })
    }

    /// Full volumetric estimate, recomputed from scratch.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` when there is no volume to estimate.
    pub fn estimate(
        &self,
        params: &EstimateParameters,
        material: &MaterialProfile,
    ) -> GeometryResult<Estimate> {
        cost::estimate(&self.request(params, material)?)
    }
}
