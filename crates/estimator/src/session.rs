//! Interactive estimate state: one loaded model plus the user's choices.
//!
//! Every change that can affect the numbers recomputes the estimate from
//! scratch; nothing is updated incrementally. Uploads are tracked by
//! generation so a slow parse finishing after a newer upload started is
//! dropped instead of overwriting the newer model.

use std::sync::Arc;

use glam::DVec3;
use shared::{ColorVariant, Estimate, EstimateParameters, MaterialProfile};

use crate::error::{GeometryError, GeometryResult};
use crate::materials::MaterialCatalog;
use crate::model::LoadedModel;
use crate::shading::{self, ShadingPlan};

/// Handle for one in-flight upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
}

impl UploadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a finished upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The result became the current model (or the current error).
    Applied,
    /// A newer upload started meanwhile; the result was discarded.
    Stale,
}

#[derive(Debug, Clone)]
pub struct EstimateSession {
    catalog: Arc<MaterialCatalog>,
    params: EstimateParameters,
    generation: u64,
    model: Option<LoadedModel>,
    estimate: Option<Estimate>,
    last_error: Option<GeometryError>,
}

impl EstimateSession {
    /// New session with default parameters.
    ///
    /// # Errors
    ///
    /// `UnknownMaterial` if the catalog lacks the default material.
    pub fn new(catalog: Arc<MaterialCatalog>) -> GeometryResult<Self> {
        Self::with_params(catalog, EstimateParameters::default())
    }

    /// # Errors
    ///
    /// `UnknownMaterial` / `UnknownVariant` if `params` names something the
    /// catalog does not have.
    pub fn with_params(
        catalog: Arc<MaterialCatalog>,
        params: EstimateParameters,
    ) -> GeometryResult<Self> {
        let material = catalog.require(&params.material)?;
        if material.variant(&params.color).is_none() {
            return Err(GeometryError::UnknownVariant {
                material: params.material.clone(),
                variant: params.color.clone(),
            });
        }
        Ok(Self {
            catalog,
            params,
            generation: 0,
            model: None,
            estimate: None,
            last_error: None,
        })
    }

    pub fn params(&self) -> &EstimateParameters {
        &self.params
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    /// Current estimate; `None` while there is no model or no volume.
    pub fn estimate(&self) -> Option<&Estimate> {
        self.estimate.as_ref()
    }

    /// Error from the last upload or recomputation, if any.
    pub fn last_error(&self) -> Option<&GeometryError> {
        self.last_error.as_ref()
    }

    /// Start a new upload. The previous model is dropped immediately.
    pub fn begin_upload(&mut self) -> UploadTicket {
        self.generation += 1;
        self.model = None;
        self.estimate = None;
        self.last_error = None;
        UploadTicket {
            generation: self.generation,
        }
    }

    /// Apply the result of the upload identified by `ticket`.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: GeometryResult<LoadedModel>,
    ) -> UploadOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding upload {} (current is {})",
                ticket.generation,
                self.generation
            );
            return UploadOutcome::Stale;
        }

        match result {
            Ok(model) => {
                self.model = Some(model);
                self.recompute();
            }
            Err(e) => {
                tracing::warn!("Upload failed: {}", e);
                self.model = None;
                self.estimate = None;
                self.last_error = Some(e);
            }
        }
        UploadOutcome::Applied
    }

    /// Switch material; the color resets to the material's first variant.
    ///
    /// # Errors
    ///
    /// `UnknownMaterial`; the session is left unchanged.
    pub fn set_material(&mut self, name: &str) -> GeometryResult<()> {
        let material = self.catalog.require(name)?;
        let variant = material
            .first_variant()
            .map(|v| v.name.clone())
            .unwrap_or_default();
        self.params.material = material.name.clone();
        self.params.color = variant;
        self.recompute();
        Ok(())
    }

    /// Switch color variant within the current material. Does not touch
    /// the estimate.
    ///
    /// # Errors
    ///
    /// `UnknownVariant`; the session is left unchanged.
    pub fn set_color(&mut self, variant: &str) -> GeometryResult<()> {
        if self.material()?.variant(variant).is_none() {
            return Err(GeometryError::UnknownVariant {
                material: self.params.material.clone(),
                variant: variant.to_string(),
            });
        }
        self.params.color = variant.to_string();
        Ok(())
    }

    pub fn set_infill(&mut self, percent: f64) {
        self.params.infill_percent = percent;
        self.recompute();
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.params.scale = scale;
        self.recompute();
    }

    /// Only the slicer uses layer height; the volumetric estimate ignores it.
    pub fn set_layer_height(&mut self, layer_height: f64) {
        self.params.layer_height = layer_height;
    }

    /// Scaled bounding-box size (width, depth, height), mm.
    pub fn dimensions(&self) -> Option<DVec3> {
        self.model
            .as_ref()
            .map(|m| m.bounds().size() * self.params.scale)
    }

    /// # Errors
    ///
    /// `UnknownMaterial` if the catalog changed under the session.
    pub fn material(&self) -> GeometryResult<&MaterialProfile> {
        self.catalog.require(&self.params.material)
    }

    /// # Errors
    ///
    /// `UnknownMaterial` / `UnknownVariant`.
    pub fn selected_variant(&self) -> GeometryResult<&ColorVariant> {
        let material = self.material()?;
        material
            .variant(&self.params.color)
            .ok_or_else(|| GeometryError::UnknownVariant {
                material: material.name.clone(),
                variant: self.params.color.clone(),
            })
    }

    /// Shading for the current model in the selected variant.
    ///
    /// # Errors
    ///
    /// Propagates variant lookup and color parsing errors.
    pub fn shading(&self) -> GeometryResult<Option<ShadingPlan>> {
        match &self.model {
            Some(model) => shading::shade(model, self.selected_variant()?).map(Some),
            None => Ok(None),
        }
    }

    fn recompute(&mut self) {
        self.estimate = None;
        self.last_error = None;
        let Some(model) = &self.model else {
            return;
        };

        let result = self
            .catalog
            .require(&self.params.material)
            .and_then(|material| model.estimate(&self.params, material));
        match result {
            Ok(estimate) => self.estimate = Some(estimate),
            Err(e) if e.is_soft() => {
                tracing::debug!("No estimate: {}", e);
            }
            Err(e) => {
                tracing::warn!("Estimate failed: {}", e);
                self.last_error = Some(e);
            }
        }
    }
}
