use std::collections::HashMap;

use axum::{
    extract::{Multipart, State},
    response::Json,
};
use estimator::{loader, slicer_output, GeometryError};
use serde_json::{json, Value};
use shared::{EstimateParameters, EstimateResponse, MaterialProfile, ModelEstimateResponse};

use crate::error::ApiError;
use crate::slicer::{self, SliceJob};
use crate::upload::StoredUpload;
use crate::AppState;

/// Health check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Material catalog, in display order
pub async fn materials(State(state): State<AppState>) -> Json<Vec<MaterialProfile>> {
    Json(state.catalog.iter().cloned().collect())
}

/// Upload → slicing engine → estimate
pub async fn slice(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<EstimateResponse>, ApiError> {
    let form = UploadForm::read(multipart).await?;
    slice_upload(&state, form).await.map(Json)
}

/// Upload → volumetric estimate, no engine involved
pub async fn estimate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ModelEstimateResponse>, ApiError> {
    let form = UploadForm::read(multipart).await?;
    estimate_upload(&state, form).await.map(Json)
}

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Multipart body: the `file` part plus plain text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                form.file = Some(UploadedFile {
                    name: file_name,
                    bytes: bytes.to_vec(),
                });
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &str) -> Result<&str, ApiError> {
        self.field(name)
            .ok_or_else(|| ApiError::BadRequest(format!("Missing field: {name}")))
    }

    /// Optional finite number accepted by `valid`; `default` when absent.
    fn number(&self, name: &str, default: f64, valid: fn(f64) -> bool) -> Result<f64, ApiError> {
        let Some(v) = self.field(name) else {
            return Ok(default);
        };
        match v.parse::<f64>() {
            Ok(n) if n.is_finite() && valid(n) => Ok(n),
            _ => Err(ApiError::BadRequest(format!("Invalid {name}: {v}"))),
        }
    }

    fn take_file(&mut self) -> Result<UploadedFile, ApiError> {
        self.file
            .take()
            .ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))
    }
}

pub async fn slice_upload(state: &AppState, mut form: UploadForm) -> Result<EstimateResponse, ApiError> {
    let file = form.take_file()?;
    loader::ModelFormat::from_path(&file.name)?;
    let material = form.required("material")?;
    let quality = form.required("quality")?;

    let config = &state.config;
    let upload = StoredUpload::store(&config.upload_dir, &file.name, &file.bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("storing upload: {e}")))?;

    let job = SliceJob::new(
        &config.slicer_config_dir,
        quality,
        material,
        upload.model_path(),
        upload.gcode_path(),
    )?;
    let stdout = slicer::run(&config.slicer_bin, &job, &config.upload_dir, config.slicer_timeout).await?;
    if !slicer_output::has_report(&stdout) {
        tracing::error!("Slicer output has no filament or time figures: {}", stdout);
        return Err(ApiError::SlicingFailed);
    }

    let estimate = slicer_output::interpret(&stdout, material);
    tracing::info!(
        "Sliced {}: {:.2} g, {:.2} h, {:.2}",
        file.name,
        estimate.filament_grams,
        estimate.time_hours,
        estimate.price
    );
    Ok(estimate.to_response())
}

/// Volumetric estimate for an uploaded model. A model without printable
/// volume still reports its dimensions, with no estimate.
pub async fn estimate_upload(
    state: &AppState,
    mut form: UploadForm,
) -> Result<ModelEstimateResponse, ApiError> {
    let file = form.take_file()?;
    let defaults = EstimateParameters::default();
    let params = EstimateParameters {
        material: form.field("material").map_or(defaults.material.clone(), str::to_string),
        infill_percent: form.number("infill", defaults.infill_percent, |v| (0.0..=100.0).contains(&v))?,
        scale: form.number("scale", defaults.scale, |v| v > 0.0)?,
        ..defaults
    };
    let material = state.catalog.require(&params.material)?;

    let name = file.name.clone();
    let model = tokio::task::spawn_blocking(move || loader::load_bytes(&file.name, &file.bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("loader task: {e}")))??;
    if model.calculation_buffer().is_empty() {
        return Err(GeometryError::EmptyModel.into());
    }

    let size = model.bounds().size() * params.scale;
    let dimensions = [
        format!("{:.2}", size.x),
        format!("{:.2}", size.y),
        format!("{:.2}", size.z),
    ];

    let estimate = match model.estimate(&params, material) {
        Ok(estimate) => estimate,
        Err(e) if e.is_soft() => {
            tracing::info!("No estimate for {}: {}", name, e);
            return Ok(ModelEstimateResponse::NoEstimate {
                message: e.to_string(),
                dimensions,
            });
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        "Estimated {} in {}: {:.2} g, {:.2} h, {:.2}",
        name,
        material.name,
        estimate.filament_grams,
        estimate.time_hours,
        estimate.price
    );

    let mut response = estimate.to_response();
    response.dimensions = Some(dimensions);
    Ok(ModelEstimateResponse::Estimate(response))
}
