use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use estimator::GeometryError;
use shared::ErrorResponse;
use thiserror::Error;

use crate::slicer::SlicerError;

/// Request failure, rendered as a status code plus `{ "error": ... }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Engine details stay in the logs.
    #[error("Slicing failed")]
    SlicingFailed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Geometry(e) => match e {
                GeometryError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                GeometryError::EmptyModel
                | GeometryError::DegenerateGeometry
                | GeometryError::CorruptBuffer { .. }
                | GeometryError::Load { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                GeometryError::UnknownMaterial { .. }
                | GeometryError::UnknownVariant { .. }
                | GeometryError::InvalidColor { .. } => StatusCode::BAD_REQUEST,
            },
            Self::SlicingFailed | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<SlicerError> for ApiError {
    fn from(e: SlicerError) -> Self {
        match e {
            SlicerError::InvalidProfile { .. } => Self::BadRequest(e.to_string()),
            other => {
                tracing::error!("Slicing failed: {}", other);
                Self::SlicingFailed
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!("Internal error: {}", detail);
        }
        (self.status(), Json(ErrorResponse::new(self.message()))).into_response()
    }
}
