use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use estimator::MaterialCatalog;
use tower_http::cors::{Any, CorsLayer};

mod config;
mod error;
mod routes;
mod slicer;
mod upload;

use config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub catalog: Arc<MaterialCatalog>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,estimator=info".into()),
        )
        .init();

    let config = ServerConfig::from_env().with_absolute_paths()?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let catalog = MaterialCatalog::builtin();
    tracing::info!("Loaded {} materials", catalog.len());

    let cors = cors_layer(&config.cors_origin);
    let body_limit = DefaultBodyLimit::max(config.max_upload_bytes);
    let bind_addr = config.bind_addr.clone();

    let state = AppState {
        config: Arc::new(config),
        catalog: Arc::new(catalog),
    };

    let app = Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/materials", get(routes::materials))
        .route("/api/slice", post(routes::slice))
        .route("/api/estimate", post(routes::estimate))
        .layer(body_limit)
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            tracing::warn!("Invalid CORS_ORIGIN {:?} ({}), allowing any origin", origin, e);
            CorsLayer::permissive()
        }
    }
}
