pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::UploadConfig;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_files,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::BatchResponse,
            models::SuccessfulUpload,
            models::FailedUpload,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "upload", description = "Batch upload to the media host"),
        (name = "system", description = "Liveness")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub upload_service: Arc<UploadService>,
    pub config: UploadConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api/upload",
            post(api::handlers::upload::upload_files)
                .layer(DefaultBodyLimit::max(state.config.body_limit())),
        )
        .fallback(api::handlers::fallback::not_found)
        .layer(CatchPanicLayer::custom(api::handlers::fallback::handle_panic))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
