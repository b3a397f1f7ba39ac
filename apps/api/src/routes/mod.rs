pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::latex::handlers;
use crate::state::AppState;

/// Uploads (PDF resumes, .tex files) are capped at 10 MiB.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Generation
        .route("/api/v1/latex/resume", post(handlers::handle_resume))
        .route(
            "/api/v1/latex/cover-letter",
            post(handlers::handle_cover_letter),
        )
        .route("/api/v1/latex/both", post(handlers::handle_both))
        // Inspection
        .route("/api/v1/latex/validate", post(handlers::handle_validate))
        .route("/api/v1/latex/upload", post(handlers::handle_upload))
        .route(
            "/api/v1/latex/convert-pdf",
            post(handlers::handle_convert_pdf),
        )
        // Compilation
        .route("/api/v1/latex/compile", post(handlers::handle_compile))
        .route(
            "/api/v1/latex/compile/container",
            post(handlers::handle_compile_container),
        )
        .route(
            "/api/v1/latex/compile/self-test",
            post(handlers::handle_self_test),
        )
        .route("/api/v1/latex/finalize", post(handlers::handle_finalize))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
