//! HTTP routes for the builder server.

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use servicebuilder_core::{
    ARCHIVE_CONTENT_TYPE, BuildOutcome, Error, ErrorPayload, NamedPayload, PayloadRole,
    ServiceBuilder,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
pub struct AppState {
    /// Pipeline shared by all requests. Each build gets its own workspace.
    pub builder: ServiceBuilder,
}

/// Create the router with all routes.
pub fn create_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ping", get(ping_handler))
        .route("/compile", post(compile_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe used by clients before submitting a build.
async fn ping_handler() -> &'static str {
    "pong"
}

/// Compile the uploaded POJOs and respond with the result jar.
async fn compile_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let payloads = match multipart {
        Ok(multipart) => read_payloads(multipart).await,
        Err(rejection) => Err(Error::InvalidRequest(rejection.body_text())),
    };
    let payloads = match payloads {
        Ok(payloads) => payloads,
        Err(e) => return outcome_response(BuildOutcome::Failure(ErrorPayload::from_error(&e))),
    };

    // The pipeline blocks on the filesystem and child processes
    let builder = state.builder.clone();
    let outcome = match tokio::task::spawn_blocking(move || builder.handle(&payloads)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Build task failed: {}", e);
            let err = Error::Io(std::io::Error::other(format!("build task failed: {}", e)));
            BuildOutcome::Failure(ErrorPayload::from_error(&err))
        }
    };

    outcome_response(outcome)
}

/// Collect every multipart field as a payload.
async fn read_payloads(mut multipart: Multipart) -> servicebuilder_core::Result<Vec<NamedPayload>> {
    let mut payloads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("malformed multipart request: {}", e)))?
    {
        let role = PayloadRole::from_field(field.name().unwrap_or_default());
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("failed to read upload: {}", e)))?;

        tracing::debug!(role = ?role, file = %file_name, bytes = bytes.len(), "received field");
        payloads.push(NamedPayload::new(role, file_name, bytes.to_vec()));
    }

    Ok(payloads)
}

/// Map a build outcome onto an HTTP response.
///
/// Success is the jar with an exact `Content-Length`; every failure is a
/// `400 Bad Request` carrying the JSON [`ErrorPayload`].
pub fn outcome_response(outcome: BuildOutcome) -> Response {
    match outcome {
        BuildOutcome::Archive(bytes) => {
            let length = bytes.len();
            (
                StatusCode::OK,
                [
                    (
                        header::CONTENT_TYPE,
                        HeaderValue::from_static(ARCHIVE_CONTENT_TYPE),
                    ),
                    (header::CONTENT_LENGTH, HeaderValue::from(length)),
                ],
                bytes,
            )
                .into_response()
        }
        BuildOutcome::Failure(payload) => (StatusCode::BAD_REQUEST, Json(payload)).into_response(),
    }
}
