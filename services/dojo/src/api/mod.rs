//! JSON/SSE HTTP API.

mod handlers;

use crate::config::{ApiConfig, UploadConfig};
use crate::discovery::Discovery;
use crate::error::Error;
use crate::identity::IdentityService;
use crate::processing::AiProcessor;
use crate::social::SocialService;
use crate::store::Readiness;
use crate::videos::VideoLibrary;
use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<VideoLibrary>,
    pub processor: Arc<AiProcessor>,
    pub social: Arc<SocialService>,
    pub discovery: Arc<Discovery>,
    pub identity: Arc<IdentityService>,
    pub database: Arc<dyn Readiness>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyProcessing(_) => StatusCode::CONFLICT,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::ObjectStore(_) | Error::Inference(_) => StatusCode::BAD_GATEWAY,
            Error::Database(_) | Error::Config(_) | Error::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, code = self.code(), "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Caller authenticated by a bearer session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| Error::Unauthorized("Missing bearer token".to_string()))?;

        let user_id = state.identity.sessions().validate(token.trim())?;
        Ok(AuthUser(user_id))
    }
}

/// Create the API router
pub fn create_router(state: AppState, config: &ApiConfig, upload: &UploadConfig) -> Router {
    let cors = if config.cors_enabled {
        let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if config.cors_origins.is_empty() {
            cors.allow_origin(Any)
        } else {
            let origins: Vec<HeaderValue> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            cors.allow_origin(origins)
        }
    } else {
        CorsLayer::new()
    };

    // multipart framing on top of the largest accepted file
    let body_limit = usize::try_from(upload.max_file_size_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(1024 * 1024);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route(
            "/api/v1/me",
            get(handlers::get_me).patch(handlers::update_me),
        )
        .route("/api/v1/me/avatar", post(handlers::upload_avatar))
        .route("/api/v1/models", get(handlers::list_models))
        .route(
            "/api/v1/videos",
            get(handlers::list_videos)
                .post(handlers::upload_video)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/api/v1/videos/:video_id",
            axum::routing::delete(handlers::delete_video),
        )
        .route(
            "/api/v1/videos/:video_id/process",
            post(handlers::process_video),
        )
        .route(
            "/api/v1/videos/:video_id/chapters",
            get(handlers::get_chapters),
        )
        .route(
            "/api/v1/videos/:video_id/thumbnail",
            post(handlers::upload_thumbnail),
        )
        .route(
            "/api/v1/videos/:video_id/like",
            get(handlers::has_liked)
                .post(handlers::like_video)
                .delete(handlers::unlike_video),
        )
        .route(
            "/api/v1/process-file",
            post(handlers::process_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/api/v1/users/:user_id/follow",
            get(handlers::is_following)
                .post(handlers::follow_user)
                .delete(handlers::unfollow_user),
        )
        .route("/api/v1/users/:user_id/stats", get(handlers::user_stats))
        .route("/api/v1/feed", get(handlers::activity_feed))
        .route("/api/v1/search/users", get(handlers::search_users))
        .route("/api/v1/search/videos", get(handlers::search_videos))
        .route("/api/v1/discover/trending", get(handlers::trending_videos))
        .route("/api/v1/discover/recent", get(handlers::recent_videos))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the API server
pub async fn start_api_server(
    state: AppState,
    config: &ApiConfig,
    upload: &UploadConfig,
) -> anyhow::Result<()> {
    let router = create_router(state, config, upload);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .await
        .context("API server error")?;

    Ok(())
}
