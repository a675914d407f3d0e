use super::{AppState, AuthUser};
use crate::error::{Error, Result};
use crate::identity::SessionUser;
use crate::inference::ModelDescriptor;
use crate::models::{ChapterMarker, ProfileUpdate, User, UserStats, UserSummary, Video, VideoSummary};
use crate::object_store::StoredObject;
use crate::processing::ProcessRequest;
use crate::progress::{self, ProgressSender};
use crate::social::ActivityItem;
use crate::upload::UploadFile;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessBody {
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub member: bool,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "dojo-service"
    }))
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.database.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "database": "connected"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "database": "disconnected",
                "error": e.to_string()
            })),
        ),
    }
}

pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SessionUser>> {
    Ok(Json(state.identity.session_user(user_id).await?))
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(edit): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    Ok(Json(state.identity.update_profile(user_id, edit).await?))
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<Json<StoredObject>> {
    let (file, _) = read_upload(multipart, "avatar").await?;
    Ok(Json(state.identity.upload_avatar(user_id, &file).await?))
}

pub async fn list_models(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.processor.available_models().await,
    })
}

pub async fn list_videos(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Video>>> {
    Ok(Json(state.library.list_videos(user_id).await?))
}

/// Multipart upload (`video` field) followed by record creation
#[instrument(skip(state, multipart))]
pub async fn upload_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Video>)> {
    let (file, _) = read_upload(multipart, "video").await?;
    let video = state
        .library
        .upload_and_register(&file, user_id, &ProgressSender::disabled())
        .await?;

    info!(video_id = %video.id, "Video uploaded via API");
    Ok((StatusCode::CREATED, Json(video)))
}

pub async fn delete_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.library.delete_video(video_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Start a processing run and stream its progress as server-sent events.
/// The run continues if the client disconnects.
pub async fn process_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<Uuid>,
    body: Option<Json<ProcessBody>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let request = ProcessRequest {
        video_id,
        owner_id: user_id,
        model: body.model,
    };

    let (tx, rx) = progress::channel();
    let processor = state.processor.clone();
    tokio::spawn(async move {
        // outcome is reported on the progress stream
        let _ = processor.process_stored_video(&request, &tx).await;
    });

    let events = rx.map(|event| {
        Event::default()
            .event(event.stage.as_str())
            .json_data(&event)
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Legacy direct flow: multipart `video` plus optional `model_name`
pub async fn process_file(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    multipart: Multipart,
) -> Result<Json<Vec<ChapterMarker>>> {
    let (file, fields) = read_upload(multipart, "video").await?;
    let model = fields.get("model_name").map(String::as_str);

    let chapters = state
        .processor
        .process_uploaded_file(&file, model, &ProgressSender::disabled())
        .await?;
    Ok(Json(chapters))
}

pub async fn get_chapters(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<Uuid>,
) -> Result<Json<Vec<ChapterMarker>>> {
    Ok(Json(state.library.chapters(video_id, user_id).await?))
}

pub async fn upload_thumbnail(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<StoredObject>> {
    let (file, _) = read_upload(multipart, "thumbnail").await?;
    Ok(Json(
        state.library.set_thumbnail(video_id, user_id, &file).await?,
    ))
}

pub async fn has_liked(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<Uuid>,
) -> Result<Json<MembershipResponse>> {
    let member = state.social.has_liked_video(user_id, video_id).await?;
    Ok(Json(MembershipResponse { member }))
}

pub async fn like_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.social.like_video(user_id, video_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlike_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.social.unlike_video(user_id, video_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn is_following(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target_id): Path<Uuid>,
) -> Result<Json<MembershipResponse>> {
    let member = state.social.is_following(user_id, target_id).await?;
    Ok(Json(MembershipResponse { member }))
}

pub async fn follow_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.social.follow(user_id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unfollow_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.social.unfollow(user_id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn user_stats(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Json<UserStats> {
    Json(state.social.user_stats(user_id).await)
}

pub async fn activity_feed(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ActivityItem>>> {
    Ok(Json(state.social.activity_feed(user_id).await?))
}

pub async fn search_users(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<UserSummary>>> {
    Ok(Json(
        state.social.search_users(&params.q, params.limit).await?,
    ))
}

pub async fn search_videos(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<VideoSummary>>> {
    Ok(Json(
        state.discovery.search_videos(&params.q, params.limit).await?,
    ))
}

pub async fn trending_videos(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<VideoSummary>>> {
    Ok(Json(state.discovery.trending_videos(params.limit).await?))
}

pub async fn recent_videos(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<VideoSummary>>> {
    Ok(Json(state.discovery.recent_videos(params.limit).await?))
}

/// Read the file in `file_field` plus any text fields of a multipart body
async fn read_upload(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(UploadFile, HashMap<String, String>)> {
    let mut file = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == file_field {
            let file_name = field.file_name().unwrap_or(file_field).to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| Error::Validation(e.body_text()))?;

            file = Some(UploadFile {
                file_name,
                content_type,
                data,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| Error::Validation(e.body_text()))?;
            fields.insert(name, value);
        }
    }

    let file = file.ok_or_else(|| Error::Validation(format!("Missing `{}` file field", file_field)))?;
    Ok((file, fields))
}
