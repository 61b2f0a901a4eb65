use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::db::models::Tag;
use crate::web::extract::{AppJson, AppPath};
use crate::web::models::TagRequest;
use crate::web::{AppError, AppState};

// --- Route Handlers ---

async fn create_tag_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<TagRequest>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    payload.validate()?;
    let tag = app_state.tag_service.create_tag(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn get_tag_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(tag_id): AppPath<i32>,
) -> Result<Json<Tag>, AppError> {
    let tag = app_state.tag_service.get_tag(tag_id).await?;
    Ok(Json(tag))
}

async fn list_tags_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Tag>>, AppError> {
    let tags = app_state.tag_service.list_tags().await?;
    Ok(Json(tags))
}

async fn update_tag_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(tag_id): AppPath<i32>,
    AppJson(payload): AppJson<TagRequest>,
) -> Result<Json<Tag>, AppError> {
    payload.validate()?;
    let mut tag = app_state.tag_service.get_tag(tag_id).await?;
    tag.name = payload.name;

    let updated = app_state.tag_service.update_tag(tag).await?;
    Ok(Json(updated))
}

async fn delete_tag_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(tag_id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    app_state.tag_service.delete_tag(tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Router ---

pub fn create_tags_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tags_handler).post(create_tag_handler))
        .route(
            "/{tag_id}",
            get(get_tag_handler)
                .put(update_tag_handler)
                .delete(delete_tag_handler),
        )
}
