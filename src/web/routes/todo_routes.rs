use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use std::sync::Arc;

use crate::db::models::Todo;
use crate::web::extract::{AppJson, AppPath};
use crate::web::models::{CreateTodoRequest, UpdateTodoRequest};
use crate::web::{AppError, AppState};

// --- Route Handlers ---

async fn create_todo_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    payload.validate()?;
    let todo = app_state
        .todo_service
        .create_todo(payload.title, &payload.tags)
        .await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(todo_id): AppPath<i32>,
) -> Result<Json<Todo>, AppError> {
    let todo = app_state.todo_service.get_todo(todo_id).await?;
    Ok(Json(todo))
}

async fn list_todos_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = app_state.todo_service.list_todos().await?;
    Ok(Json(todos))
}

async fn update_todo_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(todo_id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateTodoRequest>,
) -> Result<Json<Todo>, AppError> {
    payload.validate()?;
    let mut todo = app_state.todo_service.get_todo(todo_id).await?;
    todo.title = payload.title;
    todo.completed = payload.completed;

    let updated = app_state
        .todo_service
        .update_todo(todo, &payload.tags)
        .await?;
    Ok(Json(updated))
}

async fn delete_todo_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath(todo_id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    app_state.todo_service.delete_todo(todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_tag_from_todo_handler(
    State(app_state): State<Arc<AppState>>,
    AppPath((todo_id, tag_id)): AppPath<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    app_state
        .todo_service
        .remove_tag_from_todo(todo_id, tag_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Router ---

pub fn create_todos_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_todos_handler).post(create_todo_handler))
        .route(
            "/{todo_id}",
            get(get_todo_handler)
                .put(update_todo_handler)
                .delete(delete_todo_handler),
        )
        .route("/{todo_id}/tags/{tag_id}", delete(remove_tag_from_todo_handler))
}
