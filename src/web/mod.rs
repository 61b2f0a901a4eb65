use axum::{
    http::Method,
    routing::get,
    Json,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::db::repositories::{TagRepository, TodoRepository};
use crate::services::{TagService, TodoService};
use crate::web::routes::*;

pub use crate::web::error::AppError;

pub mod error;
pub mod extract;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub todo_service: TodoService,
    pub tag_service: TagService,
}

impl AppState {
    /// Wires both services to one store so todos and tags share associations.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TodoRepository + TagRepository + 'static,
    {
        let tag_service = TagService::new(store.clone());
        let todo_service = TodoService::new(store, tag_service.clone());
        Self {
            todo_service,
            tag_service,
        }
    }
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Hello, World!" }))
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check_handler))
        .nest("/todos", todo_routes::create_todos_router())
        .nest("/tags", tag_routes::create_tags_router())
        .with_state(app_state)
        .layer(cors)
}
