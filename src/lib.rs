pub mod checkbook;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod recurrence;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub base_path: Arc<String>,
}

pub fn create_app(state: AppState) -> Router {
    let base_path = state.base_path.clone();

    let app_routes = Router::new()
        .route(
            "/tasks",
            get(handlers::tasks::list_all_tasks).post(handlers::tasks::create_new_tasks),
        )
        .route(
            "/tasks/weekly-checkbook",
            get(handlers::tasks::weekly_checkbook),
        )
        .route(
            "/tasks/{id}",
            get(handlers::tasks::get_single_task)
                .put(handlers::tasks::update_existing_task)
                .delete(handlers::tasks::delete_existing_task),
        )
        .route(
            "/tasks/{id}/toggle",
            post(handlers::tasks::toggle_existing_task),
        )
        .layer(
            tower::ServiceBuilder::new()
                .layer(tower_http::trace::TraceLayer::new_for_http())
                .layer(tower_http::compression::CompressionLayer::new()),
        )
        .with_state(state);

    tracing::info!("base_path: {base_path:?}");

    if base_path.is_empty() {
        app_routes
    } else {
        Router::new().nest(&base_path, app_routes)
    }
}
