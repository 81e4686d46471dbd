pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::resume::handlers;
use crate::schema::handlers::handle_list_schemas;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/schemas", get(handle_list_schemas))
        .route(
            "/api/v1/resumes",
            get(handlers::handle_list).post(handlers::handle_create),
        )
        .route("/api/v1/resumes/draft", post(handlers::handle_draft))
        .route("/api/v1/resumes/validate", post(handlers::handle_validate))
        .route(
            "/api/v1/resumes/:id",
            get(handlers::handle_get)
                .put(handlers::handle_update)
                .delete(handlers::handle_delete),
        )
        .route("/api/v1/resumes/:id/copy", post(handlers::handle_copy))
        .route(
            "/api/v1/resumes/:id/sections/:section_id",
            delete(handlers::handle_delete_section),
        )
        .route(
            "/api/v1/resumes/:id/items/:item_id",
            delete(handlers::handle_delete_item),
        )
        .route("/api/v1/resumes/:id/html", get(handlers::handle_html))
        .route("/api/v1/resumes/:id/pdf", get(handlers::handle_pdf))
        .with_state(state)
}
