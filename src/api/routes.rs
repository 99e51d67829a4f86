use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::handlers::AppState;
use crate::api::{handlers, mock_handlers};
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Project management
        .route("/projects", get(handlers::list_projects::<S>))
        .route("/projects", post(handlers::create_project::<S>))
        .route("/projects/:project_id", get(handlers::get_project::<S>))
        .route(
            "/projects/:project_id",
            delete(handlers::delete_project::<S>),
        )
        // Groups within a project
        .route(
            "/projects/:project_id/groups",
            get(handlers::list_groups::<S>),
        )
        .route(
            "/projects/:project_id/groups",
            post(handlers::create_group::<S>),
        )
        .route("/groups/:group_id", patch(handlers::rename_group::<S>))
        .route("/groups/:group_id", delete(handlers::delete_group::<S>))
        // Endpoint definitions
        .route("/endpoints", get(handlers::list_all_endpoints::<S>))
        .route(
            "/projects/:project_id/endpoints",
            get(handlers::list_endpoints::<S>),
        )
        .route(
            "/projects/:project_id/endpoints",
            post(handlers::create_endpoint::<S>),
        )
        .route("/endpoints/:endpoint_id", get(handlers::get_endpoint::<S>))
        .route(
            "/endpoints/:endpoint_id",
            patch(handlers::update_endpoint::<S>),
        )
        .route(
            "/endpoints/:endpoint_id",
            delete(handlers::delete_endpoint::<S>),
        )
        .route(
            "/endpoints/:endpoint_id/responses/:status",
            put(handlers::set_response::<S>),
        )
        .route(
            "/endpoints/:endpoint_id/field-descriptions/:status",
            put(handlers::set_field_descriptions::<S>),
        )
        .route(
            "/endpoints/:endpoint_id/field-descriptions/:status/generate",
            get(handlers::generate_field_descriptions::<S>),
        )
        .route(
            "/endpoints/:endpoint_id/request-body",
            put(handlers::set_request_body::<S>),
        )
        .route(
            "/endpoints/:endpoint_id/query-params",
            put(handlers::set_query_params::<S>),
        )
        .route(
            "/endpoints/:endpoint_id/group",
            patch(handlers::move_endpoint_to_group::<S>),
        )
        // Mock serving: everything below /mock is resolved against authored
        // definitions, then the seed table
        .route("/mock/*path", get(mock_handlers::serve_get::<S>))
        .route("/mock/*path", post(mock_handlers::serve_post::<S>))
        .route("/mock/*path", put(mock_handlers::serve_put::<S>))
        .route("/mock/*path", delete(mock_handlers::serve_delete::<S>))
        // Browser clients under development talk to the mock surface directly
        .layer(CorsLayer::permissive())
}
