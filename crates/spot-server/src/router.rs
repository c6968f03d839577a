use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with every Spot endpoint under `/{api_version}`.
pub fn build_router(state: Arc<AppState>, api_version: &str) -> Router {
    let garages = Router::new()
        .route("/", get(handler::list_garages).post(handler::create_garage))
        .route(
            "/:garage_id",
            get(handler::get_garage)
                .put(handler::update_garage)
                .patch(handler::update_garage)
                .delete(handler::delete_garage),
        )
        .route(
            "/:garage_id/sections",
            get(handler::list_sections).post(handler::create_section),
        )
        .route(
            "/:garage_id/sections/:section",
            get(handler::get_section)
                .put(handler::update_section)
                .patch(handler::update_section)
                .delete(handler::delete_section),
        )
        .route("/:garage_id/sections/:section/spots", get(handler::list_spots))
        .route(
            "/:garage_id/sections/:section/actions",
            post(handler::post_action),
        );

    let api = Router::new()
        .route("/health", get(handler::health_handler))
        .route("/control", post(handler::post_control))
        .nest("/garages", garages);

    Router::new()
        .nest(&format!("/{api_version}"), api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
