use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Route paths served by the API.
pub mod endpoints {
    pub const HEALTH: &str = "/v1/health";
    pub const INFO: &str = "/v1/info";
    pub const SAVE_VERSION: &str = "/api/save-version";
    pub const GET_VERSIONS: &str = "/api/get-versions";
    pub const GET_VERSION: &str = "/api/get-version";
    pub const COMPARE_VERSIONS: &str = "/api/compare-versions";
    pub const REVERT_VERSION: &str = "/api/revert-version";
    pub const CONTENT: &str = "/api/content";
}

/// Build the axum router with all blogvcs endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(handler::health_handler))
        .route(endpoints::INFO, get(handler::info_handler))
        .route(endpoints::SAVE_VERSION, post(handler::save_version))
        .route(endpoints::GET_VERSIONS, get(handler::get_versions))
        .route(endpoints::GET_VERSION, get(handler::get_version))
        .route(endpoints::COMPARE_VERSIONS, get(handler::compare_versions))
        .route(endpoints::REVERT_VERSION, post(handler::revert_version))
        .route(endpoints::CONTENT, get(handler::list_content))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
