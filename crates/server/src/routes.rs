pub mod records;

use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;

use common::types::Health;

use crate::state::ServerState;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: health plus the vault endpoints.
///
/// Paths are query-parameter based (`/add?name=...`); `/update` and
/// `/delete` also accept POST for clients that only speak GET/POST.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new().route("/health", get(health));

    let vault = Router::new()
        .route("/get-all", get(records::get_all))
        .route("/get-by-type", get(records::get_by_type))
        .route("/get", get(records::get_by_name))
        .route("/record-types", get(records::record_types))
        .route("/add", post(records::add))
        .route("/update", put(records::update).post(records::update))
        .route("/delete", delete(records::delete).post(records::delete))
        .route("/flush", post(records::flush));

    public
        .merge(vault)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
