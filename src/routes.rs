use crate::relay::RelayHandler;
use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(handler: Arc<RelayHandler>, body_limit: usize) -> Router {
    // Method checks live inside the handlers so that a wrong method gets
    // the structured 405 body instead of axum's bare rejection. There is
    // no whole-request timeout layer: the upstream deadlines sit in
    // UpstreamClient, and the model listing call is unbounded.
    Router::new()
        .route("/health", get(RelayHandler::health_check))
        .route("/api/chat", any(RelayHandler::handle_chat))
        .route("/api/models", any(RelayHandler::handle_models))
        .route("/api/config", any(RelayHandler::handle_config))
        .route("/api/image", any(RelayHandler::handle_image))
        .with_state(handler)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
}
