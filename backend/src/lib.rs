//! User-management request validation service.

use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;
pub mod types;
pub mod validation;

use state::AppState;

pub fn app(state: AppState) -> Router {
    let user_routes = Router::new()
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::store_user),
        )
        .route("/api/users/{user}", put(handlers::update_user));

    Router::new()
        .merge(user_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(middleware::log_error_responses))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state)
}
