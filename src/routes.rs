//! Router Assembly
//! Mission: Wire public, authenticated, and admin route groups

use axum::{
    extract::Request,
    middleware,
    middleware::Next,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::auth::{api, authenticate, require_role, AuthState};
use crate::middleware::request_logging;

/// Build the application router. Factored out of `main` so integration tests
/// drive exactly the router the binary serves.
pub fn router(state: AuthState) -> Router {
    // Public routes (no authentication)
    let public_routes = Router::new()
        .route("/users/register", post(api::register))
        .route("/users/login", post(api::login))
        .route("/users/refresh", post(api::refresh))
        .with_state(state.clone());

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/users/logout", post(api::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ))
        .with_state(state.clone());

    // Admin routes (authentication + 'admin' role)
    let admin_routes = Router::new()
        .route("/admin/users", get(api::list_users))
        .route(
            "/admin/users/:id",
            get(api::get_user)
                .put(api::update_user)
                .delete(api::delete_user),
        )
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_role("admin", req, next)
        }))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
