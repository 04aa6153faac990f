//! HTTP façade - routing, session cookies and user feedback around the core.
//!
//! GET routes answer JSON page models; POST routes perform one core operation
//! and answer `303 See Other`, leaving a flash message for the next page.

pub mod error;
pub mod extract;
pub mod flash;
pub mod routes;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "kiosco_session";

/// Shared application state accessible from all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
}

impl AppState {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db: Arc::new(db) }
    }
}

/// Creates the application router with all routes and shared state.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/login", get(routes::auth::login_page).post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/", get(routes::dashboard::show))
        .route("/users", get(routes::users::list).post(routes::users::register))
        .route("/users/{id}/edit", post(routes::users::edit))
        .route("/users/{id}/deactivate", post(routes::users::deactivate))
        .route("/users/{id}/activate", post(routes::users::activate))
        .route("/users/{id}/delete", post(routes::users::delete))
        .route("/products", get(routes::products::list).post(routes::products::create))
        .route("/products/{id}", get(routes::products::detail))
        .route("/products/{id}/edit", post(routes::products::edit))
        .route("/products/{id}/delete", post(routes::products::delete))
        .route("/sales", get(routes::sales::list).post(routes::sales::start))
        .route("/sales/{id}", get(routes::sales::detail))
        .route(
            "/sales/{id}/lines",
            get(routes::sales::lines_page).post(routes::sales::add_line),
        )
        .route(
            "/sales/{id}/finalize",
            get(routes::sales::finalize_page).post(routes::sales::finalize),
        )
        .route("/till/open", get(routes::till::open_page).post(routes::till::open))
        .route("/till/close", get(routes::till::close_page).post(routes::till::close))
        .route("/till/history", get(routes::till::history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
