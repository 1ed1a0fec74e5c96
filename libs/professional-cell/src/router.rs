use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn professional_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/register", post(handlers::register_professional))
        .route("/login", post(handlers::login_professional))
        .route("/", get(handlers::list_professionals))
        .with_state(state)
}
