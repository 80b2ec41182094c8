use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(handlers::list_users))
        .route("/admin/verify-user", post(handlers::verify_user))
        .route("/admin/block-user", post(handlers::block_user))
        .route("/admin/delete-user", post(handlers::delete_user))
        .route("/admin/verify-alert", post(handlers::verify_alert))
        .route("/admin/delete-alert", post(handlers::delete_alert))
        .route("/admin/bootstrap", post(handlers::bootstrap))
}
