use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::rate_limit::{self, Throttle};
use crate::state::AppState;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod token;

pub fn router(state: &AppState) -> Router<AppState> {
    let quotas = &state.config.quotas;
    Router::new()
        .route(
            "/auth/register",
            post(handlers::register).layer(middleware::from_fn_with_state(
                Throttle::new(state, "register", quotas.register),
                rate_limit::throttle,
            )),
        )
        .route(
            "/auth/login",
            post(handlers::login).layer(middleware::from_fn_with_state(
                Throttle::new(state, "login", quotas.login),
                rate_limit::throttle,
            )),
        )
        .route("/auth/me", get(handlers::me))
}
