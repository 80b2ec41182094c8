use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::rate_limit::{self, Throttle};
use crate::state::AppState;

pub mod dto;
pub mod handlers;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/alerts",
            post(handlers::submit).layer(middleware::from_fn_with_state(
                Throttle::new(state, "submit_alert", state.config.quotas.submit_alert),
                rate_limit::throttle,
            )),
        )
        .route("/alerts", get(handlers::list))
        .route("/alerts/:id", get(handlers::get_alert))
}
