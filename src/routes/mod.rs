use axum::Router;

use crate::SharedState;

mod aggregate;
mod charts;
mod dashboard;
mod health;
mod status;

// ---

pub fn router(state: SharedState) -> Router {
    // ---
    Router::new()
        .merge(dashboard::router())
        .merge(status::router())
        .merge(charts::router())
        .merge(aggregate::router())
        .merge(health::router())
        .with_state(state)
}
