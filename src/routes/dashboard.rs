use axum::{response::Html, routing::get, Router};

// ---

const DASHBOARD_HTML: &str = include_str!("../../static/dashboard.html");

/// Serve the single-page dashboard; it polls the JSON endpoints itself.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(|| async { Html(DASHBOARD_HTML) }))
}
