use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::assets::serve_embedded;
use crate::handler::{self, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_books))
        .route("/add-cart", post(handler::add_book))
        .route("/update-book", get(handler::edit_book_form))
        .route("/perform-update", post(handler::update_book))
        .route("/delete-book", post(handler::delete_book))
        .route("/health", get(handler::healthcheck))
        .route("/static/*path", get(serve_embedded))
}

/// Builds the service. Requests run without a deadline unless `request_timeout` is set.
pub fn app(state: AppState, request_timeout: Option<Duration>) -> Router {
    with_layers(routes().with_state(state), request_timeout)
}

fn with_layers(router: Router, request_timeout: Option<Duration>) -> Router {
    let router = router.layer(TraceLayer::new_for_http());

    match request_timeout {
        Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
        None => router,
    }
}
