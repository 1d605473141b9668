//! HTTP surface: `POST /api/filterSchools`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use crate::finder::SchoolFinder;
use crate::processing::FilterCriteria;

/// Route served by [`router`].
pub const FILTER_ROUTE: &str = "/api/filterSchools";

/// Build the application router around a shared finder.
pub fn router(finder: Arc<SchoolFinder>) -> Router {
    Router::new()
        .route(FILTER_ROUTE, post(filter_schools_handler))
        .with_state(finder)
}

async fn filter_schools_handler(
    State(finder): State<Arc<SchoolFinder>>,
    Json(criteria): Json<FilterCriteria>,
) -> Response {
    match finder.find_schools(&criteria).await {
        Ok(rows) => Json(rows).into_response(),
        Err(error) => {
            tracing::error!(%error, "filter request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal Server Error" })),
            )
                .into_response()
        }
    }
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(finder: Arc<SchoolFinder>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "school-finder listening");
    axum::serve(listener, router(finder)).await
}
