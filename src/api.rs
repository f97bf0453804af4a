//! HTTP API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::AppState;

const GREETING: &str = "Hello this is the Webhallen API!";

/// Errors surfaced to API clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// Any failure while preparing, binding, or executing the lookup query
    #[error("{0}")]
    Query(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "err": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/webhallen/products/{product_id}", get(get_product))
        .with_state(state)
}

/// Root greeting
async fn root() -> &'static str {
    GREETING
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check() -> Json<Health> {
    Json(Health {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Look up products by id
///
/// Returns every row matching the id as a JSON array. An unknown id is not
/// an error: the response is 200 with an empty array.
async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    match state.db.products_by_id(&product_id) {
        Ok(products) => {
            tracing::debug!(%product_id, rows = products.len(), "product lookup");
            Ok(Json(products))
        }
        Err(e) => {
            tracing::error!(%product_id, error = %e, "product lookup failed");
            Err(ApiError::Query(e.to_string()))
        }
    }
}
