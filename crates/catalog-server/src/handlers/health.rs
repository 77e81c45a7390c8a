//! Health check

use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let ctx = state.call_context();
    let store = ctx.run(state.store.ping()).await;
    let cache = ctx.run(state.cache.ping()).await;

    match (store, cache) {
        (Ok(()), Ok(())) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        (store, cache) => {
            let describe = |r: Result<(), catalog_core::CatalogError>| match r {
                Ok(()) => "ok".to_string(),
                Err(e) => e.to_string(),
            };
            let (store, cache) = (describe(store), describe(cache));
            tracing::warn!(%store, %cache, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "store": store, "cache": cache })),
            )
        }
    }
}
