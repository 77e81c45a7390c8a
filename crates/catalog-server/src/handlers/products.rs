//! Product handlers

use super::error::ApiError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use catalog_types::{Product, ProductId};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    #[serde(rename = "Products")]
    products: Vec<Product>,
}

fn parse_id(raw: &str) -> Result<ProductId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidId(raw.to_string()))
}

fn parse_body(payload: Result<Json<Product>, JsonRejection>) -> Result<Product, ApiError> {
    payload
        .map(|Json(product)| product)
        .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<ProductListResponse>, ApiError> {
    let ctx = state.call_context();
    let products = state.repository.read_all(&ctx).await?;
    Ok(Json(ProductListResponse { products }))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Product>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = parse_body(payload)?;
    let ctx = state.call_context();
    let created = state.repository.create(&ctx, product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&raw_id)?;
    let ctx = state.call_context();
    let product = state.repository.read_one(&ctx, id).await?;
    Ok(Json(product))
}

/// Full replacement; the id always comes from the path.
pub async fn update(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<Product>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&raw_id)?;
    let product = parse_body(payload)?.with_id(id);
    let ctx = state.call_context();
    state.repository.update(&ctx, &product).await?;
    Ok(Json(product))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&raw_id)?;
    let ctx = state.call_context();
    let deleted = state.repository.delete(&ctx, id).await?;
    Ok(Json(deleted))
}

#[cfg(test)]
mod tests {
    use crate::storage::Backends;
    use crate::{router, AppState};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use catalog_core::{CachedProductRepository, RepositoryConfig};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let backends = Backends::in_memory();
        let repository = CachedProductRepository::new(
            backends.store.clone(),
            backends.cache.clone(),
            RepositoryConfig::default(),
        );
        let state = AppState::new(
            Arc::new(repository),
            &backends,
            Duration::from_secs(4),
        );
        router(state, Duration::from_secs(5))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn lamp() -> Value {
        json!({
            "name": "Lamp",
            "description": "Desk lamp",
            "image_url": "https://img.example/lamp.png",
            "price": 40.0,
            "weight": 1.2
        })
    }

    #[tokio::test]
    async fn test_create_returns_created_product() {
        let app = app();

        let (status, body) = send(&app, "POST", "/product", Some(lamp())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);
        assert_eq!(body["name"], "Lamp");

        let (status, body) = send(&app, "GET", "/product/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["description"], "Desk lamp");
    }

    #[tokio::test]
    async fn test_list_wraps_products() {
        let app = app();
        send(&app, "POST", "/product", Some(lamp())).await;
        send(&app, "POST", "/product", Some(json!({"name": "Mug", "price": 3.0}))).await;

        let (status, body) = send(&app, "GET", "/product", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Products"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_takes_id_from_path() {
        let app = app();
        send(&app, "POST", "/product", Some(lamp())).await;

        let mut changed = lamp();
        changed["id"] = json!(99);
        changed["price"] = json!(35.5);
        let (status, body) = send(&app, "PUT", "/product/1", Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);

        let (_, body) = send(&app, "GET", "/product/1", None).await;
        assert_eq!(body["price"], 35.5);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let app = app();
        send(&app, "POST", "/product", Some(lamp())).await;

        let (status, body) = send(&app, "DELETE", "/product/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Lamp");

        let (status, body) = send(&app, "GET", "/product/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));

        let (status, _) = send(&app, "DELETE", "/product/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let app = app();
        let (status, body) = send(&app, "GET", "/product/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("abc"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app();
        let (status, body) = send(&app, "POST", "/product", Some(json!({"price": 1.0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let app = app();
        let (status, body) =
            send(&app, "POST", "/product", Some(json!({"name": "", "price": 1.0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Constraint"));

        let (_, body) = send(&app, "GET", "/product", None).await;
        assert!(body["Products"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let app = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
