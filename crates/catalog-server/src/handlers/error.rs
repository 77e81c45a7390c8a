//! Mapping of repository failures onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catalog_core::CatalogError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    InvalidId(String),
    InvalidBody(String),
    Catalog(CatalogError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Catalog(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Catalog(CatalogError::DeadlineExceeded) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::InvalidId(raw) => format!("Invalid product id: {}", raw),
            ApiError::InvalidBody(reason) => format!("Invalid product body: {}", reason),
            ApiError::Catalog(e) => e.to_string(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError::Catalog(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        match &self {
            ApiError::Catalog(e) if !e.is_not_found() => {
                tracing::error!(error = %e, "Product request failed");
            }
            _ => tracing::debug!(%status, "Rejected product request: {}", message),
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{CacheError, StoreError};

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::from(CatalogError::from(StoreError::NotFound { id: 1 }));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        assert_eq!(
            ApiError::from(CatalogError::DeadlineExceeded).status(),
            StatusCode::GATEWAY_TIMEOUT
        );

        let cache = ApiError::from(CatalogError::from(CacheError::Connection("x".into())));
        assert_eq!(cache.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidId("abc".into()).status(), StatusCode::BAD_REQUEST);
    }
}
