//! Catalog Server
//!
//! HTTP front end for the cached product catalog. Products live in
//! PostgreSQL and are mirrored into a Redis hash for fast reads.

mod handlers;
mod logging;
mod settings;
mod storage;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json,
    Router,
};
use catalog_core::{
    CachedProductRepository, CallContext, ProductRepository, ProductStore, RecordCache,
};
use serde_json::json;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use settings::Settings;
use storage::Backends;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ProductRepository>,
    pub store: Arc<dyn ProductStore>,
    pub cache: Arc<dyn RecordCache>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn ProductRepository>,
        backends: &Backends,
        request_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            store: backends.store.clone(),
            cache: backends.cache.clone(),
            request_timeout,
        }
    }

    /// Context bounding one request's backend calls.
    pub fn call_context(&self) -> CallContext {
        CallContext::with_timeout(self.request_timeout)
    }
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = panic_message(info.payload());
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("[FATAL] {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(settings.env) {
        eprintln!("[FATAL] {:#}", e);
        std::process::exit(1);
    }

    info!(
        "Starting Catalog Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run_server(settings).await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server(settings: Settings) -> Result<()> {
    info!(env = ?settings.env, backend = ?settings.backend, "Configuration loaded");

    let backends = Backends::connect(&settings)
        .await
        .context("Failed to initialize backends")?;

    let repository = CachedProductRepository::new(
        backends.store.clone(),
        backends.cache.clone(),
        settings.repository_config(),
    );
    info!(config = ?repository.config(), "Repository ready");

    let state = AppState::new(Arc::new(repository), &backends, settings.http.timeout());
    // Outer bound for requests whose backend calls already carry their own deadline
    let app = router(state, settings.http.timeout() + Duration::from_secs(1));

    let addr: SocketAddr = settings
        .http
        .address
        .parse()
        .context("Failed to parse http.address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Server listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    backends.close().await;
    info!("Server stopped");
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Answer for a request whose handler panicked.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    error!(panic = %message, "Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

fn router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(cors::Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/product",
            get(handlers::products::list).post(handlers::products::create),
        )
        .route(
            "/product/:id",
            get(handlers::products::get)
                .put(handlers::products::update)
                .delete(handlers::products::delete),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(cors)
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use tower::ServiceExt;

    async fn explode() -> &'static str {
        panic!("handler exploded")
    }

    #[test]
    fn test_panic_message_from_payload() {
        let borrowed: Box<dyn Any + Send> = Box::new("static text");
        assert_eq!(panic_message(borrowed.as_ref()), "static text");

        let owned: Box<dyn Any + Send> = Box::new(String::from("formatted 7"));
        assert_eq!(panic_message(owned.as_ref()), "formatted 7");

        let other: Box<dyn Any + Send> = Box::new(7_u32);
        assert_eq!(panic_message(other.as_ref()), "Unknown panic");
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_internal_error() {
        let app = Router::new()
            .route("/explode", get(explode))
            .layer(CatchPanicLayer::custom(panic_response));

        let response = app
            .oneshot(Request::builder().uri("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }
}
