use std::sync::Arc;

use anyhow::{Error, Result};
use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    response::{IntoResponse, Json},
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    clients::{KeyValueStore, ObjectStore, health::HealthChecker},
    config::{Config, TableNames, default_max_upload_bytes},
    error::AppError,
    handlers::{orders, products, uploads, users},
    notifications::dispatcher::NotificationDispatcher,
};

pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub dispatcher: NotificationDispatcher,
    pub tables: TableNames,
    pub notification_failure_fatal: bool,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        objects: Arc<dyn ObjectStore>,
        dispatcher: NotificationDispatcher,
        tables: TableNames,
    ) -> Self {
        Self {
            store,
            objects,
            dispatcher,
            tables,
            notification_failure_fatal: false,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }

    pub fn with_fatal_notifications(mut self, fatal: bool) -> Self {
        self.notification_failure_fatal = fatal;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// The `/api` surface. Health is mounted separately by [`run_api_server`].
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .nest("/api/users", users::router())
        .nest("/api/products", products::router())
        .nest("/api/orders", orders::router())
        .nest("/api/upload", uploads::router().layer(upload_limit))
        .fallback(unsupported_route)
        .with_state(state)
}

pub async fn run_api_server(config: Config, state: Arc<AppState>) -> Result<(), Error> {
    let health_checker = Arc::new(HealthChecker::new(config.clone()));

    let app = router(state)
        .merge(
            Router::new()
                .route("/health", get(health_check))
                .with_state(health_checker),
        )
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "API server started");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn unsupported_route() -> AppError {
    AppError::NotFound("Unsupported route".to_string())
}

async fn health_check(State(health_checker): State<Arc<HealthChecker>>) -> impl IntoResponse {
    let health = health_checker.check_all().await;

    (health.status.status_code(), Json(health))
}
