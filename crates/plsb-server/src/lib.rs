//! PLSB Web Server
//!
//! Axum-based server for the PLSB dashboard: a welcome page, a monthly
//! dashboard page and a small JSON API over the same data.
//!
//! The dataset is read through a `CachedSource` owned by the application
//! state, so every request within the cache window sees the same data.

use std::path::Path;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use plsb_core::{CachedSource, PageConfig};

mod handlers;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Page title and icon
    pub page: PageConfig,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub source: Arc<CachedSource>,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(
    source: Arc<CachedSource>,
    static_dir: Option<&Path>,
    config: ServerConfig,
) -> Router {
    let state = Arc::new(AppState {
        source,
        config: config.clone(),
    });

    let api_routes = Router::new()
        .route("/months", get(handlers::list_months))
        .route("/metrics", get(handlers::get_metrics))
        .route("/status", get(handlers::get_status))
        .route("/refresh", post(handlers::refresh));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    // CSP: pages are server-rendered with inline styles and no scripts
    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'none'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; form-action 'self'; frame-ancestors 'none'",
    );

    let mut app = Router::new()
        .route("/", get(handlers::welcome_page))
        .route("/dashboard", get(handlers::dashboard_page))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve_with_config(
    source: Arc<CachedSource>,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    // Warm the cache so a broken source shows up in the logs right away
    match source.dataset().await {
        Ok(cached) => info!(
            "✅ Data source ready: {} ({} months)",
            source.name(),
            cached.dataset.len()
        ),
        Err(e) => warn!("⚠️  Data source not reachable yet: {} ({})", source.name(), e),
    }

    let app = create_router(source, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Map a core error to a status code and a message safe to show users
    pub fn from_core(err: plsb_core::Error) -> Self {
        use plsb_core::Error;

        match err {
            Error::MonthNotFound(_) => Self::not_found(&err.to_string()),
            Error::EmptyDataset
            | Error::DuplicateMonth(_)
            | Error::MissingField { .. }
            | Error::InvalidData(_)
            | Error::Csv(_) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: err.to_string(),
                internal: None,
            },
            Error::DataUnavailable { .. } | Error::Http(_) => Self {
                status: StatusCode::BAD_GATEWAY,
                message: "Data source unavailable, try again shortly".to_string(),
                internal: Some(err.into()),
            },
            _ => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "An internal error occurred".to_string(),
                internal: Some(err.into()),
            },
        }
    }

    /// Log the internal error, if any
    pub(crate) fn log(&self) {
        if let Some(err) = &self.internal {
            error!(error = %err, status = %self.status, "Request failed");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
