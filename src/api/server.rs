//! Sheetport API Server implementation
//!
//! HTTP server using Axum. Exports stream back as workbook attachments;
//! imports answer with JSON records.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::error::{SheetError, SheetResult};

/// API Server configuration
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Directory that request paths (`file_path`, `template`) are confined to
    pub data_root: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_root: PathBuf::from("."),
        }
    }
}

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    pub version: String,
    /// Canonical data root
    pub data_root: PathBuf,
}

impl AppState {
    pub fn new(version: impl Into<String>, data_root: impl AsRef<Path>) -> SheetResult<Self> {
        let root = data_root.as_ref();
        let data_root = root.canonicalize().map_err(|e| {
            SheetError::Config(format!("data root {}: {}", root.display(), e))
        })?;
        Ok(Self {
            version: version.into(),
            data_root,
        })
    }

    /// Resolve a client-supplied path inside the data root.
    ///
    /// Relative paths are joined onto the root. `..` and symlinks are
    /// resolved before the containment check; the file itself may not exist
    /// yet, but its directory must.
    pub fn resolve(&self, requested: &str) -> SheetResult<PathBuf> {
        if requested.trim().is_empty() {
            return Err(SheetError::Config("file path is not set".to_string()));
        }
        let outside =
            || SheetError::Config(format!("'{}' is outside the data root", requested));

        let candidate = self.data_root.join(requested);
        let file_name = candidate.file_name().ok_or_else(outside)?.to_owned();
        let parent = candidate
            .parent()
            .ok_or_else(outside)?
            .canonicalize()
            .map_err(|_| SheetError::Config(format!("directory does not exist: {}", requested)))?;

        let mut resolved = parent.join(file_name);
        if resolved.exists() {
            resolved = resolved.canonicalize()?;
        }

        if resolved.starts_with(&self.data_root) {
            Ok(resolved)
        } else {
            Err(outside())
        }
    }
}

/// Build the application router with its middleware
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/api/v1/export", post(handlers::export))
        .route("/api/v1/import", post(handlers::import_rows))
        .route("/api/v1/import/upload", post(handlers::import_upload))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetport=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(AppState::new(env!("CARGO_PKG_VERSION"), &config.data_root)?);
    let data_root = state.data_root.clone();
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Sheetport API Server starting on http://{}", addr);
    info!("   Data root: {}", data_root.display());
    info!("   Endpoints: /api/v1/export, /api/v1/import, /api/v1/import/upload");
    info!("   Health: /health, Version: /version");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Sheetport API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_root, PathBuf::from("."));
    }

    #[test]
    fn test_app_state_requires_existing_root() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            AppState::new("1.0.0", dir.path().join("missing")),
            Err(SheetError::Config(_))
        ));
    }

    #[test]
    fn test_resolve_inside_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("in")).unwrap();
        fs::write(dir.path().join("in/a.xlsx"), b"x").unwrap();
        let state = AppState::new("1.0.0", dir.path()).unwrap();

        let resolved = state.resolve("in/a.xlsx").unwrap();
        assert!(resolved.starts_with(&state.data_root));
        assert!(resolved.ends_with("in/a.xlsx"));

        // not created yet, directory exists
        assert!(state.resolve("in/../b.xlsx").is_ok());
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("data");
        fs::create_dir(&root).unwrap();
        fs::write(outer.path().join("secret.xlsx"), b"x").unwrap();
        let state = AppState::new("1.0.0", &root).unwrap();

        for requested in ["../secret.xlsx", "..", "", "/etc/passwd"] {
            assert!(
                matches!(state.resolve(requested), Err(SheetError::Config(_))),
                "{} should be rejected",
                requested
            );
        }
        let absolute = outer.path().join("secret.xlsx");
        assert!(state.resolve(&absolute.display().to_string()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_follows_symlinks_out_of_root() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("data");
        fs::create_dir(&root).unwrap();
        fs::write(outer.path().join("secret.xlsx"), b"x").unwrap();
        std::os::unix::fs::symlink(outer.path().join("secret.xlsx"), root.join("link.xlsx"))
            .unwrap();
        let state = AppState::new("1.0.0", &root).unwrap();

        assert!(matches!(
            state.resolve("link.xlsx"),
            Err(SheetError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_router_unknown_route_is_not_found() {
        let state = Arc::new(AppState::new("1.0.0", ".").unwrap());
        let response = router(state)
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_router_export_requires_post() {
        let state = Arc::new(AppState::new("1.0.0", ".").unwrap());
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/export")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
