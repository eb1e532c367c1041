//! HTTP endpoint serving the finished Swagger document.
//!
//! The document is mounted at `<static_url_path>/swagger.json`. Its `host`
//! field is filled in per request from the `Host` header, on a copy, so the
//! shared document is never written after registration.

use crate::document::SwaggerDocument;
use anyhow::Context;
use axum::{
    http::{header::HOST, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

/// Default static namespace the document is mounted under
pub const DEFAULT_STATIC_URL_PATH: &str = "/static";

/// Route at which the document is served.
pub fn swagger_route(static_url_path: &str) -> String {
    format!("{}/swagger.json", static_url_path.trim_end_matches('/'))
}

/// Builds the router serving `document`.
pub fn create_router(document: Arc<SwaggerDocument>, static_url_path: &str) -> Router {
    let route = swagger_route(static_url_path);
    debug!("Mounting swagger document at {}", route);
    Router::new()
        .route(&route, get(swagger_json))
        .layer(Extension(document))
}

async fn swagger_json(
    Extension(document): Extension<Arc<SwaggerDocument>>,
    headers: HeaderMap,
) -> Response {
    let Some(host) = headers.get(HOST).and_then(|value| value.to_str().ok()) else {
        return (StatusCode::BAD_REQUEST, "missing Host header").into_response();
    };

    match document.served(&format!("http://{}/", host)) {
        Ok(served) => Json(served).into_response(),
        Err(e) => {
            warn!("Cannot serve swagger document for host {}: {}", host, e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Serves `document` until the process is interrupted.
pub async fn serve(
    document: SwaggerDocument,
    addr: SocketAddr,
    static_url_path: &str,
) -> anyhow::Result<()> {
    let app = create_router(Arc::new(document), static_url_path);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "Serving swagger document at http://{}{}",
        addr,
        swagger_route(static_url_path)
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
