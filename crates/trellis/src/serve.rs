// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP serving through axum.
//!
//! This is a thin adapter: every request reaches a fallback handler that
//! converts it to a [`Request`], runs [`Mux::dispatch`] on the blocking
//! pool, and converts the [`Response`] back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response as AxumResponse},
    Router,
};
use tower_http::services::ServeDir;

use crate::context::{Request, Response};
use crate::method::Method;
use crate::mux::Mux;

const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Environment variable holding the listen address.
pub const ADDR_ENV: &str = "TRELLIS_ADDR";
/// Environment variable holding the static files directory.
pub const STATIC_DIR_ENV: &str = "TRELLIS_STATIC_DIR";

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Builds an axum router that sends every request to `mux`.
pub fn router(mux: Arc<Mux>) -> Router {
    Router::new().fallback(fallback_handler).with_state(mux)
}

/// Like [`router`], with files under `static_dir` served at `/static`.
pub fn router_with_static(mux: Arc<Mux>, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .fallback(fallback_handler)
        .with_state(mux)
}

/// Binds `addr` and serves `mux` until the process stops.
pub async fn serve(addr: &str, mux: Mux) -> std::io::Result<()> {
    serve_router(addr, router(Arc::new(mux))).await
}

/// Serves `mux` as configured by `trellis dev`: the address comes from
/// `TRELLIS_ADDR` (default `127.0.0.1:3000`) and, when `TRELLIS_STATIC_DIR`
/// is set, that directory is served at `/static`.
pub async fn serve_from_env(mux: Mux) -> std::io::Result<()> {
    let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let mux = Arc::new(mux);
    let app = match std::env::var_os(STATIC_DIR_ENV) {
        Some(dir) => router_with_static(mux, PathBuf::from(dir)),
        None => router(mux),
    };
    serve_router(&addr, app).await
}

async fn serve_router(addr: &str, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

async fn fallback_handler(
    State(mux): State<Arc<Mux>>,
    request: axum::extract::Request,
) -> AxumResponse {
    let (parts, body) = request.into_parts();

    let Ok(method) = parts.method.as_str().parse::<Method>() else {
        return (StatusCode::METHOD_NOT_ALLOWED, "Unsupported method").into_response();
    };

    let body = match axum::body::to_bytes(body, MAX_BODY_SIZE).await {
        Ok(bytes) => bytes.to_vec(),
        Err(_) => return (StatusCode::PAYLOAD_TOO_LARGE, "Body too large").into_response(),
    };

    let mut request = Request::new(method, parts.uri.path())
        .with_query_string(parts.uri.query().unwrap_or_default())
        .with_body(body);
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }

    match tokio::task::spawn_blocking(move || mux.dispatch(request)).await {
        Ok(response) => to_axum(response),
        Err(err) => {
            tracing::error!("request handler panicked: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn to_axum(response: Response) -> AxumResponse {
    let mut builder = axum::http::Response::builder().status(response.status);
    for (name, value) in response.headers {
        builder = builder.header(name, value);
    }
    match builder.body(Body::from(response.body)) {
        Ok(response) => response,
        Err(err) => {
            tracing::error!("invalid response: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
