use crate::collector::window::{RollingWindow, WindowSnapshot};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::{Json, Router, routing::get};
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const DASHBOARD: &str = include_str!("dashboard.html");

/// Everything the HTTP handlers read from.
#[derive(Clone)]
pub struct AppState {
    pub window: RollingWindow,
    pub registry: Arc<Registry>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/metrics", get(window_json))
        .route("/metrics/prometheus", get(prometheus_text))
        .with_state(state)
}

pub struct MetricsServer {
    state: AppState,
    addr: SocketAddr,
    cancel: CancellationToken,
}

impl MetricsServer {
    pub fn new(state: AppState, addr: SocketAddr, cancel: CancellationToken) -> Self {
        Self {
            state,
            addr,
            cancel,
        }
    }

    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener).await
    }

    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!("Dashboard listening on http://{}/", addr);

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await?;

        tracing::info!("Dashboard server stopped");
        Ok(())
    }
}

async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD)
}

async fn window_json(State(state): State<AppState>) -> Json<WindowSnapshot> {
    Json(state.window.snapshot())
}

async fn prometheus_text(State(state): State<AppState>) -> Response {
    let mut buffer = String::new();
    if let Err(e) = encode(&mut buffer, &state.registry) {
        tracing::error!("Failed to encode metrics: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        buffer,
    )
        .into_response()
}
