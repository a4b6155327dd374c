use std::env;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common_observability::Metrics;
use serde::Serialize;
use tracing::error;

/// State behind the debug listener. These routes sit outside the request
/// pipeline so they keep answering while it is unhealthy.
#[derive(Clone)]
pub struct CheckState {
    pub build: Arc<str>,
    pub metrics: Metrics,
}

#[derive(Serialize)]
pub struct Readiness {
    pub status: &'static str,
}

#[derive(Serialize, Default)]
pub struct Liveness {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    #[serde(rename = "podIP", skip_serializing_if = "Option::is_none")]
    pub pod_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

pub async fn readiness() -> Json<Readiness> {
    Json(Readiness { status: "ok" })
}

pub async fn liveness(State(state): State<CheckState>) -> Json<Liveness> {
    Json(Liveness {
        status: Some("up".to_string()),
        build: Some(state.build.to_string()),
        host: Some(env::var("HOSTNAME").unwrap_or_else(|_| "unavailable".to_string())),
        pod: env::var("KUBERNETES_PODNAME").ok(),
        pod_ip: env::var("KUBERNETES_NAMESPACE_POD_IP").ok(),
        node: env::var("KUBERNETES_NODENAME").ok(),
        namespace: env::var("KUBERNETES_NAMESPACE").ok(),
    })
}

pub async fn metrics(State(state): State<CheckState>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(err) => {
            error!(error = %err, "rendering metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
