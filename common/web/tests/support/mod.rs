#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use common_observability::Metrics;
use common_web::{shutdown_channel, App, Middleware, ShutdownListener, ShutdownSignal};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

pub struct Harness {
    pub app: App,
    pub signal: ShutdownSignal,
    pub listener: ShutdownListener,
    pub metrics: Metrics,
}

pub fn harness(mw: Vec<Middleware>) -> Harness {
    let (signal, listener) = shutdown_channel();
    let metrics = Metrics::new().expect("metrics registry");
    let app = App::new(signal.clone(), metrics.clone(), mw);
    Harness {
        app,
        signal,
        listener,
        metrics,
    }
}

pub async fn send(router: Router, method: Method, uri: &str, bearer: Option<&str>) -> Result<Response> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::empty()).context("build request")?;
    let response = router.oneshot(request).await.context("route request")?;
    Ok(response)
}

pub async fn json_body(response: Response) -> Result<(StatusCode, Value)> {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .context("read body")?
        .to_bytes();
    let value = serde_json::from_slice(&bytes).context("decode body")?;
    Ok((status, value))
}
