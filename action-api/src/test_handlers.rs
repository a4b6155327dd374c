use axum::extract::Request;
use axum::http::StatusCode;
use common_web::{context, respond, HandlerResult};
use serde::Serialize;

#[derive(Serialize)]
struct Status {
    status: &'static str,
}

/// Liveness of the request pipeline itself.
pub async fn test(req: Request) -> HandlerResult {
    let values = context::get(req.extensions())?;
    respond(&values, &Status { status: "OK" }, StatusCode::OK)
}

/// Same as [`test`], reachable only by administrators.
pub async fn test_auth(req: Request) -> HandlerResult {
    test(req).await
}
