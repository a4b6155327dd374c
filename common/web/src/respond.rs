use anyhow::Context;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;

use crate::context::RequestContext;
use crate::error::HandlerResult;

/// Encodes `data` as JSON and records `status` for the request logger.
pub fn respond<T: Serialize + ?Sized>(values: &RequestContext, data: &T, status: StatusCode) -> HandlerResult {
    values.set_status(status);

    if status == StatusCode::NO_CONTENT {
        return Ok(status.into_response());
    }

    let body = serde_json::to_vec(data).context("encoding response")?;
    let mut response = (status, body).into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}
