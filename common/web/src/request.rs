use anyhow::anyhow;
use axum::body::to_bytes;
use axum::extract::{RawPathParams, Request};
use axum::RequestExt;
use common_http_errors::RequestError;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// Upper bound on request bodies read by [`decode`].
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Value of the route parameter `name`. A missing parameter means the route
/// and the handler disagree, which is an internal error.
pub async fn param(req: &mut Request, name: &str) -> Result<String, Error> {
    let params = req
        .extract_parts::<RawPathParams>()
        .await
        .map_err(|rejection| anyhow!("reading path parameters: {rejection}"))?;

    params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .ok_or_else(|| Error::Internal(anyhow!("route has no parameter {name:?}")))
}

/// Reads the body as JSON. Unreadable or malformed payloads are the
/// caller's fault.
pub async fn decode<T: DeserializeOwned>(req: Request) -> Result<T, Error> {
    let bytes = to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|err| RequestError::bad_request(format!("unable to read payload: {err}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|err| RequestError::bad_request(format!("unable to decode payload: {err}")).into())
}
