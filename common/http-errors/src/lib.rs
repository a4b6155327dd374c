use std::fmt;

use axum::{http::{StatusCode, HeaderValue}, response::{IntoResponse, Response}, Json};
use serde::Serialize;

const ERROR_CODE_HEADER: &str = "X-Error-Code";

/// JSON body returned to callers for every failed request.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub fields: Option<String>,
}

/// A problem with one field of a request payload.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, field: impl Into<String>, error: impl Into<String>) {
        self.0.push(FieldError { field: field.into(), error: error.into() });
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// `Ok(())` when nothing was recorded, otherwise a validation request error.
    pub fn into_result(self) -> ApiResult<()> {
        if self.is_empty() { Ok(()) } else { Err(RequestError::validation(self)) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(json) => f.write_str(&json),
            Err(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FieldErrors {}

/// A trusted, client-facing error. Its message is sent back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub fields: Option<FieldErrors>,
}

impl RequestError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, code: code_for(status), message: message.into(), fields: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message) }
    pub fn unauthorized(message: impl Into<String>) -> Self { Self::new(StatusCode::UNAUTHORIZED, message) }
    pub fn forbidden(message: impl Into<String>) -> Self { Self::new(StatusCode::FORBIDDEN, message) }
    pub fn not_found(message: impl Into<String>) -> Self { Self::new(StatusCode::NOT_FOUND, message) }
    pub fn conflict(message: impl Into<String>) -> Self { Self::new(StatusCode::CONFLICT, message) }

    pub fn validation(fields: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "validation",
            message: "data validation error".into(),
            fields: Some(fields),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.message.clone(),
            fields: self.fields.as_ref().map(|fields| fields.to_string()),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RequestError {}

fn code_for(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::CONFLICT => "conflict",
        s if s.is_server_error() => "internal_error",
        _ => "request_error",
    }
}

fn with_code(mut resp: Response, error_code: &str) -> Response {
    if let Ok(val) = HeaderValue::from_str(error_code) {
        resp.headers_mut().insert(ERROR_CODE_HEADER, val);
    }
    resp
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let body = self.body();
        with_code((self.status, Json(body)).into_response(), self.code)
    }
}

/// Generic 500 used for untrusted errors; nothing about the cause leaks to the caller.
pub fn internal_error_response() -> Response {
    let body = ErrorBody {
        error: StatusCode::INTERNAL_SERVER_ERROR.canonical_reason().unwrap_or("Internal Server Error").into(),
        fields: None,
    };
    with_code((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response(), "internal_error")
}

pub type ApiResult<T> = Result<T, RequestError>;
