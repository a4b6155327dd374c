use common_http_errors::{internal_error_response, FieldErrors, RequestError};
use axum::response::IntoResponse;
use axum::http::StatusCode;
use serde_json::Value;

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn forbidden_variant() {
    let resp = RequestError::forbidden("attempted action is not allowed").into_response();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "forbidden");
    let body = body_json(resp).await;
    assert_eq!(body["error"], "attempted action is not allowed");
    assert!(body.get("fields").is_none());
}

#[test]
fn unauthorized_variant() {
    let resp = RequestError::unauthorized("token expired").into_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "unauthorized");
}

#[test]
fn not_found_variant() {
    let resp = RequestError::not_found("user not found").into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "not_found");
}

#[tokio::test]
async fn validation_variant_carries_fields_as_string() {
    let mut fields = FieldErrors::new();
    fields.push("email", "must be a valid email address");
    let resp = fields.into_result().unwrap_err().into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "validation");

    let body = body_json(resp).await;
    assert_eq!(body["error"], "data validation error");
    let fields: Value = serde_json::from_str(body["fields"].as_str().unwrap()).unwrap();
    assert_eq!(fields[0]["field"], "email");
}

#[test]
fn empty_field_errors_pass() {
    assert!(FieldErrors::new().into_result().is_ok());
}

#[tokio::test]
async fn internal_response_hides_detail() {
    let resp = internal_error_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "internal_error");
    let body = body_json(resp).await;
    assert_eq!(body["error"], "Internal Server Error");
}
