use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common_http_errors::internal_error_response;
use tracing::error;

use crate::context;
use crate::error::Error;
use crate::handler::{from_fn, Handler, Middleware};

/// Answers every error from the inner chain. Trusted request errors are sent
/// back as-is, anything else becomes a generic 500. Fatal errors are passed
/// on so the pipeline can stop the service.
pub fn errors() -> Middleware {
    from_fn(|req: Request, next: Handler| async move {
        let values = context::get(req.extensions())?;

        let err = match next(req).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        error!(trace_id = %values.trace_id, error = %err, "request failed");

        match err {
            Error::Request(request_error) => {
                values.set_status(request_error.status);
                Ok(request_error.into_response())
            }
            err if err.is_shutdown() => {
                values.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                Err(err)
            }
            _ => {
                values.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                Ok(internal_error_response())
            }
        }
    })
}
