use common_auth::{AuthError, GuardError};
use common_http_errors::RequestError;
use thiserror::Error;

/// Everything a handler or middleware can return.
///
/// `Request` errors are trusted and shown to the caller. `Internal` errors are
/// logged and answered with a generic 500. `Shutdown` and `Panic` mean the
/// service's invariants may no longer hold; they escape the pipeline and stop
/// the process.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
    #[error("{0}")]
    Shutdown(String),
    #[error("PANIC [{message}]")]
    Panic { message: String, trace: String },
    #[error("registering route: {0}")]
    Route(String),
}

impl Error {
    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown(message.into())
    }

    /// Whether this error must escalate to a process shutdown.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Error::Shutdown(_) | Error::Panic { .. })
    }
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Self {
        Self::Request(value.into())
    }
}

impl From<GuardError> for Error {
    fn from(value: GuardError) -> Self {
        Self::Request(value.into())
    }
}

pub type HandlerResult = Result<axum::response::Response, Error>;
