use axum::http::StatusCode;
use common_http_errors::RequestError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing key id (kid) in token header")]
    MissingKeyId,
    #[error("token key id (kid) must be a string")]
    MalformedKeyId,
    #[error("no key registered for kid '{0}'")]
    KeyNotFound(String),
    #[error("unsupported signing algorithm '{0}'")]
    UnsupportedAlgorithm(String),
    #[error("token declares algorithm '{found}', expected '{expected}'")]
    AlgorithmMismatch { expected: String, found: String },
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token issuer '{0}' is not accepted")]
    InvalidIssuer(String),
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("signing token: {0}")]
    Signing(String),
    #[error("failed to parse key material for kid '{0}': {1}")]
    KeyParse(String, String),
    #[error("failed to load key store: {0}")]
    KeyStore(String),
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match value.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidIssuer => Self::InvalidIssuer(value.to_string()),
            ErrorKind::InvalidAlgorithm => Self::UnsupportedAlgorithm(value.to_string()),
            _ => Self::MalformedToken(value.to_string()),
        }
    }
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::KeyParse(_, _) | AuthError::KeyStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<AuthError> for RequestError {
    fn from(value: AuthError) -> Self {
        match value {
            // The cause names key ids; keep it in the logs.
            AuthError::Signing(_) => RequestError::unauthorized("unable to issue token"),
            other => RequestError::new(other.status(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_are_unauthorized() {
        for err in [
            AuthError::MissingKeyId,
            AuthError::MalformedKeyId,
            AuthError::KeyNotFound("old".into()),
            AuthError::Expired,
            AuthError::AlgorithmMismatch { expected: "RS256".into(), found: "HS256".into() },
            AuthError::MissingAuthorization,
        ] {
            let request: RequestError = err.into();
            assert_eq!(request.status, StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn signing_failures_hide_their_cause() {
        let request: RequestError = AuthError::Signing("kid lookup failed: no key registered for kid 'k1'".into()).into();
        assert_eq!(request.status, StatusCode::UNAUTHORIZED);
        assert_eq!(request.message, "unable to issue token");
    }

    #[test]
    fn key_material_errors_are_internal() {
        let request: RequestError = AuthError::KeyStore("disk".into()).into();
        assert_eq!(request.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
