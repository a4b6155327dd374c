use axum::http::{header::AUTHORIZATION, Extensions, HeaderMap, HeaderValue};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> AuthResult<String> {
    let header_value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?;
    parse_bearer(header_value)
}

/// `(username, password)` from an `Authorization: Basic ..` header.
pub fn basic_credentials(headers: &HeaderMap) -> AuthResult<(String, String)> {
    let header_value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?;
    parse_basic(header_value)
}

/// Stores the authenticated claims in the request's scoped state.
pub fn set_claims(extensions: &mut Extensions, claims: Claims) {
    extensions.insert(claims);
}

/// Claims stored by the authentication middleware, if it ran.
pub fn get_claims(extensions: &Extensions) -> Option<&Claims> {
    extensions.get::<Claims>()
}

fn parse_bearer(value: &HeaderValue) -> AuthResult<String> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthorization)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(token.to_owned())
}

fn parse_basic(value: &HeaderValue) -> AuthResult<(String, String)> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();

    let encoded = raw
        .strip_prefix("Basic ")
        .ok_or(AuthError::InvalidAuthorization)?
        .trim();
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| AuthError::InvalidAuthorization)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::InvalidAuthorization)?;

    match decoded.split_once(':') {
        Some((user, pass)) if !user.is_empty() => Ok((user.to_owned(), pass.to_owned())),
        _ => Err(AuthError::InvalidAuthorization),
    }
}
