use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::Request;
use common_auth::{bearer_token, ensure_role, get_claims, set_claims, AuthEngine};
use tracing::debug;

use crate::context;
use crate::handler::{from_fn, Handler, Middleware};

/// Validates the bearer token and stores its claims for inner handlers.
pub fn authenticate(engine: Arc<AuthEngine>) -> Middleware {
    from_fn(move |mut req: Request, next: Handler| {
        let engine = engine.clone();
        async move {
            let token = bearer_token(req.headers())?;
            let claims = engine.validate_token(&token).map_err(|err| {
                debug!(trace_id = %context::trace_id(req.extensions()), error = %err, "token rejected");
                err
            })?;
            set_claims(req.extensions_mut(), claims);
            next(req).await
        }
    })
}

/// Requires the authenticated claims to hold `role`. Must run inside
/// [`authenticate`].
pub fn authorize(role: impl Into<String>) -> Middleware {
    let role: Arc<str> = role.into().into();
    from_fn(move |req: Request, next: Handler| {
        let role = role.clone();
        async move {
            let claims = get_claims(req.extensions())
                .ok_or_else(|| anyhow!("claims missing from context: authorize used without authenticate"))?;
            ensure_role(claims, &role)?;
            next(req).await
        }
    })
}
