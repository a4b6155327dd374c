use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use common_auth::{basic_credentials, get_claims, is_self_or_role, AuthEngine, Claims, GuardError, ROLE_ADMIN};
use common_http_errors::RequestError;
use common_web::{context, decode, param, respond, Error, HandlerResult};
use serde::Serialize;
use tracing::{error, info};

use crate::users::{NewUser, UserError, UserStore};

impl From<UserError> for Error {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => RequestError::not_found(err.to_string()).into(),
            UserError::InvalidId => RequestError::bad_request(err.to_string()).into(),
            UserError::DuplicateEmail => RequestError::conflict(err.to_string()).into(),
            UserError::InvalidCredentials => RequestError::unauthorized(err.to_string()).into(),
            UserError::Validation(fields) => RequestError::validation(fields).into(),
            UserError::Hash(_) => Error::Internal(anyhow::Error::new(err)),
        }
    }
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

/// The user endpoints and what they need.
pub struct UserHandlers {
    pub store: Arc<dyn UserStore>,
    pub engine: Arc<AuthEngine>,
    pub issuer: String,
    pub token_ttl: chrono::Duration,
}

impl UserHandlers {
    pub async fn create(self: Arc<Self>, req: Request) -> HandlerResult {
        let values = context::get(req.extensions())?;
        let new_user: NewUser = decode(req).await?;

        let user = self.store.create(new_user).await?;
        info!(trace_id = %values.trace_id, user_id = %user.id, "user created");

        respond(&values, &user, StatusCode::CREATED)
    }

    pub async fn query_by_id(self: Arc<Self>, mut req: Request) -> HandlerResult {
        let values = context::get(req.extensions())?;
        let id = param(&mut req, "id").await?;

        let claims = get_claims(req.extensions()).ok_or_else(forbidden)?;
        if !is_self_or_role(claims, &id, ROLE_ADMIN) {
            return Err(forbidden());
        }

        let user = self.store.query_by_id(&id).await?;
        respond(&values, &user, StatusCode::OK)
    }

    pub async fn query_by_email(self: Arc<Self>, mut req: Request) -> HandlerResult {
        let values = context::get(req.extensions())?;
        let email = param(&mut req, "email").await?;

        let user = self.store.query_by_email(&email).await?;
        respond(&values, &user, StatusCode::OK)
    }

    /// Trades HTTP basic credentials for a signed token.
    pub async fn token(self: Arc<Self>, req: Request) -> HandlerResult {
        let values = context::get(req.extensions())?;
        let (email, password) = basic_credentials(req.headers())?;

        let user = self.store.authenticate(&email, &password).await?;
        let claims = Claims::new(user.id.to_string(), &self.issuer, [user.role], self.token_ttl)?;
        let token = self.engine.generate_token(&claims).map_err(|err| {
            error!(trace_id = %values.trace_id, error = %err, "issuing token");
            err
        })?;

        respond(&values, &TokenResponse { token }, StatusCode::OK)
    }
}

fn forbidden() -> Error {
    GuardError::Forbidden {
        required: ROLE_ADMIN.to_string(),
    }
    .into()
}
