use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Identity, validity window and role memberships carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    pub subject: String,
    pub issuer: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub roles: BTreeSet<String>,
}

impl Claims {
    /// Claims issued now and valid for `ttl`. Timestamps are kept at whole
    /// seconds, the resolution of the wire format. Fails when `ttl` pushes
    /// the expiry past what a timestamp can hold.
    pub fn new<I, R>(subject: impl Into<String>, issuer: impl Into<String>, roles: I, ttl: Duration) -> AuthResult<Self>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let issued_at = truncate_to_seconds(Utc::now());
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::InvalidClaim("exp", format!("now + {ttl}")))?;
        Ok(Self {
            subject: subject.into(),
            issuer: issuer.into(),
            issued_at,
            expires_at,
            roles: roles.into_iter().map(Into::into).collect(),
        })
    }

    /// Convenience helper for role checks.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub(crate) fn check_invariants(&self) -> AuthResult<()> {
        if self.subject.trim().is_empty() {
            return Err(AuthError::InvalidClaim("sub", self.subject.clone()));
        }
        // The wire carries whole seconds only.
        if self.issued_at.timestamp_subsec_nanos() != 0 {
            return Err(AuthError::InvalidClaim("iat", self.issued_at.to_rfc3339()));
        }
        if self.expires_at.timestamp_subsec_nanos() != 0 {
            return Err(AuthError::InvalidClaim("exp", self.expires_at.to_rfc3339()));
        }
        if self.expires_at <= self.issued_at {
            return Err(AuthError::InvalidClaim("exp", self.expires_at.timestamp().to_string()));
        }
        Ok(())
    }

    pub(crate) fn as_wire(&self) -> WireClaims<'_> {
        WireClaims {
            sub: &self.subject,
            iss: &self.issuer,
            iat: self.issued_at.timestamp(),
            exp: self.expires_at.timestamp(),
            roles: &self.roles,
        }
    }
}

fn truncate_to_seconds(value: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(value.timestamp(), 0).single().unwrap_or(value)
}

/// Registered JWT claim names plus `roles`, as signed onto the wire.
#[derive(Serialize)]
pub(crate) struct WireClaims<'a> {
    sub: &'a str,
    iss: &'a str,
    iat: i64,
    exp: i64,
    roles: &'a BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClaimsRepr {
    sub: String,
    #[serde(default)]
    iss: String,
    iat: i64,
    exp: i64,
    #[serde(default)]
    roles: BTreeSet<String>,
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let issued_at = Utc
            .timestamp_opt(value.iat, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("iat", value.iat.to_string()))?;
        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("exp", value.exp.to_string()))?;

        let claims = Self {
            subject: value.sub,
            issuer: value.iss,
            issued_at,
            expires_at,
            roles: value.roles,
        };
        claims.check_invariants()?;
        Ok(claims)
    }
}
