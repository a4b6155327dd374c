use common_http_errors::RequestError;

use crate::claims::Claims;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    Forbidden { required: String },
}

impl From<GuardError> for RequestError {
    fn from(value: GuardError) -> Self {
        match value {
            GuardError::Forbidden { required } => RequestError::forbidden(format!(
                "attempted action is not allowed: requires role {required}"
            )),
        }
    }
}

/// True iff `required_role` is one of the claims' roles.
pub fn authorized(claims: &Claims, required_role: &str) -> bool {
    claims.has_role(required_role)
}

/// Owner-or-privileged check used by resource handlers.
pub fn is_self_or_role(claims: &Claims, resource_owner_id: &str, required_role: &str) -> bool {
    claims.subject == resource_owner_id || authorized(claims, required_role)
}

pub fn ensure_role(claims: &Claims, required_role: &str) -> Result<(), GuardError> {
    if authorized(claims, required_role) {
        Ok(())
    } else {
        Err(GuardError::Forbidden {
            required: required_role.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::{ROLE_ADMIN, ROLE_USER};
    use axum::http::StatusCode;
    use chrono::Duration;

    fn claims(subject: &str, roles: &[&str]) -> Claims {
        Claims::new(subject, "issuer", roles.iter().copied(), Duration::minutes(5)).expect("claims")
    }

    #[test]
    fn authorized_is_role_membership() {
        assert!(authorized(&claims("a", &[ROLE_ADMIN]), ROLE_ADMIN));
        assert!(authorized(&claims("a", &[ROLE_USER, ROLE_ADMIN]), ROLE_ADMIN));
        assert!(!authorized(&claims("a", &[ROLE_USER]), ROLE_ADMIN));
        assert!(!authorized(&claims("a", &[]), ROLE_ADMIN));
    }

    #[test]
    fn self_access_ignores_roles() {
        assert!(is_self_or_role(&claims("owner", &[]), "owner", ROLE_ADMIN));
    }

    #[test]
    fn role_access_ignores_subject() {
        assert!(is_self_or_role(&claims("admin", &[ROLE_ADMIN]), "owner", ROLE_ADMIN));
    }

    #[test]
    fn neither_self_nor_role_is_denied() {
        assert!(!is_self_or_role(&claims("someone", &[ROLE_USER]), "owner", ROLE_ADMIN));
    }

    #[test]
    fn ensure_role_maps_to_forbidden() {
        let err = ensure_role(&claims("a", &[ROLE_USER]), ROLE_ADMIN).expect_err("denied");
        let request: RequestError = err.into();
        assert_eq!(request.status, StatusCode::FORBIDDEN);
        assert!(request.message.contains(ROLE_ADMIN));
    }
}
