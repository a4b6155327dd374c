use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use common_auth::KNOWN_ROLES;
use common_http_errors::FieldErrors;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error("ID is not in its proper form")]
    InvalidId,
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("authentication failed")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(FieldErrors),
    #[error("hashing password: {0}")]
    Hash(String),
}

/// Someone with access to the system.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: String,
    pub password: String,
    pub password_confirm: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut fields = FieldErrors::new();

        if self.name.trim().is_empty() {
            fields.push("name", "name is a required field");
        }
        if self.email.trim().is_empty() {
            fields.push("email", "email is a required field");
        } else if !self.email.contains('@') {
            fields.push("email", "email must be a valid email address");
        }
        if !KNOWN_ROLES.contains(&self.role.as_str()) {
            fields.push("role", format!("role must be one of {}", KNOWN_ROLES.join(", ")));
        }
        if self.password.trim().is_empty() {
            fields.push("password", "password is a required field");
        }
        if self.password != self.password_confirm {
            fields.push("password_confirm", "password_confirm must be equal to Password");
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(fields)
        }
    }
}

/// Persistence for user accounts, as seen by the handlers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User, UserError>;
    async fn query_by_id(&self, id: &str) -> Result<User, UserError>;
    async fn query_by_email(&self, email: &str) -> Result<User, UserError>;
    /// Checks the password and returns the account it belongs to. Unknown
    /// emails and wrong passwords are indistinguishable.
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserError>;
}

struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, StoredUser>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_by_email<T>(&self, email: &str, f: impl FnOnce(&StoredUser) -> T) -> Option<T> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users
            .values()
            .find(|stored| stored.user.email.eq_ignore_ascii_case(email))
            .map(f)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, UserError> {
        new_user.validate().map_err(UserError::Validation)?;
        let password_hash = hash_password(&new_user.password)?;

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name.trim().to_string(),
            email: new_user.email.trim().to_string(),
            role: new_user.role,
        };

        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if users
            .values()
            .any(|stored| stored.user.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(UserError::DuplicateEmail);
        }
        users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash,
            },
        );
        Ok(user)
    }

    async fn query_by_id(&self, id: &str) -> Result<User, UserError> {
        let id = Uuid::parse_str(id).map_err(|_| UserError::InvalidId)?;
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users
            .get(&id)
            .map(|stored| stored.user.clone())
            .ok_or(UserError::NotFound)
    }

    async fn query_by_email(&self, email: &str) -> Result<User, UserError> {
        self.find_by_email(email, |stored| stored.user.clone())
            .ok_or(UserError::NotFound)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserError> {
        let (user, password_hash) = self
            .find_by_email(email, |stored| (stored.user.clone(), stored.password_hash.clone()))
            .ok_or(UserError::InvalidCredentials)?;

        if verify_password(password, &password_hash) {
            Ok(user)
        } else {
            Err(UserError::InvalidCredentials)
        }
    }
}

fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| UserError::Hash(err.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: &str) -> NewUser {
        NewUser {
            name: "Gopher".into(),
            email: email.into(),
            role: role.into(),
            password: "gophers".into(),
            password_confirm: "gophers".into(),
        }
    }

    #[tokio::test]
    async fn create_then_query() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("gopher@example.com", "USER")).await.expect("create");

        let by_id = store.query_by_id(&user.id.to_string()).await.expect("by id");
        let by_email = store.query_by_email("GOPHER@example.com").await.expect("by email");
        assert_eq!(by_id, user);
        assert_eq!(by_email, user);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryUserStore::new();
        store.create(new_user("dup@example.com", "USER")).await.expect("first");
        let err = store.create(new_user("dup@example.com", "ADMIN")).await.expect_err("second");
        assert!(matches!(err, UserError::DuplicateEmail));
    }

    #[tokio::test]
    async fn lookups_distinguish_bad_ids_from_missing_users() {
        let store = InMemoryUserStore::new();
        assert!(matches!(store.query_by_id("not-a-uuid").await, Err(UserError::InvalidId)));
        assert!(matches!(
            store.query_by_id(&Uuid::new_v4().to_string()).await,
            Err(UserError::NotFound)
        ));
        assert!(matches!(store.query_by_email("nobody@example.com").await, Err(UserError::NotFound)));
    }

    #[tokio::test]
    async fn authenticate_checks_the_password() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("auth@example.com", "ADMIN")).await.expect("create");

        let found = store.authenticate("auth@example.com", "gophers").await.expect("login");
        assert_eq!(found.id, user.id);

        assert!(matches!(
            store.authenticate("auth@example.com", "wrong").await,
            Err(UserError::InvalidCredentials)
        ));
        assert!(matches!(
            store.authenticate("missing@example.com", "gophers").await,
            Err(UserError::InvalidCredentials)
        ));
    }

    #[test]
    fn validation_collects_every_field() {
        let mut bad = new_user("no-at-sign", "ROOT");
        bad.name = " ".into();
        bad.password_confirm = "different".into();

        let fields = bad.validate().expect_err("invalid");
        let names: Vec<&str> = fields.0.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["name", "email", "role", "password_confirm"]);
    }
}
