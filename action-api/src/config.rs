use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

/// Longest token lifetime the service will issue.
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub debug_port: u16,
    pub keys_folder: PathBuf,
    pub active_kid: String,
    pub issuer: String,
    pub token_ttl: chrono::Duration,
    pub leeway_seconds: u32,
    pub shutdown_timeout: Duration,
    pub build: String,
    pub seed_admin: Option<SeedAdmin>,
}

/// Account created at startup so the in-memory store has someone who can
/// request tokens.
#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl ServiceConfig {
    pub fn api_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn debug_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.debug_port)
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    service_config_from(|key| env::var(key).ok())
}

/// Builds the config from an arbitrary variable source.
pub fn service_config_from<F>(lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).and_then(|value| normalize_optional(&value));

    let host = var("HOST")
        .unwrap_or_else(|| "0.0.0.0".to_string())
        .parse::<IpAddr>()
        .context("Failed to parse HOST")?;
    let port = parse_or(var("PORT"), 3000u16).context("Failed to parse PORT")?;
    let debug_port = parse_or(var("DEBUG_PORT"), 4000u16).context("Failed to parse DEBUG_PORT")?;

    let keys_folder = PathBuf::from(var("AUTH_KEYS_FOLDER").unwrap_or_else(|| "zarf/keys".to_string()));
    let active_kid = var("AUTH_ACTIVE_KID").ok_or_else(|| anyhow!("AUTH_ACTIVE_KID must be set"))?;
    let issuer = var("AUTH_ISSUER").unwrap_or_else(|| "action project".to_string());

    let ttl_secs = parse_or(var("AUTH_TOKEN_TTL_SECS"), 3600i64).context("Failed to parse AUTH_TOKEN_TTL_SECS")?;
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl_secs) {
        return Err(anyhow!(
            "AUTH_TOKEN_TTL_SECS must be between 1 and {MAX_TOKEN_TTL_SECS}, got {ttl_secs}"
        ));
    }
    let token_ttl = chrono::Duration::try_seconds(ttl_secs)
        .ok_or_else(|| anyhow!("AUTH_TOKEN_TTL_SECS out of range: {ttl_secs}"))?;
    let leeway_seconds = parse_or(var("AUTH_LEEWAY_SECS"), 0u32).context("Failed to parse AUTH_LEEWAY_SECS")?;
    let shutdown_secs =
        parse_or(var("SHUTDOWN_TIMEOUT_SECS"), 20u64).context("Failed to parse SHUTDOWN_TIMEOUT_SECS")?;

    let build = var("BUILD").unwrap_or_else(|| "develop".to_string());

    let seed_admin = match (var("SEED_ADMIN_EMAIL"), var("SEED_ADMIN_PASSWORD")) {
        (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
        (None, None) => None,
        _ => return Err(anyhow!("SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD must be set together")),
    };

    Ok(ServiceConfig {
        host,
        port,
        debug_port,
        keys_folder,
        active_kid,
        issuer,
        token_ttl,
        leeway_seconds,
        shutdown_timeout: Duration::from_secs(shutdown_secs),
        build,
        seed_admin,
    })
}

fn parse_or<T>(value: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => Ok(raw.parse::<T>()?),
        None => Ok(default),
    }
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<ServiceConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        service_config_from(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("AUTH_ACTIVE_KID", "kid-1")]).expect("config");
        assert_eq!(cfg.api_addr(), "0.0.0.0:3000".parse().expect("addr"));
        assert_eq!(cfg.debug_addr().port(), 4000);
        assert_eq!(cfg.keys_folder, PathBuf::from("zarf/keys"));
        assert_eq!(cfg.issuer, "action project");
        assert_eq!(cfg.token_ttl, chrono::Duration::hours(1));
        assert_eq!(cfg.leeway_seconds, 0);
        assert_eq!(cfg.shutdown_timeout, Duration::from_secs(20));
        assert_eq!(cfg.build, "develop");
        assert!(cfg.seed_admin.is_none());
    }

    #[test]
    fn active_kid_is_required() {
        let err = config(&[]).expect_err("missing kid");
        assert!(err.to_string().contains("AUTH_ACTIVE_KID"));

        assert!(config(&[("AUTH_ACTIVE_KID", "   ")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("AUTH_ACTIVE_KID", "kid-1"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("AUTH_TOKEN_TTL_SECS", "60"),
            ("AUTH_LEEWAY_SECS", "5"),
            ("SEED_ADMIN_EMAIL", "admin@example.com"),
            ("SEED_ADMIN_PASSWORD", "gophers"),
        ])
        .expect("config");
        assert_eq!(cfg.api_addr(), "127.0.0.1:8080".parse().expect("addr"));
        assert_eq!(cfg.token_ttl, chrono::Duration::seconds(60));
        assert_eq!(cfg.leeway_seconds, 5);
        assert_eq!(cfg.seed_admin.map(|seed| seed.email).as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(config(&[("AUTH_ACTIVE_KID", "k"), ("PORT", "http")]).is_err());
        assert!(config(&[("AUTH_ACTIVE_KID", "k"), ("AUTH_TOKEN_TTL_SECS", "0")]).is_err());
        assert!(config(&[("AUTH_ACTIVE_KID", "k"), ("SEED_ADMIN_EMAIL", "a@b.c")]).is_err());
    }

    #[test]
    fn token_ttl_is_capped() {
        let huge = (i64::MAX / 1000).to_string();
        let err = config(&[("AUTH_ACTIVE_KID", "k"), ("AUTH_TOKEN_TTL_SECS", huge.as_str())]).expect_err("too long");
        assert!(err.to_string().contains("AUTH_TOKEN_TTL_SECS"));

        let over = (MAX_TOKEN_TTL_SECS + 1).to_string();
        assert!(config(&[("AUTH_ACTIVE_KID", "k"), ("AUTH_TOKEN_TTL_SECS", over.as_str())]).is_err());

        let max = MAX_TOKEN_TTL_SECS.to_string();
        let cfg = config(&[("AUTH_ACTIVE_KID", "k"), ("AUTH_TOKEN_TTL_SECS", max.as_str())]).expect("at the cap");
        assert_eq!(cfg.token_ttl, chrono::Duration::seconds(MAX_TOKEN_TTL_SECS));
    }
}
