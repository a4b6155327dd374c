//! Key material and engine builders shared by tests across the workspace.
//! Enabled with the `test-helpers` feature.

use std::sync::{Arc, OnceLock};

use chrono::Duration;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::RsaPrivateKey;

use crate::claims::Claims;
use crate::engine::AuthEngine;
use crate::keystore::KeyStore;

pub const TEST_KID: &str = "54bb2165-71e1-41a6-af3e-7da4a0e1e2c1";
pub const TEST_ISSUER: &str = "action project";

fn generate() -> RsaPrivateKey {
    let mut rng = OsRng;
    RsaPrivateKey::new(&mut rng, 2048).expect("key generation")
}

/// A 2048-bit key generated once per test binary.
pub fn private_key() -> RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(generate).clone()
}

/// A second, distinct key for rotation scenarios.
pub fn second_private_key() -> RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(generate).clone()
}

pub fn private_pem() -> String {
    private_key()
        .to_pkcs8_pem(LineEnding::LF)
        .expect("private pem")
        .to_string()
}

/// Store holding [`private_key`] under `kid`.
pub fn keystore(kid: &str) -> KeyStore {
    let store = KeyStore::new();
    store.insert_rsa_key(kid, &private_key()).expect("insert test key");
    store
}

/// RS256 engine signing with [`TEST_KID`].
pub fn engine() -> Arc<AuthEngine> {
    Arc::new(AuthEngine::new(TEST_KID, keystore(TEST_KID)).expect("engine"))
}

pub fn claims_with_roles(subject: &str, roles: &[&str]) -> Claims {
    Claims::new(subject, TEST_ISSUER, roles.iter().copied(), Duration::hours(1)).expect("test claims")
}

/// Signed bearer token for `subject` holding `roles`.
pub fn token(engine: &AuthEngine, subject: &str, roles: &[&str]) -> String {
    engine
        .generate_token(&claims_with_roles(subject, roles))
        .expect("generate token")
}
