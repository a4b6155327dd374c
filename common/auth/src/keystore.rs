use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Resolves a key identifier to key material. Implemented by any backing
/// store: in-memory, a directory of PEM files, a secret manager.
pub trait KeyLookup: Send + Sync {
    /// Private key used to sign tokens under `kid`.
    fn signing_key(&self, kid: &str) -> AuthResult<EncodingKey>;
    /// Public key used to verify tokens that declare `kid`.
    fn verification_key(&self, kid: &str) -> AuthResult<DecodingKey>;
}

impl<T: KeyLookup + ?Sized> KeyLookup for Arc<T> {
    fn signing_key(&self, kid: &str) -> AuthResult<EncodingKey> {
        (**self).signing_key(kid)
    }

    fn verification_key(&self, kid: &str) -> AuthResult<DecodingKey> {
        (**self).verification_key(kid)
    }
}

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Thread-safe store of RSA key pairs indexed by kid. Clones share the same keys.
#[derive(Clone, Default)]
pub struct KeyStore {
    inner: Arc<RwLock<HashMap<String, KeyPair>>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.pem` private key in `dir`; the file stem becomes the kid.
    pub fn from_pem_dir(dir: impl AsRef<Path>) -> AuthResult<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir)
            .map_err(|err| AuthError::KeyStore(format!("reading {}: {err}", dir.display())))?;

        let store = Self::new();
        for entry in entries {
            let path = entry
                .map_err(|err| AuthError::KeyStore(err.to_string()))?
                .path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("pem") {
                continue;
            }
            let Some(kid) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let pem = fs::read_to_string(&path)
                .map_err(|err| AuthError::KeyStore(format!("reading {}: {err}", path.display())))?;
            store.insert_rsa_pem(kid, &pem)?;
            debug!(kid, path = %path.display(), "loaded signing key");
        }
        Ok(store)
    }

    /// Registers an RSA private key (PKCS#8 or PKCS#1 PEM) under `kid`.
    pub fn insert_rsa_pem(&self, kid: impl Into<String>, pem: &str) -> AuthResult<()> {
        let kid = kid.into();
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|err| AuthError::KeyParse(kid.clone(), err.to_string()))?;
        self.insert_rsa_key(kid, &private)
    }

    pub fn insert_rsa_key(&self, kid: impl Into<String>, private: &RsaPrivateKey) -> AuthResult<()> {
        let kid = kid.into();
        let der = private
            .to_pkcs1_der()
            .map_err(|err| AuthError::KeyParse(kid.clone(), err.to_string()))?;
        let encoding = EncodingKey::from_rsa_der(der.as_bytes());

        let public = private.to_public_key();
        let modulus = URL_SAFE_NO_PAD.encode(public.n().to_bytes_be());
        let exponent = URL_SAFE_NO_PAD.encode(public.e().to_bytes_be());
        let decoding = DecodingKey::from_rsa_components(&modulus, &exponent)
            .map_err(|err| AuthError::KeyParse(kid.clone(), err.to_string()))?;

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(kid, KeyPair { encoding, decoding });
        Ok(())
    }

    /// Drops `kid`; tokens signed with it stop validating.
    pub fn remove(&self, kid: &str) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(kid).is_some()
    }

    pub fn contains(&self, kid: &str) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, kid: &str) -> AuthResult<KeyPair> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::KeyNotFound(kid.to_string()))
    }
}

impl KeyLookup for KeyStore {
    fn signing_key(&self, kid: &str) -> AuthResult<EncodingKey> {
        self.get(kid).map(|pair| pair.encoding)
    }

    fn verification_key(&self, kid: &str) -> AuthResult<DecodingKey> {
        self.get(kid).map(|pair| pair.decoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{private_key, private_pem};
    use rsa::pkcs1::LineEnding;

    #[test]
    fn insert_remove_round_trip() {
        let store = KeyStore::new();
        assert!(store.is_empty());
        store.insert_rsa_pem("kid", &private_pem()).expect("insert");
        assert!(store.contains("kid"));
        assert!(store.signing_key("kid").is_ok());
        assert!(store.verification_key("kid").is_ok());

        assert!(store.remove("kid"));
        assert!(!store.remove("kid"));
        assert!(matches!(store.verification_key("kid"), Err(AuthError::KeyNotFound(kid)) if kid == "kid"));
    }

    #[test]
    fn accepts_pkcs1_pem() {
        let pem = private_key()
            .to_pkcs1_pem(LineEnding::LF)
            .expect("pkcs1 pem");
        let store = KeyStore::new();
        store.insert_rsa_pem("legacy", &pem).expect("insert pkcs1");
        assert!(store.contains("legacy"));
    }

    #[test]
    fn rejects_garbage_pem() {
        let store = KeyStore::new();
        let err = store.insert_rsa_pem("bad", "not a key").expect_err("parse should fail");
        assert!(matches!(err, AuthError::KeyParse(kid, _) if kid == "bad"));
    }

    #[test]
    fn clones_share_keys() {
        let store = KeyStore::new();
        let clone = store.clone();
        clone.insert_rsa_pem("shared", &private_pem()).expect("insert");
        assert!(store.contains("shared"));
    }

    #[test]
    fn loads_pem_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("54bb2165-71e1-41a6-af3e-7da4a0e1e2c1.pem"), private_pem()).expect("write key");
        fs::write(dir.path().join("README.txt"), "not a key").expect("write readme");

        let store = KeyStore::from_pem_dir(dir.path()).expect("load dir");
        assert_eq!(store.len(), 1);
        assert!(store.contains("54bb2165-71e1-41a6-af3e-7da4a0e1e2c1"));
    }

    #[test]
    fn missing_directory_is_a_store_error() {
        let err = KeyStore::from_pem_dir("/definitely/not/here").err().expect("should fail");
        assert!(matches!(err, AuthError::KeyStore(_)));
    }
}
