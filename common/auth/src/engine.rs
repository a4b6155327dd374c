use std::str::FromStr;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde_json::{Map, Value};
use tracing::debug;

use crate::claims::{Claims, ClaimsRepr};
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::keystore::KeyLookup;

/// Issues and validates signed bearer tokens.
///
/// The engine signs with one active kid and verifies with whatever kid a token
/// declares, as long as the [`KeyLookup`] still serves it. The algorithm is
/// fixed at construction; tokens declaring any other algorithm are rejected
/// before their signature is looked at.
///
/// Engines are immutable. Share one as `Arc<AuthEngine>` and swap the `Arc`
/// to change the active kid.
pub struct AuthEngine {
    active_kid: String,
    key_lookup: Arc<dyn KeyLookup>,
    algorithm: Algorithm,
    validation: Validation,
}

impl AuthEngine {
    /// RS256 engine with default validation settings.
    pub fn new(active_kid: impl Into<String>, key_lookup: impl KeyLookup + 'static) -> AuthResult<Self> {
        Self::with_config(active_kid, key_lookup, Algorithm::RS256, JwtConfig::default())
    }

    pub fn with_config(
        active_kid: impl Into<String>,
        key_lookup: impl KeyLookup + 'static,
        algorithm: Algorithm,
        config: JwtConfig,
    ) -> AuthResult<Self> {
        if !is_rsa(algorithm) {
            return Err(AuthError::UnsupportedAlgorithm(alg_name(algorithm)));
        }

        let active_kid = active_kid.into();
        key_lookup.signing_key(&active_kid)?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = config.leeway_seconds.into();
        validation.validate_aud = false;
        if let Some(issuer) = &config.expected_issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            active_kid,
            key_lookup: Arc::new(key_lookup),
            algorithm,
            validation,
        })
    }

    pub fn active_kid(&self) -> &str {
        &self.active_kid
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Signs `claims` with the active key.
    pub fn generate_token(&self, claims: &Claims) -> AuthResult<String> {
        claims.check_invariants()?;

        let key = self
            .key_lookup
            .signing_key(&self.active_kid)
            .map_err(|err| AuthError::Signing(format!("kid lookup failed: {err}")))?;

        let mut header = Header::new(self.algorithm);
        header.kid = Some(self.active_kid.clone());

        encode(&header, &claims.as_wire(), &key).map_err(|err| AuthError::Signing(err.to_string()))
    }

    /// Rebuilds the claims a token was generated from, after checking its
    /// header, signature and expiry.
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        let header = RawHeader::parse(token)?;
        let kid = header.kid()?;
        self.check_algorithm(&header)?;

        let key = self.key_lookup.verification_key(kid)?;
        let token_data = decode::<ClaimsRepr>(token, &key, &self.validation)?;
        let claims = Claims::try_from(token_data.claims)?;
        debug!(kid, subject = %claims.subject, "validated token");
        Ok(claims)
    }

    fn check_algorithm(&self, header: &RawHeader) -> AuthResult<()> {
        let declared = match header.fields.get("alg") {
            Some(Value::String(alg)) => alg,
            _ => return Err(AuthError::MalformedToken("missing algorithm (alg) in token header".into())),
        };
        let algorithm = Algorithm::from_str(declared)
            .map_err(|_| AuthError::UnsupportedAlgorithm(declared.clone()))?;
        if algorithm != self.algorithm {
            return Err(AuthError::AlgorithmMismatch {
                expected: alg_name(self.algorithm),
                found: declared.clone(),
            });
        }
        Ok(())
    }
}

/// Untyped view of a token header. Kept as JSON so a non-string kid can be
/// told apart from a missing one.
struct RawHeader {
    fields: Map<String, Value>,
}

impl RawHeader {
    fn parse(token: &str) -> AuthResult<Self> {
        let mut segments = token.split('.');
        let (Some(header), Some(_), Some(_), None) =
            (segments.next(), segments.next(), segments.next(), segments.next())
        else {
            return Err(AuthError::MalformedToken("token must have three segments".into()));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|err| AuthError::MalformedToken(format!("header encoding: {err}")))?;
        let fields = serde_json::from_slice(&bytes)
            .map_err(|err| AuthError::MalformedToken(format!("header json: {err}")))?;
        Ok(Self { fields })
    }

    fn kid(&self) -> AuthResult<&str> {
        match self.fields.get("kid") {
            None => Err(AuthError::MissingKeyId),
            Some(Value::String(kid)) => Ok(kid),
            Some(_) => Err(AuthError::MalformedKeyId),
        }
    }
}

fn is_rsa(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

fn alg_name(algorithm: Algorithm) -> String {
    format!("{algorithm:?}")
}
