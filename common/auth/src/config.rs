/// Runtime configuration for token validation.
#[derive(Debug, Clone, Default)]
pub struct JwtConfig {
    /// When set, tokens must carry this issuer (iss).
    pub expected_issuer: Option<String>,
    /// Allowable clock skew in seconds when validating exp.
    pub leeway_seconds: u32,
}

impl JwtConfig {
    /// No issuer check and no leeway.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.expected_issuer = Some(issuer.into());
        self
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }
}
