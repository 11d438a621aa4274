//! Port for bearer token verification.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by token verifier adapters.
    pub enum TokenVerifierError {
        /// The presented token does not match any accepted credential.
        Rejected { message: String } =>
            "bearer token rejected: {message}",
        /// The verifier could not reach its credential source.
        Unavailable { message: String } =>
            "token verifier unavailable: {message}",
    }
}

/// Port for checking bearer tokens presented by clients.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Accepts the token or explains why it was turned away.
    async fn verify(&self, token: &str) -> Result<(), TokenVerifierError>;
}

/// Verifier backed by a single pre-shared secret.
#[derive(Debug, Clone)]
pub struct StaticTokenVerifier {
    secret: String,
}

impl StaticTokenVerifier {
    /// Builds a verifier accepting exactly `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<(), TokenVerifierError> {
        if token == self.secret {
            Ok(())
        } else {
            Err(TokenVerifierError::rejected("unknown token"))
        }
    }
}

/// Fixture verifier accepting every token.
///
/// Use it in tests where authentication is not under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTokenVerifier;

#[async_trait]
impl TokenVerifier for FixtureTokenVerifier {
    async fn verify(&self, _token: &str) -> Result<(), TokenVerifierError> {
        Ok(())
    }
}
