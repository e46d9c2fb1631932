//! Shared-secret verification.
//!
//! Two static secrets guard the service: the API key in `X-API-Key` for
//! `/webhook` and `/transfer`, and the assistant's webhook secret in
//! `X-Vapi-Secret` for `/tool-call`. When either is unconfigured a
//! well-known development value is used; [`ApiKey::is_development`] lets
//! startup code warn about it.

use std::fmt;

use crate::error::{Result, RouterError};

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the voice assistant's webhook secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-vapi-secret";

/// Key used when none is configured. Never deploy with this.
pub const DEVELOPMENT_API_KEY: &str = "development-api-key-do-not-use-in-live";

/// Webhook secret used when none is configured. Never deploy with this.
pub const DEVELOPMENT_WEBHOOK_SECRET: &str = "development-webhook-secret-do-not-use-in-live";

/// Configured shared secret.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    secret: String,
    development: bool,
}

impl ApiKey {
    /// Wraps a configured secret.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        let development = secret == DEVELOPMENT_API_KEY || secret == DEVELOPMENT_WEBHOOK_SECRET;
        Self { secret, development }
    }

    /// Uses `configured` when present and non-blank, else the development key.
    pub fn from_config(configured: Option<&str>) -> Self {
        Self::configured_or(configured, DEVELOPMENT_API_KEY)
    }

    /// Same as [`ApiKey::from_config`] for the tool-call webhook secret.
    pub fn webhook_secret_from_config(configured: Option<&str>) -> Self {
        Self::configured_or(configured, DEVELOPMENT_WEBHOOK_SECRET)
    }

    fn configured_or(configured: Option<&str>, default: &str) -> Self {
        match configured.map(str::trim).filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret),
            None => Self::new(default),
        }
    }

    /// Whether the well-known development key is active.
    pub fn is_development(&self) -> bool {
        self.development
    }

    /// Checks a presented credential.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Unauthorized`] when `presented` is missing,
    /// empty, or differs from the secret.
    pub fn verify(&self, presented: Option<&str>) -> Result<()> {
        match presented {
            None | Some("") => Err(RouterError::Unauthorized { header_present: false }),
            Some(key) if timing_safe_eq(key, &self.secret) => Ok(()),
            Some(_) => Err(RouterError::Unauthorized { header_present: true }),
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("secret", &"***")
            .field("development", &self.development)
            .finish()
    }
}

/// Compares two strings without short-circuiting on the first mismatch.
fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.bytes().zip(b.bytes()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_key_verifies() {
        let key = ApiKey::new("secret123");
        assert!(key.verify(Some("secret123")).is_ok());
    }

    #[test]
    fn missing_and_empty_keys_are_rejected_as_missing() {
        let key = ApiKey::new("secret123");

        for presented in [None, Some("")] {
            let err = key.verify(presented).unwrap_err();
            assert!(matches!(err, RouterError::Unauthorized { header_present: false }));
        }
    }

    #[test]
    fn wrong_key_is_rejected_as_mismatch() {
        let key = ApiKey::new("secret123");

        for presented in ["secret124", "secret1234", "SECRET123", " secret123"] {
            let err = key.verify(Some(presented)).unwrap_err();
            assert!(matches!(err, RouterError::Unauthorized { header_present: true }));
        }
    }

    #[test]
    fn unset_key_falls_back_to_development_key() {
        assert!(ApiKey::from_config(None).is_development());
        assert!(ApiKey::from_config(Some("   ")).is_development());
        assert!(!ApiKey::from_config(Some("prod-key")).is_development());
        assert!(ApiKey::from_config(None).verify(Some(DEVELOPMENT_API_KEY)).is_ok());
    }

    #[test]
    fn unset_webhook_secret_falls_back_to_its_own_default() {
        let secret = ApiKey::webhook_secret_from_config(None);

        assert!(secret.is_development());
        assert!(secret.verify(Some(DEVELOPMENT_WEBHOOK_SECRET)).is_ok());
        assert!(secret.verify(Some(DEVELOPMENT_API_KEY)).is_err());
        assert!(!ApiKey::webhook_secret_from_config(Some("hook")).is_development());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", ApiKey::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn timing_safe_eq_cases() {
        assert!(timing_safe_eq("hello", "hello"));
        assert!(!timing_safe_eq("hello", "world"));
        assert!(!timing_safe_eq("hello", "hello_world"));
    }
}
