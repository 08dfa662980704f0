//! Bearer tokens
//!
//! Signed tokens carrying {subject, email, purpose}, validated by
//! signature. Automation contexts run with long-lived tokens; the TTL is
//! configuration.

use crate::config::settings::AuthSettings;
use crate::{Error, Result};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims carried by an automation token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject identifier
    pub sub: String,
    /// Account email
    pub email: String,
    /// What the token was issued for, e.g. `automation`
    pub purpose: String,
    /// Issuer
    pub iss: String,
    /// Issued-at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Token service: issues and verifies automation bearer tokens
#[derive(Clone)]
pub struct AccessTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_hours: i64,
    enforced: bool,
}

impl AccessTokens {
    /// Create a token service from auth settings
    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            issuer: settings.issuer.clone(),
            ttl_hours: settings.ttl_hours,
            enforced: settings.require_token,
        }
    }

    /// Whether mutating endpoints require a valid token
    pub fn enforced(&self) -> bool {
        self.enforced
    }

    /// Issue a token for a subject
    pub fn issue(
        &self,
        subject_id: impl Into<String>,
        email: impl Into<String>,
        purpose: impl Into<String>,
    ) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(self.ttl_hours);

        let claims = Claims {
            sub: subject_id.into(),
            email: email.into(),
            purpose: purpose.into(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| Error::auth(format!("token signing failed: {}", e)))
    }

    /// Verify a token's signature, expiry and issuer
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::auth(format!("token rejected: {}", e)))
    }

    /// Authorize a request from its `Authorization: Bearer` header.
    ///
    /// Returns `Ok(None)` when enforcement is off.
    pub fn authorize(&self, authorization: Option<&str>) -> Result<Option<Claims>> {
        if !self.enforced {
            return Ok(None);
        }

        let header = authorization.ok_or_else(|| Error::auth("missing bearer token"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::auth("malformed authorization header"))?;

        self.verify(token).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(require_token: bool) -> AccessTokens {
        let mut settings = AuthSettings::default();
        settings.secret = "test_secret_key".to_string();
        settings.require_token = require_token;
        AccessTokens::from_settings(&settings)
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service(true);
        let token = tokens.issue("acct_1", "ops@example.com", "automation").unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "acct_1");
        assert_eq!(claims.email, "ops@example.com");
        assert_eq!(claims.purpose, "automation");
        assert_eq!(claims.iss, "fbauto");
    }

    #[test]
    fn test_invalid_token_rejected() {
        let tokens = service(true);
        assert!(tokens.verify("not_a_token").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let tokens = service(true);
        let mut other_settings = AuthSettings::default();
        other_settings.secret = "different_secret".to_string();
        let other = AccessTokens::from_settings(&other_settings);

        let token = tokens.issue("acct_1", "ops@example.com", "automation").unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_authorize_disabled_passes_without_header() {
        let tokens = service(false);
        assert!(tokens.authorize(None).unwrap().is_none());
    }

    #[test]
    fn test_authorize_enforced_requires_header() {
        let tokens = service(true);
        assert!(tokens.authorize(None).is_err());
        assert!(tokens.authorize(Some("Token abc")).is_err());

        let token = tokens.issue("acct_1", "ops@example.com", "automation").unwrap();
        let header = format!("Bearer {}", token);
        let claims = tokens.authorize(Some(&header)).unwrap().unwrap();
        assert_eq!(claims.sub, "acct_1");
    }

    #[test]
    fn test_ttl_applied() {
        let tokens = service(true);
        let token = tokens.issue("acct_1", "ops@example.com", "automation").unwrap();
        let claims = tokens.verify(&token).unwrap();

        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, 30 * 24 * 3600);
    }
}
