//! Cookie jar record types
//!
//! Defines the durable cookie record written to per-account jar files and
//! the credential set supplied through configuration.

use serde::{Deserialize, Serialize};

/// Legal same-site policies a browser will accept
pub const LEGAL_SAME_SITE: [&str; 3] = ["Strict", "Lax", "None"];

/// Same-site policy for a cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    /// Sent only in first-party contexts
    Strict,
    /// Sent on top-level navigations
    Lax,
    /// Sent in all contexts
    None,
}

impl SameSite {
    /// Parse a raw policy string, coercing anything outside the three
    /// legal values to the most permissive one.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Strict" => Self::Strict,
            "Lax" => Self::Lax,
            _ => Self::None,
        }
    }

    /// Policy string as the browser expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// One cookie record as persisted in the per-account jar file.
///
/// The jar format is a JSON array of these records. It has no external
/// consumer; it only needs to round-trip through [`crate::CookieStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Cookie domain (host or domain pattern such as `.facebook.com`)
    pub domain: String,
    /// Cookie path
    #[serde(default = "default_path")]
    pub path: String,
    /// Expiry as unix seconds; `None` marks a session cookie
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    /// Raw same-site policy as read from the browser
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    /// Secure flag
    #[serde(default)]
    pub secure: bool,
    /// HttpOnly flag
    #[serde(default)]
    pub http_only: bool,
}

fn default_path() -> String {
    "/".to_string()
}

impl Cookie {
    /// Create a new cookie with the given name, value and domain
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
            expires: None,
            same_site: None,
            secure: true,
            http_only: false,
        }
    }

    /// Set the expiry timestamp (unix seconds)
    pub fn with_expires(mut self, expires: f64) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Set the raw same-site policy
    pub fn with_same_site(mut self, same_site: impl Into<String>) -> Self {
        self.same_site = Some(same_site.into());
        self
    }

    /// Whether the cookie is expired at `now` (unix seconds).
    ///
    /// Session cookies (no expiry) never count as expired.
    pub fn is_expired(&self, now: f64) -> bool {
        match self.expires {
            Some(expires) => expires <= now,
            None => false,
        }
    }

    /// Whether the cookie belongs to the given target domain
    pub fn matches_domain(&self, domain: &str) -> bool {
        self.domain.contains(domain)
    }

    /// Coerce the same-site policy to one of the three legal values.
    ///
    /// Browsers reject jars with values outside {Strict, Lax, None}; an
    /// unknown policy is replaced with the most permissive legal value so
    /// the rest of the jar still applies.
    pub fn normalized(mut self) -> Self {
        if let Some(raw) = self.same_site.take() {
            let legal = if LEGAL_SAME_SITE.contains(&raw.as_str()) {
                raw
            } else {
                SameSite::from_raw(&raw).as_str().to_string()
            };
            self.same_site = Some(legal);
        }
        self
    }

    /// Same-site policy as an enum, applying the coercion rule
    pub fn same_site_policy(&self) -> Option<SameSite> {
        self.same_site.as_deref().map(SameSite::from_raw)
    }
}

/// Session credential set for one account.
///
/// Supplied externally through configuration; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account identifier used to key the cookie jar
    pub account_id: String,
    /// Login email address
    pub email: String,
    /// Login secret
    pub password: String,
}

impl Credentials {
    /// Create a new credential set
    pub fn new(
        account_id: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_never_expires() {
        let cookie = Cookie::new("c_user", "12345", ".facebook.com");
        assert!(!cookie.is_expired(f64::MAX));
    }

    #[test]
    fn test_expired_cookie() {
        let cookie = Cookie::new("xs", "secret", ".facebook.com").with_expires(100.0);
        assert!(cookie.is_expired(100.0));
        assert!(cookie.is_expired(101.0));
        assert!(!cookie.is_expired(99.0));
    }

    #[rstest::rstest]
    #[case("Strict", "Strict")]
    #[case("Lax", "Lax")]
    #[case("None", "None")]
    #[case("unspecified", "None")]
    #[case("no_restriction", "None")]
    #[case("lax", "None")]
    fn test_same_site_coercion(#[case] raw: &str, #[case] expected: &str) {
        let cookie = Cookie::new("fr", "abc", ".facebook.com")
            .with_same_site(raw)
            .normalized();
        assert_eq!(cookie.same_site.as_deref(), Some(expected));
    }

    #[test]
    fn test_missing_same_site_stays_absent() {
        let cookie = Cookie::new("fr", "abc", ".facebook.com").normalized();
        assert!(cookie.same_site.is_none());
    }

    #[test]
    fn test_domain_match() {
        let cookie = Cookie::new("c_user", "12345", ".facebook.com");
        assert!(cookie.matches_domain("facebook.com"));
        assert!(!cookie.matches_domain("example.com"));
    }

    #[test]
    fn test_jar_round_trip() {
        let jar = vec![
            Cookie::new("c_user", "12345", ".facebook.com").with_expires(2_000_000_000.0),
            Cookie::new("xs", "secret", ".facebook.com").with_same_site("Lax"),
        ];

        let json = serde_json::to_string_pretty(&jar).unwrap();
        let parsed: Vec<Cookie> = serde_json::from_str(&json).unwrap();
        assert_eq!(jar, parsed);
    }
}
