//! Cookie jar persistence
//!
//! One JSON jar file per account, read and written wholesale. Loading is
//! fail-soft: a missing, unreadable or fully expired jar downgrades the
//! caller to the fresh-login path instead of aborting it.

use crate::Result;
use crate::browser::BrowserSession;
use crate::config::settings::SessionSettings;
use crate::types::Cookie;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Durable cookie jar storage, keyed by account identifier
#[derive(Debug, Clone)]
pub struct CookieStore {
    dir: PathBuf,
    domain: String,
}

impl CookieStore {
    /// Create a store rooted at `dir`, filtered to `domain`
    pub fn new(dir: impl Into<PathBuf>, domain: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            domain: domain.into(),
        }
    }

    /// Create a store from session settings
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(&settings.cookies_dir, &settings.target_domain)
    }

    /// Jar file path for an account
    pub fn jar_path(&self, account_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_account_id(account_id)))
    }

    /// Persist the session's cookies for `account_id`.
    ///
    /// Reads all cookies from the live context, filters to the target
    /// domain and writes the jar wholesale. When zero relevant cookies are
    /// present the jar on disk is left untouched — an empty read during a
    /// failed navigation must not corrupt a previously good jar.
    ///
    /// Returns the number of cookies written (0 means the jar was kept).
    pub async fn save(&self, session: &dyn BrowserSession, account_id: &str) -> Result<usize> {
        let cookies = session.cookies().await?;
        let relevant: Vec<Cookie> = cookies
            .into_iter()
            .filter(|c| c.matches_domain(&self.domain))
            .collect();

        if relevant.is_empty() {
            tracing::debug!("No {} cookies in context, keeping stored jar", self.domain);
            return Ok(0);
        }

        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(&relevant)?;
        std::fs::write(self.jar_path(account_id), json)?;

        tracing::info!("Saved {} cookies for {}", relevant.len(), account_id);
        Ok(relevant.len())
    }

    /// Load the stored jar for `account_id` into the session context.
    ///
    /// Returns `true` only when at least one non-expired cookie was
    /// installed. Every failure mode — absent file, unreadable JSON, a jar
    /// with nothing left after expiry filtering, a driver error while
    /// installing — logs and returns `false` without touching the context.
    pub async fn load(&self, session: &dyn BrowserSession, account_id: &str) -> bool {
        let path = self.jar_path(account_id);
        let Some(valid) = read_valid_jar(&path, now_unix()) else {
            return false;
        };

        let normalized: Vec<Cookie> = valid.into_iter().map(Cookie::normalized).collect();
        match session.set_cookies(&normalized).await {
            Ok(()) => {
                tracing::info!("Applied {} valid cookies for {}", normalized.len(), account_id);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to install stored cookies: {}", e);
                false
            }
        }
    }

    /// Whether a jar file exists for the account (expiry not considered)
    pub fn has_jar(&self, account_id: &str) -> bool {
        self.jar_path(account_id).exists()
    }
}

/// Read a jar file and filter it to non-expired entries.
///
/// `None` covers every soft failure: missing file, bad JSON, empty jar.
fn read_valid_jar(path: &Path, now: f64) -> Option<Vec<Cookie>> {
    if !path.exists() {
        return None;
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to read cookie jar {:?}: {}", path, e);
            return None;
        }
    };

    let cookies: Vec<Cookie> = match serde_json::from_str(&content) {
        Ok(cookies) => cookies,
        Err(e) => {
            tracing::warn!("Cookie jar {:?} is not valid JSON: {}", path, e);
            return None;
        }
    };

    let valid: Vec<Cookie> = cookies.into_iter().filter(|c| !c.is_expired(now)).collect();
    if valid.is_empty() {
        tracing::debug!("Cookie jar {:?} has no non-expired entries", path);
        return None;
    }

    Some(valid)
}

/// Filesystem-safe encoding of an account identifier
fn encode_account_id(account_id: &str) -> String {
    account_id.replace(['@', '.'], "_")
}

fn now_unix() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_encoding() {
        assert_eq!(
            encode_account_id("recruiting@example.com"),
            "recruiting_example_com"
        );
        assert_eq!(encode_account_id("plain"), "plain");
    }

    #[test]
    fn test_jar_path_is_per_account() {
        let store = CookieStore::new("/tmp/jars", "facebook.com");
        let a = store.jar_path("a@x.com");
        let b = store.jar_path("b@x.com");
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with("a_x_com.json"));
    }

    #[test]
    fn test_read_missing_jar() {
        assert!(read_valid_jar(Path::new("/nonexistent/jar.json"), 0.0).is_none());
    }

    #[test]
    fn test_read_corrupt_jar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jar.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(read_valid_jar(&path, 0.0).is_none());
    }

    #[test]
    fn test_read_fully_expired_jar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jar.json");
        let jar = vec![Cookie::new("xs", "old", ".facebook.com").with_expires(100.0)];
        std::fs::write(&path, serde_json::to_string(&jar).unwrap()).unwrap();

        assert!(read_valid_jar(&path, 200.0).is_none());
    }

    #[test]
    fn test_read_filters_expired_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jar.json");
        let jar = vec![
            Cookie::new("xs", "old", ".facebook.com").with_expires(100.0),
            Cookie::new("c_user", "12345", ".facebook.com").with_expires(300.0),
            Cookie::new("fr", "sess", ".facebook.com"),
        ];
        std::fs::write(&path, serde_json::to_string(&jar).unwrap()).unwrap();

        let valid = read_valid_jar(&path, 200.0).unwrap();
        assert_eq!(valid.len(), 2);
        assert!(valid.iter().all(|c| c.name != "xs"));
    }
}
