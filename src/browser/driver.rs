//! Browser session trait
//!
//! The seam between the login/challenge state machines and the concrete
//! browser. Everything the session layer needs from a live page goes
//! through here; tests substitute a scriptable in-memory implementation.

use crate::Result;
use crate::types::Cookie;
use async_trait::async_trait;
use std::time::Duration;

/// One driven browser page plus its cookie context
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to a URL and wait for the document to load
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Best-effort wait for the network to settle after a navigation
    async fn wait_until_idle(&self, timeout: Duration) -> Result<()>;

    /// URL the page currently shows
    async fn current_url(&self) -> Result<String>;

    /// Rendered page content (outer HTML)
    async fn content(&self) -> Result<String>;

    /// Execute a JS expression and return its JSON value
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Cookies visible to the session context
    async fn cookies(&self) -> Result<Vec<Cookie>>;

    /// Install cookies into the session context
    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<()>;

    /// Remove all cookies from the session context
    async fn clear_cookies(&self) -> Result<()>;

    /// Register a script that runs in every new document before page code
    async fn add_init_script(&self, script: &str) -> Result<()>;

    /// Type text into a form field by selector
    async fn input_text(&self, selector: &str, text: &str) -> Result<()>;

    /// Click an element by selector
    async fn click_element(&self, selector: &str) -> Result<()>;

    /// Wait for an element to become visible; Err on timeout
    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Press Enter in the focused element
    async fn press_enter(&self) -> Result<()>;
}

/// Evaluate a boolean JS expression, mapping any failure to `false`.
///
/// Validation paths fail closed: a broken evaluation must read as "not
/// logged in", never abort the caller.
pub async fn evaluate_bool(session: &dyn BrowserSession, script: &str) -> bool {
    match session.evaluate(script).await {
        Ok(value) => value.as_bool().unwrap_or(false),
        Err(_) => false,
    }
}

/// Probe whether an element is visible within a short budget
pub async fn probe_visible(
    session: &dyn BrowserSession,
    selector: &str,
    timeout: Duration,
) -> bool {
    session.wait_visible(selector, timeout).await.is_ok()
}
