//! Configuration settings structure
//!
//! Defines the main settings structure and loading logic for the
//! automation service.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration settings for the automation service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP server configuration
    pub server: ServerSettings,
    /// Automation account credentials
    pub account: AccountSettings,
    /// Browser driver configuration
    pub browser: BrowserSettings,
    /// Session continuity configuration
    pub session: SessionSettings,
    /// Challenge handling configuration
    pub challenge: ChallengeSettings,
    /// Scheduler configuration
    pub scheduler: SchedulerSettings,
    /// Job API collaborator configuration
    pub api: ApiSettings,
    /// Messenger webhook relay configuration
    pub relay: RelaySettings,
    /// Bearer token configuration
    pub auth: AuthSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Request timeout duration
    pub timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "::".to_string(),
            port: 4117,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Credentials for the automation account.
///
/// Supplied via config file or `FBAUTO_ACCOUNT_*` environment variables;
/// never persisted by the crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    /// Account identifier used to key the cookie jar (defaults to the email)
    pub account_id: String,
    /// Login email address
    pub email: String,
    /// Login secret
    pub password: String,
}

impl AccountSettings {
    /// Jar key for this account: explicit id when set, email otherwise
    pub fn jar_key(&self) -> &str {
        if self.account_id.is_empty() {
            &self.email
        } else {
            &self.account_id
        }
    }
}

/// Browser driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run Chromium without a visible window
    pub headless: bool,
    /// User agent pinned by the stealth init script
    pub user_agent: String,
    /// Platform pinned by the stealth init script
    pub platform: String,
    /// Production mode: conservative navigation waits tolerant of
    /// network-idle timeouts
    pub production: bool,
    /// Navigation timeout
    pub nav_timeout: Duration,
    /// Network-idle wait budget after navigation
    pub idle_timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) \
                         AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 \
                         Mobile/15E148 Safari/604.1"
                .to_string(),
            platform: "iPhone".to_string(),
            production: false,
            nav_timeout: Duration::from_secs(45),
            idle_timeout: Duration::from_secs(30),
        }
    }
}

/// One DOM login indicator: a named boolean JS expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSetting {
    /// Short label used in logs
    pub name: String,
    /// Boolean JS expression evaluated in the page
    pub script: String,
}

/// Session continuity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Directory holding one cookie jar file per account
    pub cookies_dir: PathBuf,
    /// Domain the jar is filtered to
    pub target_domain: String,
    /// Cookie names that must all carry non-empty values for a session
    /// to count as present
    pub required_cookies: Vec<String>,
    /// Minimum count of positive DOM indicators for a logged-in verdict
    pub quorum_threshold: usize,
    /// DOM indicator overrides; empty uses the built-in set
    pub indicators: Vec<IndicatorSetting>,
    /// Authenticated landing page
    pub home_url: String,
    /// Mobile variant of the landing page
    pub mobile_home_url: String,
    /// Desktop login page
    pub login_url: String,
    /// Mobile-optimized login page, preferred as the lower-friction path
    pub mobile_login_url: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookies_dir: PathBuf::from("cookies"),
            target_domain: "facebook.com".to_string(),
            required_cookies: vec!["c_user".to_string(), "xs".to_string()],
            quorum_threshold: 3,
            indicators: Vec::new(),
            home_url: "https://www.facebook.com/".to_string(),
            mobile_home_url: "https://m.facebook.com/".to_string(),
            login_url: "https://www.facebook.com/login".to_string(),
            mobile_login_url: "https://m.facebook.com/login/".to_string(),
        }
    }
}

/// Challenge handling configuration.
///
/// The manual-wait constants are deliberately tunable; the bound is the
/// contract, not any particular value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeSettings {
    /// Maximum manual-wait poll attempts
    pub manual_wait_attempts: u32,
    /// Pause between manual-wait polls
    pub manual_wait_interval: Duration,
    /// Emit a progress log every N manual-wait attempts
    pub progress_log_every: u32,
    /// How long a second run waits on an in-flight challenge before
    /// proceeding independently
    pub guard_wait: Duration,
    /// Page-content substrings that mark a verification challenge
    pub markers: Vec<String>,
}

impl Default for ChallengeSettings {
    fn default() -> Self {
        Self {
            manual_wait_attempts: 30,
            manual_wait_interval: Duration::from_secs(10),
            progress_log_every: 6,
            guard_wait: Duration::from_secs(120),
            markers: vec!["checkpoint".to_string(), "two_factor".to_string()],
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Pause between automation passes
    pub interval: Duration,
    /// Delay before the first pass after start-up
    pub initial_delay: Duration,
    /// Whether auto-scheduling starts enabled
    pub auto_start: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            initial_delay: Duration::from_secs(30),
            auto_start: true,
        }
    }
}

/// Job API collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the job/candidate REST API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Messenger webhook relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Workflow-engine URL the decoded payloads are forwarded to
    pub forward_url: String,
    /// Shared token answered on inbound GET verification
    pub verify_token: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            forward_url: String::new(),
            verify_token: String::new(),
        }
    }
}

/// Bearer token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC signing secret
    pub secret: String,
    /// Token issuer
    pub issuer: String,
    /// Token lifetime in hours; automation contexts run long-lived tokens
    pub ttl_hours: i64,
    /// Require a valid bearer token on mutating automation endpoints
    pub require_token: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "fbauto".to_string(),
            ttl_hours: 24 * 30,
            require_token: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level
    pub level: String,
    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            verbose: false,
        }
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| crate::Error::config(format!("Invalid config file: {}", e)))
    }

    /// Load settings from environment variables only
    pub fn from_env() -> crate::Result<Self> {
        Self::default().merge_with_env()
    }

    /// Overlay `FBAUTO_*` environment variables onto these settings
    pub fn merge_with_env(mut self) -> crate::Result<Self> {
        if let Ok(host) = std::env::var("FBAUTO_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("FBAUTO_SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| crate::Error::config(format!("Invalid port: {}", e)))?;
        }

        if let Ok(account_id) = std::env::var("FBAUTO_ACCOUNT_ID") {
            self.account.account_id = account_id;
        }
        if let Ok(email) = std::env::var("FBAUTO_ACCOUNT_EMAIL") {
            self.account.email = email;
        }
        if let Ok(password) = std::env::var("FBAUTO_ACCOUNT_PASSWORD") {
            self.account.password = password;
        }

        if let Ok(headless) = std::env::var("FBAUTO_HEADLESS") {
            self.browser.headless = headless != "false";
        }
        if let Ok(production) = std::env::var("FBAUTO_PRODUCTION") {
            self.browser.production = production == "true";
        }

        if let Ok(dir) = std::env::var("FBAUTO_COOKIES_DIR") {
            self.session.cookies_dir = PathBuf::from(dir);
        }

        if let Ok(interval) = std::env::var("FBAUTO_SCHEDULER_INTERVAL") {
            let secs: u64 = interval
                .parse()
                .map_err(|e| crate::Error::config(format!("Invalid interval: {}", e)))?;
            self.scheduler.interval = Duration::from_secs(secs);
        }

        if let Ok(base_url) = std::env::var("FBAUTO_API_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Ok(forward_url) = std::env::var("FBAUTO_RELAY_FORWARD_URL") {
            self.relay.forward_url = forward_url;
        }
        if let Ok(verify_token) = std::env::var("FBAUTO_VERIFY_TOKEN") {
            self.relay.verify_token = verify_token;
        }
        if let Ok(secret) = std::env::var("FBAUTO_AUTH_SECRET") {
            self.auth.secret = secret;
        }

        Ok(self)
    }

    /// Validate the final configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.session.quorum_threshold == 0 {
            return Err(crate::Error::config(
                "session.quorum_threshold must be at least 1",
            ));
        }
        if !self.session.indicators.is_empty()
            && self.session.quorum_threshold > self.session.indicators.len()
        {
            return Err(crate::Error::config(
                "session.quorum_threshold exceeds the configured indicator count",
            ));
        }
        if self.session.required_cookies.is_empty() {
            return Err(crate::Error::config(
                "session.required_cookies must not be empty",
            ));
        }
        if self.challenge.manual_wait_attempts == 0 {
            return Err(crate::Error::config(
                "challenge.manual_wait_attempts must be at least 1",
            ));
        }
        if self.scheduler.interval.is_zero() {
            return Err(crate::Error::config("scheduler.interval must be non-zero"));
        }
        if self.auth.require_token && self.auth.secret.is_empty() {
            return Err(crate::Error::config(
                "auth.secret is required when auth.require_token is set",
            ));
        }

        if !self.api.base_url.is_empty() {
            url::Url::parse(&self.api.base_url)
                .map_err(|e| crate::Error::config(format!("Invalid api.base_url: {}", e)))?;
        }

        Ok(())
    }

    /// Credentials for the configured automation account
    pub fn credentials(&self) -> crate::types::Credentials {
        crate::types::Credentials::new(
            self.account.jar_key(),
            &self.account.email,
            &self.account.password,
        )
    }
}
