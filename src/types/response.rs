//! Response type definitions
//!
//! Defines the structures returned by the HTTP surface and the one-shot
//! login binary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ping response for health checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    /// Server uptime in seconds
    pub server_uptime: u64,

    /// Server version
    pub version: String,
}

impl PingResponse {
    /// Create a new ping response
    pub fn new(server_uptime: u64, version: impl Into<String>) -> Self {
        Self {
            server_uptime,
            version: version.into(),
        }
    }
}

/// Automation scheduler status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Whether the recurring timer is installed
    pub scheduled: bool,
    /// Whether a pass is executing right now
    pub running: bool,
    /// Whether auto-scheduling is administratively enabled
    pub enabled: bool,
    /// When the last pass started, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tick: Option<DateTime<Utc>>,
}

/// Verdict emitted by the one-shot login binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginVerdict {
    /// Account the check ran for
    #[serde(rename = "accountId")]
    pub account_id: String,
    /// Whether an authenticated session was established
    #[serde(rename = "loggedIn")]
    pub logged_in: bool,
    /// When the check completed
    #[serde(rename = "checkedAt")]
    pub checked_at: DateTime<Utc>,
}

impl LoginVerdict {
    /// Create a new login verdict stamped with the current time
    pub fn new(account_id: impl Into<String>, logged_in: bool) -> Self {
        Self {
            account_id: account_id.into(),
            logged_in,
            checked_at: Utc::now(),
        }
    }
}

/// Error response for API errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_response_creation() {
        let response = PingResponse::new(42, "0.3.1");
        assert_eq!(response.server_uptime, 42);
        assert_eq!(response.version, "0.3.1");
    }

    #[test]
    fn test_status_response_serialization() {
        let status = StatusResponse {
            scheduled: true,
            running: false,
            enabled: true,
            last_tick: None,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"scheduled\":true"));
        assert!(!json.contains("last_tick"));
    }

    #[test]
    fn test_login_verdict_serialization() {
        let verdict = LoginVerdict::new("acct_1", true);
        let json = serde_json::to_string(&verdict).unwrap();
        assert!(json.contains("accountId"));
        assert!(json.contains("loggedIn"));
        assert!(json.contains("checkedAt"));
    }

    #[test]
    fn test_error_response() {
        let response = ErrorResponse::new("boom");
        assert_eq!(response.error, "boom");
    }
}
