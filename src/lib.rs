//! fbauto - Facebook group job-posting automation
//!
//! A session-continuity and scheduling service for posting job listings to
//! Facebook groups and tracking candidate engagement. The crate keeps one
//! long-lived authenticated browser session alive against bot detection and
//! verification challenges, and drives posting/monitoring work over it on a
//! fixed cadence.
//!
//! # Architecture
//!
//! The project consists of two main operation modes:
//! - **HTTP Server Mode**: an always-running service exposing automation
//!   status/toggles and the Messenger webhook relay
//! - **Script Mode**: a command-line tool for a one-shot login check that
//!   warms the cookie jar
//!
//! Core pipeline: scheduler tick → [`LoginOrchestrator::ensure_logged_in`] →
//! (cookie jar load → session validation) → fresh login → challenge
//! handling → posting/monitoring over the authenticated session.
//!
//! # Usage
//!
//! ## HTTP Server Mode
//!
//! ```bash
//! fbauto-server --port 4117 --host 0.0.0.0
//! ```
//!
//! ## Script Mode
//!
//! ```bash
//! fbauto-login --email recruiting@example.com
//! ```

pub mod api;
pub mod auth;
pub mod browser;
pub mod config;
pub mod error;
pub mod relay;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod types;
pub mod utils;

pub use config::Settings;
pub use error::{Error, Result};
pub use scheduler::AutomationScheduler;
pub use session::{ChallengeHandler, CookieStore, LoginOrchestrator};
pub use types::{Cookie, Credentials, PostStatus, RunStats};
