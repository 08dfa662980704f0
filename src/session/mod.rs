//! Session continuity
//!
//! This module keeps one authenticated browser session alive: the durable
//! cookie jar, the validity checks run against a live context, the
//! verification-challenge state machine and the login orchestration that
//! composes them into a single idempotent "ensure logged in" operation.
//!
//! ## Architecture
//!
//! ```text
//! LoginOrchestrator::ensure_logged_in
//!   ├─ CookieStore::load          cookie fast path
//!   ├─ QuorumCheck / has_session  validity verdicts (never cached)
//!   ├─ fresh login                mobile-first form submission
//!   └─ ChallengeHandler::resolve  checkpoint/2FA bypass + manual wait
//! ```
//!
//! Validity is always computed fresh: a verdict is derived from the live
//! cookies and DOM, used once, and discarded.

pub mod challenge;
pub mod login;
pub mod store;
pub mod validator;

pub use challenge::{ChallengeGuard, ChallengeHandler, ChallengeState};
pub use login::LoginOrchestrator;
pub use store::CookieStore;
pub use validator::{DomIndicator, QuorumCheck, has_session};
