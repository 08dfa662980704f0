//! Verification challenge handling
//!
//! When a login lands on a checkpoint/two-factor page, a fixed sequence of
//! bypass strategies runs against it, ending in a bounded wait for a human
//! to finish the verification in the browser window. Every strategy is
//! best-effort: a failing one logs and falls through to the next, and the
//! handler as a whole returns a verdict instead of raising.

use crate::browser::driver::{BrowserSession, probe_visible};
use crate::config::settings::{ChallengeSettings, SessionSettings};
use crate::session::validator::{QuorumCheck, has_session};
use crate::utils::human_pause;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// "Remember this browser" affordances, checked to reduce challenge
/// recurrence
pub const TRUST_DEVICE_SELECTORS: [&str; 4] = [
    r#"input[name="remember_browser"]"#,
    r#"input[type="checkbox"][value="1"]"#,
    r#"label[for="remember_browser"]"#,
    r#"[data-testid="save_device_checkbox"]"#,
];

/// Continue/Skip/Not-now affordances, in priority order
pub const DISMISS_SELECTORS: [&str; 9] = [
    r#"button[name="__CONFIRM__"]"#,
    "#checkpointSubmitButton",
    r#"[data-testid="sec_ac_button"]"#,
    r#"[role="button"][aria-label="Continue"]"#,
    r#"[role="button"][aria-label="Skip"]"#,
    r#"[role="button"][aria-label="Not now"]"#,
    r#"button[value="submit"]"#,
    r#"input[type="submit"]"#,
    r#"button[type="submit"]"#,
];

/// "Try another way" affordances
pub const ALTERNATE_SELECTORS: [&str; 3] = [
    r#"a[href*="checkpoint/alternate"]"#,
    r#"[data-testid="try_another_way"]"#,
    r#"[role="button"][aria-label*="another"]"#,
];

/// Inputs that look like a verification-code field
pub const CODE_INPUT_SELECTORS: [&str; 4] = [
    r#"input[name="approvals_code"]"#,
    r#"input[autocomplete="one-time-code"]"#,
    r#"input[inputmode="numeric"]"#,
    "#approvals_code",
];

/// States of the challenge bypass sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeState {
    /// Enable a "remember this browser" control if present
    TrustDevice,
    /// Click through Continue/Skip/Not-now affordances
    AutoDismiss,
    /// Switch to an alternate verification method, then retry dismissal
    AlternatePath,
    /// Navigate straight to an authenticated-only URL
    ForcedNavigation,
    /// A code-entry field means a human is required
    CodeInputDetection,
    /// Bounded poll for manual completion
    ManualWait,
    /// Session recovered
    Resolved,
}

fn log_state(state: ChallengeState) {
    tracing::info!("challenge_state={:?}", state);
}

/// Detect a checkpoint/two-factor interruption from rendered page content.
///
/// Substring match over the configured markers; errors read as "no
/// challenge" so a flaky content read cannot derail the login flow.
pub async fn detect(session: &dyn BrowserSession, markers: &[String]) -> bool {
    let content = match session.content().await {
        Ok(content) => content,
        Err(_) => return false,
    };

    let hit = markers.iter().any(|marker| content.contains(marker));
    if hit {
        tracing::warn!("Verification challenge detected");
    }
    hit
}

/// Whether a URL still carries a challenge marker
fn url_has_marker(url: &str, markers: &[String]) -> bool {
    markers.iter().any(|marker| url.contains(marker))
}

/// Challenge bypass state machine over one browser page
#[derive(Debug, Clone)]
pub struct ChallengeHandler {
    settings: ChallengeSettings,
    quorum: QuorumCheck,
    required_cookies: Vec<String>,
    target_domain: String,
    home_url: String,
}

impl ChallengeHandler {
    /// Create a handler from challenge and session settings
    pub fn new(settings: ChallengeSettings, session_settings: &SessionSettings) -> Self {
        Self {
            settings,
            quorum: QuorumCheck::from_settings(session_settings),
            required_cookies: session_settings.required_cookies.clone(),
            target_domain: session_settings.target_domain.clone(),
            home_url: session_settings.home_url.clone(),
        }
    }

    /// Run the bypass sequence. Returns whether the session recovered.
    ///
    /// Never raises; the caller decides what a `false` verdict means.
    pub async fn resolve(&self, session: &dyn BrowserSession) -> bool {
        self.trust_device(session).await;

        log_state(ChallengeState::AutoDismiss);
        if self.auto_dismiss(session).await {
            log_state(ChallengeState::Resolved);
            return true;
        }

        log_state(ChallengeState::AlternatePath);
        if self.alternate_path(session).await {
            log_state(ChallengeState::Resolved);
            return true;
        }

        log_state(ChallengeState::ForcedNavigation);
        if self.forced_navigation(session).await {
            log_state(ChallengeState::Resolved);
            return true;
        }

        if self.code_input_present(session).await {
            log_state(ChallengeState::CodeInputDetection);
            tracing::warn!(
                "Verification code field present, a human has to complete this challenge"
            );
        }

        log_state(ChallengeState::ManualWait);
        self.manual_wait(session).await
    }

    /// Check any "remember this browser" control that is present
    async fn trust_device(&self, session: &dyn BrowserSession) {
        log_state(ChallengeState::TrustDevice);
        for selector in TRUST_DEVICE_SELECTORS {
            if probe_visible(session, selector, Duration::from_secs(2)).await {
                tracing::info!("Enabling remember-this-browser control: {}", selector);
                if let Err(e) = session.click_element(selector).await {
                    tracing::debug!("Trust-device click failed: {}", e);
                    continue;
                }
                human_pause(1000, 2000).await;
            }
        }
    }

    /// Click dismissal affordances until the quorum reports a session
    async fn auto_dismiss(&self, session: &dyn BrowserSession) -> bool {
        for selector in DISMISS_SELECTORS {
            if !probe_visible(session, selector, Duration::from_secs(2)).await {
                continue;
            }

            tracing::info!("Clicking dismissal affordance: {}", selector);
            if let Err(e) = session.click_element(selector).await {
                tracing::debug!("Dismissal click failed: {}", e);
                continue;
            }
            human_pause(2000, 3000).await;

            if self.quorum.is_logged_in(session).await {
                tracing::info!("Challenge dismissed automatically");
                return true;
            }
        }
        false
    }

    /// Switch to another verification method and retry dismissal once
    async fn alternate_path(&self, session: &dyn BrowserSession) -> bool {
        for selector in ALTERNATE_SELECTORS {
            if !probe_visible(session, selector, Duration::from_secs(2)).await {
                continue;
            }

            tracing::info!("Trying alternate verification path: {}", selector);
            if let Err(e) = session.click_element(selector).await {
                tracing::debug!("Alternate-path click failed: {}", e);
                continue;
            }
            human_pause(2000, 3000).await;
            return self.auto_dismiss(session).await;
        }
        false
    }

    /// Navigate to an authenticated-only URL and inspect where we land
    async fn forced_navigation(&self, session: &dyn BrowserSession) -> bool {
        if let Err(e) = session.navigate(&self.home_url).await {
            tracing::debug!("Forced navigation failed: {}", e);
            return false;
        }
        human_pause(2000, 3000).await;

        match session.current_url().await {
            Ok(url) => !url_has_marker(&url, &self.settings.markers),
            Err(_) => false,
        }
    }

    /// Whether a verification-code input is on the page
    async fn code_input_present(&self, session: &dyn BrowserSession) -> bool {
        for selector in CODE_INPUT_SELECTORS {
            if probe_visible(session, selector, Duration::from_secs(1)).await {
                return true;
            }
        }
        false
    }

    /// Bounded poll for a human to complete the verification.
    ///
    /// Re-checks session validity each tick and emits coarse progress
    /// logs. Timing out is non-fatal: control returns to the caller with
    /// whatever session state was achieved.
    async fn manual_wait(&self, session: &dyn BrowserSession) -> bool {
        let attempts = self.settings.manual_wait_attempts;
        tracing::info!(
            "Waiting up to {} attempts for manual challenge completion",
            attempts
        );

        for attempt in 0..attempts {
            tokio::time::sleep(self.settings.manual_wait_interval).await;

            let cookie_check =
                has_session(session, &self.required_cookies, &self.target_domain).await;
            if cookie_check || self.quorum.is_logged_in(session).await {
                tracing::info!("Challenge completed manually, continuing");
                return true;
            }

            if attempt > 0
                && self.settings.progress_log_every > 0
                && attempt % self.settings.progress_log_every == 0
            {
                let elapsed = self.settings.manual_wait_interval.as_secs() * u64::from(attempt + 1);
                tracing::info!(
                    "Still waiting for challenge completion, {}s elapsed",
                    elapsed
                );
            }
        }

        tracing::warn!("Manual challenge wait timed out, continuing with best-effort state");
        false
    }
}

/// Process-wide challenge coordination.
///
/// Overlapping triggers (cron tick plus a manual API run) must not attempt
/// challenge bypass on the same account at the same time. The first caller
/// takes the flag; a second caller waits — bounded — for the first to
/// finish and then proceeds independently.
#[derive(Debug, Default)]
pub struct ChallengeGuard {
    busy: AtomicBool,
    last_completed: Mutex<Option<Instant>>,
}

impl ChallengeGuard {
    /// Create a new guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the challenge-handling flag
    pub fn try_begin(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Release the flag and stamp the completion time
    pub fn finish(&self) {
        *self.last_completed.lock().expect("guard mutex poisoned") = Some(Instant::now());
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Whether challenge handling is in flight right now
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// When the last handling round completed
    pub fn last_completed(&self) -> Option<Instant> {
        *self.last_completed.lock().expect("guard mutex poisoned")
    }

    /// Wait (bounded) for an in-flight handling round to finish.
    ///
    /// Returns `true` when the flag was released within the budget.
    pub async fn await_completion(&self, max_wait: Duration) -> bool {
        let start = Instant::now();
        while self.is_busy() {
            if start.elapsed() >= max_wait {
                tracing::warn!("Timed out waiting on concurrent challenge handling");
                return false;
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        true
    }
}
