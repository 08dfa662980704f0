//! Login orchestration
//!
//! Composes the cookie store, the validity checks and the challenge
//! handler into one idempotent `ensure_logged_in` operation, safe to call
//! before every posting/monitoring action. The common case — a stored jar
//! that still validates — never touches the login form at all, which is
//! the cheapest way to avoid triggering a challenge.

use crate::browser::driver::{BrowserSession, probe_visible};
use crate::browser::stealth;
use crate::config::Settings;
use crate::session::challenge::{self, ChallengeGuard, ChallengeHandler};
use crate::session::store::CookieStore;
use crate::session::validator::{QuorumCheck, has_session};
use crate::types::Credentials;
use crate::utils::human_pause;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Email field selector, shared by the desktop and mobile login pages
pub const EMAIL_SELECTOR: &str = r#"#email, input[name="email"]"#;
/// Password field selector
pub const PASSWORD_SELECTOR: &str = r#"#pass, input[name="pass"]"#;
/// Login submit control selector
pub const LOGIN_BUTTON_SELECTOR: &str = r#"button[name="login"], #loginbutton"#;

/// Idempotent "ensure logged in" over one browser session
pub struct LoginOrchestrator {
    settings: Arc<Settings>,
    store: CookieStore,
    quorum: QuorumCheck,
    challenge: ChallengeHandler,
    guard: Arc<ChallengeGuard>,
}

impl LoginOrchestrator {
    /// Create an orchestrator with its own challenge guard
    pub fn new(settings: Settings) -> Self {
        Self::with_guard(Arc::new(settings), Arc::new(ChallengeGuard::new()))
    }

    /// Create an orchestrator sharing a process-wide challenge guard
    pub fn with_guard(settings: Arc<Settings>, guard: Arc<ChallengeGuard>) -> Self {
        let store = CookieStore::from_settings(&settings.session);
        let quorum = QuorumCheck::from_settings(&settings.session);
        let challenge = ChallengeHandler::new(settings.challenge.clone(), &settings.session);

        Self {
            settings,
            store,
            quorum,
            challenge,
            guard,
        }
    }

    /// The challenge guard shared with other orchestrator users
    pub fn guard(&self) -> Arc<ChallengeGuard> {
        Arc::clone(&self.guard)
    }

    /// Ensure the session is authenticated, logging in if necessary.
    ///
    /// `Ok(true)` leaves the browser context authenticated for the caller
    /// to drive further navigation. An error is returned only after the
    /// cookie path, a fresh login and challenge handling have all failed
    /// to produce a valid session.
    pub async fn ensure_logged_in(
        &self,
        session: &dyn BrowserSession,
        credentials: &Credentials,
    ) -> Result<bool> {
        tracing::info!("Ensuring login for {}", credentials.email);

        // Mask automation markers before the first navigation
        if let Err(e) = stealth::apply(session, &self.settings.browser).await {
            tracing::warn!("Stealth profile installation failed: {}", e);
        }

        if self.store.load(session, &credentials.account_id).await
            && self.cookie_fast_path(session, credentials).await
        {
            return Ok(true);
        }

        self.fresh_login(session, credentials).await;

        if challenge::detect(session, &self.settings.challenge.markers).await {
            self.handle_challenge(session).await;
        }

        self.final_validation(session, credentials).await
    }

    /// Validate a cookie-restored session without touching the login form.
    ///
    /// A navigation error here is not fatal; it downgrades to the
    /// fresh-login path.
    async fn cookie_fast_path(
        &self,
        session: &dyn BrowserSession,
        credentials: &Credentials,
    ) -> bool {
        if let Err(e) = self.navigate_home(session).await {
            tracing::warn!("Navigation on cookie path failed: {}, retrying fresh", e);
            return false;
        }

        if self.quorum.is_logged_in(session).await {
            tracing::info!("Logged in via stored cookies, challenge exposure avoided");
            self.refresh_jar(session, credentials).await;
            return true;
        }

        // The DOM heuristics can lag a slow render; the explicit cookie
        // test gets the final word before the jar is discarded.
        if self.cookie_check(session).await {
            tracing::info!("Session cookies valid despite quorum miss");
            self.refresh_jar(session, credentials).await;
            return true;
        }

        tracing::warn!("Stored cookies no longer validate, clearing for fresh login");
        if let Err(e) = session.clear_cookies().await {
            tracing::warn!("Failed to clear cookies: {}", e);
        }
        false
    }

    /// Navigate to the landing page with the environment-appropriate wait
    async fn navigate_home(&self, session: &dyn BrowserSession) -> Result<()> {
        session.navigate(&self.settings.session.home_url).await?;

        if self.settings.browser.production {
            // Production favors settling fully, but a hung long-poll must
            // not fail the whole check
            human_pause(3000, 5000).await;
            if let Err(e) = session
                .wait_until_idle(self.settings.browser.idle_timeout)
                .await
            {
                tracing::debug!("Network idle wait expired: {}, continuing", e);
            }
        }
        human_pause(1500, 2500).await;
        Ok(())
    }

    /// Fill and submit the login form. Best-effort: every step that can
    /// fail falls back rather than aborting the flow.
    async fn fresh_login(&self, session: &dyn BrowserSession, credentials: &Credentials) {
        tracing::info!("Proceeding with fresh login");

        // Mobile login first: the lighter page triggers fewer challenges
        if let Err(e) = session
            .navigate(&self.settings.session.mobile_login_url)
            .await
        {
            tracing::warn!("Mobile login navigation failed: {}, using desktop", e);
            if let Err(e) = session.navigate(&self.settings.session.login_url).await {
                tracing::warn!("Desktop login navigation failed: {}", e);
            }
        }
        human_pause(2000, 3000).await;

        // A redirect may have carried an active session with it
        if self.cookie_check(session).await {
            tracing::info!("Session already active, no login form needed");
            return;
        }

        if session
            .wait_visible(EMAIL_SELECTOR, Duration::from_secs(10))
            .await
            .is_err()
        {
            tracing::warn!("Login form did not appear");
            return;
        }

        if let Err(e) = session.input_text(EMAIL_SELECTOR, &credentials.email).await {
            tracing::warn!("Failed to fill email field: {}", e);
        }
        human_pause(800, 1200).await;

        if let Err(e) = session
            .input_text(PASSWORD_SELECTOR, &credentials.password)
            .await
        {
            tracing::warn!("Failed to fill password field: {}", e);
        }
        human_pause(800, 1200).await;

        if probe_visible(session, LOGIN_BUTTON_SELECTOR, Duration::from_secs(5)).await {
            if let Err(e) = session.click_element(LOGIN_BUTTON_SELECTOR).await {
                tracing::warn!("Login button click failed: {}, trying Enter", e);
                let _ = session.press_enter().await;
            }
        } else {
            tracing::info!("Login button not found, submitting with Enter");
            let _ = session.press_enter().await;
        }

        human_pause(3500, 4500).await;
    }

    /// Run the challenge handler under the process-wide guard
    async fn handle_challenge(&self, session: &dyn BrowserSession) {
        if self.guard.try_begin() {
            let resolved = self.challenge.resolve(session).await;
            self.guard.finish();
            tracing::info!("Challenge handling finished, resolved={}", resolved);
        } else {
            // Another run is already working this account; wait for its
            // completion marker and re-validate independently
            tracing::info!("Challenge handling already in flight, waiting on it");
            self.guard
                .await_completion(self.settings.challenge.guard_wait)
                .await;
        }
    }

    /// Final session validation across landing-page variants.
    ///
    /// On persistent failure whatever cookies exist are still persisted
    /// before the failure is surfaced.
    async fn final_validation(
        &self,
        session: &dyn BrowserSession,
        credentials: &Credentials,
    ) -> Result<bool> {
        if let Err(e) = self.navigate_home(session).await {
            tracing::warn!("Final validation navigation failed: {}", e);
        }
        if self.quorum.is_logged_in(session).await || self.cookie_check(session).await {
            tracing::info!("Login successful");
            self.refresh_jar(session, credentials).await;
            return Ok(true);
        }

        tracing::warn!("Session validation failed, retrying on the mobile landing page");
        if let Err(e) = session
            .navigate(&self.settings.session.mobile_home_url)
            .await
        {
            tracing::warn!("Mobile landing navigation failed: {}", e);
        }
        human_pause(4000, 6000).await;

        if self.quorum.is_logged_in(session).await || self.cookie_check(session).await {
            tracing::info!("Login successful via mobile landing page");
            self.refresh_jar(session, credentials).await;
            return Ok(true);
        }

        // Keep whatever partial state exists; the next attempt may be able
        // to resume from it
        self.refresh_jar(session, credentials).await;
        Err(Error::login(
            "session not established after cookie, fresh-login and challenge paths",
        ))
    }

    async fn cookie_check(&self, session: &dyn BrowserSession) -> bool {
        has_session(
            session,
            &self.settings.session.required_cookies,
            &self.settings.session.target_domain,
        )
        .await
    }

    /// Persist the current jar, logging instead of failing
    async fn refresh_jar(&self, session: &dyn BrowserSession, credentials: &Credentials) {
        if let Err(e) = self.store.save(session, &credentials.account_id).await {
            tracing::warn!("Failed to refresh cookie jar: {}", e);
        }
    }
}
