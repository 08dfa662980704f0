//! Shared test utilities
//!
//! A scriptable in-memory [`BrowserSession`] standing in for Chromium.
//! Tests configure which selectors are visible, which indicator scripts
//! evaluate true, the rendered content and the cookie context, plus hooks
//! that fire on form submission and challenge dismissal.

use async_trait::async_trait;
use fbauto::browser::BrowserSession;
use fbauto::config::Settings;
use fbauto::config::settings::IndicatorSetting;
use fbauto::types::Cookie;
use fbauto::{Error, Result};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Mutable page/context state behind the mock
#[derive(Default)]
pub struct PageState {
    pub cookies: Vec<Cookie>,
    pub true_scripts: HashSet<String>,
    pub visible: HashSet<String>,
    pub content: String,
    pub url: String,
    /// When set, every navigation lands here instead of the requested URL
    pub redirect_to: Option<String>,
    pub nav_count: u32,
    pub fill_count: u32,
    pub submit_count: u32,
    pub dismiss_count: u32,
    pub init_scripts: u32,
}

type Hook = Box<dyn Fn(&mut PageState) + Send + Sync>;

/// Scriptable browser double
#[derive(Default)]
pub struct MockBrowser {
    pub state: Mutex<PageState>,
    submit_selector: Option<String>,
    dismiss_selector: Option<String>,
    on_submit: Option<Hook>,
    on_dismiss: Option<Hook>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutate the page state under the lock
    pub fn configure(&self, f: impl FnOnce(&mut PageState)) {
        f(&mut self.state.lock().unwrap());
    }

    /// Treat clicks on `selector` (or Enter) as a login submission
    pub fn on_submit(mut self, selector: &str, hook: impl Fn(&mut PageState) + Send + Sync + 'static) -> Self {
        self.submit_selector = Some(selector.to_string());
        self.on_submit = Some(Box::new(hook));
        self
    }

    /// Fire `hook` when the given dismissal affordance is clicked
    pub fn on_dismiss(mut self, selector: &str, hook: impl Fn(&mut PageState) + Send + Sync + 'static) -> Self {
        self.dismiss_selector = Some(selector.to_string());
        self.on_dismiss = Some(Box::new(hook));
        self
    }

    pub fn fill_count(&self) -> u32 {
        self.state.lock().unwrap().fill_count
    }

    pub fn submit_count(&self) -> u32 {
        self.state.lock().unwrap().submit_count
    }

    pub fn dismiss_count(&self) -> u32 {
        self.state.lock().unwrap().dismiss_count
    }

    fn fire_submit(&self) {
        let mut state = self.state.lock().unwrap();
        state.submit_count += 1;
        if let Some(hook) = &self.on_submit {
            hook(&mut state);
        }
    }
}

#[async_trait]
impl BrowserSession for MockBrowser {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.nav_count += 1;
        state.url = state.redirect_to.clone().unwrap_or_else(|| url.to_string());
        Ok(())
    }

    async fn wait_until_idle(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().content.clone())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let state = self.state.lock().unwrap();
        Ok(serde_json::Value::Bool(state.true_scripts.contains(script)))
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        Ok(self.state.lock().unwrap().cookies.clone())
    }

    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .cookies
            .extend_from_slice(cookies);
        Ok(())
    }

    async fn clear_cookies(&self) -> Result<()> {
        self.state.lock().unwrap().cookies.clear();
        Ok(())
    }

    async fn add_init_script(&self, _script: &str) -> Result<()> {
        self.state.lock().unwrap().init_scripts += 1;
        Ok(())
    }

    async fn input_text(&self, selector: &str, _text: &str) -> Result<()> {
        let visible = self.state.lock().unwrap().visible.contains(selector);
        if !visible {
            return Err(Error::browser(format!("Element {} not found", selector)));
        }
        self.state.lock().unwrap().fill_count += 1;
        Ok(())
    }

    async fn click_element(&self, selector: &str) -> Result<()> {
        let visible = self.state.lock().unwrap().visible.contains(selector);
        if !visible {
            return Err(Error::browser(format!("Element {} not found", selector)));
        }

        if self.submit_selector.as_deref() == Some(selector) {
            self.fire_submit();
            return Ok(());
        }

        if self.dismiss_selector.as_deref() == Some(selector) {
            let mut state = self.state.lock().unwrap();
            state.dismiss_count += 1;
            if let Some(hook) = &self.on_dismiss {
                hook(&mut state);
            }
        }
        Ok(())
    }

    async fn wait_visible(&self, selector: &str, _timeout: Duration) -> Result<()> {
        // No real waiting: visibility is fixed test state
        if self.state.lock().unwrap().visible.contains(selector) {
            Ok(())
        } else {
            Err(Error::browser(format!(
                "Timeout waiting for element: {}",
                selector
            )))
        }
    }

    async fn press_enter(&self) -> Result<()> {
        self.fire_submit();
        Ok(())
    }
}

/// Six synthetic indicators named `i1`..`i6`; tests mark a subset true
pub fn synthetic_indicators() -> Vec<IndicatorSetting> {
    (1..=6)
        .map(|n| IndicatorSetting {
            name: format!("i{}", n),
            script: format!("i{}", n),
        })
        .collect()
}

/// Settings tuned for fast tests: synthetic indicators, tight challenge
/// bounds, jar directory under `cookies_dir`
pub fn test_settings(cookies_dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.account.email = "jane@example.com".to_string();
    settings.account.password = "s3cret".to_string();
    settings.session.cookies_dir = cookies_dir.to_path_buf();
    settings.session.indicators = synthetic_indicators();
    settings.challenge.manual_wait_attempts = 2;
    settings.challenge.manual_wait_interval = Duration::from_millis(20);
    settings.challenge.guard_wait = Duration::from_millis(200);
    settings
}

/// A valid far-future jar for the standard required cookies
pub fn valid_jar() -> Vec<Cookie> {
    vec![
        Cookie::new("c_user", "100001", ".facebook.com").with_expires(4_000_000_000.0),
        Cookie::new("xs", "session_secret", ".facebook.com").with_expires(4_000_000_000.0),
        Cookie::new("fr", "tracking", ".facebook.com").with_expires(4_000_000_000.0),
    ]
}

/// Write a jar file the way the store expects to find it
pub fn write_jar(dir: &Path, account_id: &str, cookies: &[Cookie]) {
    std::fs::create_dir_all(dir).unwrap();
    let encoded = account_id.replace(['@', '.'], "_");
    let path = dir.join(format!("{}.json", encoded));
    std::fs::write(path, serde_json::to_string_pretty(cookies).unwrap()).unwrap();
}
