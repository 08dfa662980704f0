//! Chromium driver using chromiumoxide
//!
//! Owns the launched browser process, its CDP event handler task and one
//! page. All [`BrowserSession`] operations are driven over CDP.

use crate::browser::driver::BrowserSession;
use crate::config::settings::BrowserSettings;
use crate::types::Cookie;
use crate::{Error, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCookiesParams, CookieParam, CookieSameSite, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Chromium-backed browser session
pub struct ChromiumSession {
    settings: BrowserSettings,
    browser: RwLock<Option<Browser>>,
    page: RwLock<Option<Arc<Mutex<Page>>>>,
    handler_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
}

impl ChromiumSession {
    /// Create a new, not-yet-started session
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            browser: RwLock::new(None),
            page: RwLock::new(None),
            handler_handle: RwLock::new(None),
        }
    }

    /// Launch the browser process and open a blank page
    pub async fn start(&self) -> Result<()> {
        let mut builder = BrowserConfig::builder()
            .window_size(1366, 768)
            .viewport(chromiumoxide::handler::viewport::Viewport {
                width: 1366,
                height: 768,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .arg("--disable-infobars")
            .arg("--mute-audio")
            .arg("--hide-scrollbars")
            .arg("--disable-blink-features=AutomationControlled");

        if self.settings.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(|e| Error::browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::browser(format!("Failed to launch browser: {}", e)))?;

        // Drain CDP events for the lifetime of the browser
        let handler_handle = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::browser(format!("Failed to open page: {}", e)))?;

        *self.browser.write().await = Some(browser);
        *self.page.write().await = Some(Arc::new(Mutex::new(page)));
        *self.handler_handle.write().await = Some(handler_handle);

        tracing::info!("Browser started");
        Ok(())
    }

    /// Close the browser process and stop the event handler
    pub async fn stop(&self) -> Result<()> {
        if let Some(mut browser) = self.browser.write().await.take() {
            let _ = browser.close().await;
        }
        if let Some(handle) = self.handler_handle.write().await.take() {
            handle.abort();
        }
        *self.page.write().await = None;

        tracing::info!("Browser stopped");
        Ok(())
    }

    async fn page(&self) -> Result<Arc<Mutex<Page>>> {
        self.page
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::browser("Browser not started"))
    }

    fn to_cookie_param(cookie: &Cookie) -> Result<CookieParam> {
        let mut builder = CookieParam::builder()
            .name(cookie.name.as_str())
            .value(cookie.value.as_str())
            .domain(cookie.domain.as_str())
            .path(cookie.path.as_str())
            .secure(cookie.secure)
            .http_only(cookie.http_only);

        if let Some(expires) = cookie.expires {
            builder = builder.expires(TimeSinceEpoch::new(expires));
        }
        if let Some(policy) = cookie.same_site_policy() {
            let same_site = match policy {
                crate::types::SameSite::Strict => CookieSameSite::Strict,
                crate::types::SameSite::Lax => CookieSameSite::Lax,
                crate::types::SameSite::None => CookieSameSite::None,
            };
            builder = builder.same_site(same_site);
        }

        builder
            .build()
            .map_err(|e| Error::browser(format!("Invalid cookie record: {}", e)))
    }

    fn from_cdp_cookie(cookie: chromiumoxide::cdp::browser_protocol::network::Cookie) -> Cookie {
        let same_site = cookie.same_site.map(|policy| {
            match policy {
                CookieSameSite::Strict => "Strict",
                CookieSameSite::Lax => "Lax",
                CookieSameSite::None => "None",
            }
            .to_string()
        });

        Cookie {
            name: cookie.name,
            value: cookie.value,
            domain: cookie.domain,
            path: cookie.path,
            expires: map_cdp_expiry(cookie.expires),
            same_site,
            secure: cookie.secure,
            http_only: cookie.http_only,
        }
    }
}

/// CDP reports session cookies with a negative expiry
fn map_cdp_expiry(expires: f64) -> Option<f64> {
    (expires >= 0.0).then_some(expires)
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let page = self.page().await?;
        let page = page.lock().await;

        tokio::time::timeout(self.settings.nav_timeout, page.goto(url))
            .await
            .map_err(|_| Error::browser(format!("Navigation to {} timed out", url)))?
            .map_err(|e| Error::browser(format!("Navigation to {} failed: {}", url, e)))?;

        tracing::debug!("Navigated to {}", url);
        Ok(())
    }

    async fn wait_until_idle(&self, timeout: Duration) -> Result<()> {
        let page = self.page().await?;
        let page = page.lock().await;

        tokio::time::timeout(timeout, page.wait_for_navigation())
            .await
            .map_err(|_| Error::browser("Timed out waiting for the page to settle"))?
            .map_err(|e| Error::browser(format!("Wait failed: {}", e)))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let page = self.page().await?;
        let page = page.lock().await;

        let url = page
            .url()
            .await
            .map_err(|e| Error::browser(format!("Failed to read URL: {}", e)))?;
        Ok(url.unwrap_or_default())
    }

    async fn content(&self) -> Result<String> {
        let page = self.page().await?;
        let page = page.lock().await;

        page.content()
            .await
            .map_err(|e| Error::browser(format!("Failed to read page content: {}", e)))
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let page = self.page().await?;
        let page = page.lock().await;

        let result = page
            .evaluate(script)
            .await
            .map_err(|e| Error::browser(format!("Evaluation failed: {}", e)))?;
        result
            .into_value()
            .map_err(|e| Error::browser(format!("Evaluation result not JSON: {}", e)))
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        let page = self.page().await?;
        let page = page.lock().await;

        let cookies = page
            .get_cookies()
            .await
            .map_err(|e| Error::browser(format!("Failed to read cookies: {}", e)))?;
        Ok(cookies.into_iter().map(Self::from_cdp_cookie).collect())
    }

    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<()> {
        let page = self.page().await?;
        let page = page.lock().await;

        let params = cookies
            .iter()
            .map(Self::to_cookie_param)
            .collect::<Result<Vec<_>>>()?;
        page.set_cookies(params)
            .await
            .map_err(|e| Error::browser(format!("Failed to install cookies: {}", e)))?;

        tracing::debug!("Installed {} cookies", cookies.len());
        Ok(())
    }

    async fn clear_cookies(&self) -> Result<()> {
        let page = self.page().await?;
        let page = page.lock().await;

        page.execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(|e| Error::browser(format!("Failed to clear cookies: {}", e)))?;
        Ok(())
    }

    async fn add_init_script(&self, script: &str) -> Result<()> {
        let page = self.page().await?;
        let page = page.lock().await;

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await
            .map_err(|e| Error::browser(format!("Failed to register init script: {}", e)))?;
        Ok(())
    }

    async fn input_text(&self, selector: &str, text: &str) -> Result<()> {
        let page = self.page().await?;
        let page = page.lock().await;

        let element = page
            .find_element(selector)
            .await
            .map_err(|e| Error::browser(format!("Element {} not found: {}", selector, e)))?;
        element
            .click()
            .await
            .map_err(|e| Error::browser(format!("Failed to focus {}: {}", selector, e)))?;
        element
            .type_str(text)
            .await
            .map_err(|e| Error::browser(format!("Failed to type into {}: {}", selector, e)))?;

        tracing::debug!("Input text into {}", selector);
        Ok(())
    }

    async fn click_element(&self, selector: &str) -> Result<()> {
        let page = self.page().await?;
        let page = page.lock().await;

        let element = page
            .find_element(selector)
            .await
            .map_err(|e| Error::browser(format!("Element {} not found: {}", selector, e)))?;
        element
            .click()
            .await
            .map_err(|e| Error::browser(format!("Failed to click {}: {}", selector, e)))?;

        tracing::debug!("Clicked element {}", selector);
        Ok(())
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<()> {
        let page = self.page().await?;
        let start = std::time::Instant::now();

        loop {
            if start.elapsed() > timeout {
                return Err(Error::browser(format!(
                    "Timeout waiting for element: {}",
                    selector
                )));
            }

            let page_guard = page.lock().await;
            match page_guard.find_element(selector).await {
                Ok(_) => return Ok(()),
                Err(_) => {
                    drop(page_guard);
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
            }
        }
    }

    async fn press_enter(&self) -> Result<()> {
        let page = self.page().await?;
        let page = page.lock().await;

        let mut down = DispatchKeyEventParams::new(DispatchKeyEventType::KeyDown);
        down.key = Some("Enter".to_string());
        down.code = Some("Enter".to_string());
        down.text = Some("\r".to_string());
        down.windows_virtual_key_code = Some(13);
        page.execute(down)
            .await
            .map_err(|e| Error::browser(format!("Key down failed: {}", e)))?;

        let mut up = DispatchKeyEventParams::new(DispatchKeyEventType::KeyUp);
        up.key = Some("Enter".to_string());
        up.code = Some("Enter".to_string());
        up.windows_virtual_key_code = Some(13);
        page.execute(up)
            .await
            .map_err(|e| Error::browser(format!("Key up failed: {}", e)))?;

        tracing::debug!("Pressed Enter");
        Ok(())
    }
}
