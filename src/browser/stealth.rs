//! Anti-fingerprinting init scripts
//!
//! Scripts installed into every new document before any page code runs.
//! Masking the automation markers lowers the chance of hitting a
//! verification challenge in the first place, which is cheaper than
//! resolving one.

use crate::Result;
use crate::browser::BrowserSession;
use crate::config::settings::BrowserSettings;

/// Hide the `navigator.webdriver` automation marker
pub fn webdriver_mask_script() -> &'static str {
    r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
delete navigator.__proto__.webdriver;
"#
}

/// Pin a consistent user agent and platform
pub fn identity_pin_script(user_agent: &str, platform: &str) -> String {
    format!(
        r#"
Object.defineProperty(navigator, 'platform', {{ get: () => '{platform}' }});
Object.defineProperty(navigator, 'userAgent', {{ get: () => '{user_agent}' }});
"#
    )
}

/// Present a consistent hardware profile and plugin list
pub fn hardware_profile_script() -> &'static str {
    r#"
Object.defineProperty(navigator, 'hardwareConcurrency', { get: () => 8 });
Object.defineProperty(navigator, 'deviceMemory', { get: () => 8 });
Object.defineProperty(screen, 'width', { get: () => 1366 });
Object.defineProperty(screen, 'height', { get: () => 768 });
Object.defineProperty(navigator, 'plugins', {
  get: () => [
    { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer', description: 'Portable Document Format' },
    { name: 'Native Client', filename: 'internal-nacl-plugin', description: 'Native Client' },
  ],
});
"#
}

/// Install the full stealth profile into a session.
///
/// Must run before the first navigation; init scripts only affect
/// documents created after registration.
pub async fn apply(session: &dyn BrowserSession, settings: &BrowserSettings) -> Result<()> {
    session.add_init_script(webdriver_mask_script()).await?;
    session
        .add_init_script(&identity_pin_script(
            &settings.user_agent,
            &settings.platform,
        ))
        .await?;
    session.add_init_script(hardware_profile_script()).await?;

    tracing::debug!("Stealth profile installed");
    Ok(())
}
