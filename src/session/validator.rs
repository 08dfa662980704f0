//! Session validity checks
//!
//! Two independent verdicts, both computed fresh on every check and never
//! cached: an explicit test for the required session cookies, and a quorum
//! vote over DOM indicators. No single DOM heuristic is reliable against a
//! dynamic third-party UI; requiring several to agree absorbs cosmetic
//! layout changes in either direction.

use crate::browser::driver::{BrowserSession, evaluate_bool};
use crate::config::settings::SessionSettings;

/// Check for the required named session cookies.
///
/// True iff every name in `required` is present on the target domain with
/// a non-empty value. Fails closed: any driver error reads as "no
/// session".
pub async fn has_session(
    session: &dyn BrowserSession,
    required: &[String],
    domain: &str,
) -> bool {
    let cookies = match session.cookies().await {
        Ok(cookies) => cookies,
        Err(_) => return false,
    };

    required.iter().all(|name| {
        cookies
            .iter()
            .any(|c| c.matches_domain(domain) && &c.name == name && !c.value.is_empty())
    })
}

/// One login indicator: a named boolean JS expression
#[derive(Debug, Clone)]
pub struct DomIndicator {
    /// Short label used in logs
    pub name: String,
    /// Boolean JS expression evaluated in the page
    pub script: String,
}

impl DomIndicator {
    /// Create a new indicator
    pub fn new(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
        }
    }
}

/// Quorum vote over DOM indicators.
///
/// The ≥threshold voting mechanism is the contract here; the concrete
/// indicator set is swappable data.
#[derive(Debug, Clone)]
pub struct QuorumCheck {
    indicators: Vec<DomIndicator>,
    threshold: usize,
}

impl QuorumCheck {
    /// Create a check over an explicit indicator set
    pub fn new(indicators: Vec<DomIndicator>, threshold: usize) -> Self {
        Self {
            indicators,
            threshold,
        }
    }

    /// Build from settings, falling back to the built-in Facebook set
    /// when no indicators are configured
    pub fn from_settings(settings: &SessionSettings) -> Self {
        if settings.indicators.is_empty() {
            return Self::facebook_defaults(settings.quorum_threshold);
        }

        let indicators = settings
            .indicators
            .iter()
            .map(|i| DomIndicator::new(&i.name, &i.script))
            .collect();
        Self::new(indicators, settings.quorum_threshold)
    }

    /// The built-in indicator set for the Facebook landing page
    pub fn facebook_defaults(threshold: usize) -> Self {
        let indicators = vec![
            DomIndicator::new(
                "composer",
                r#"!!document.querySelector('[data-testid="react-composer-post-button"]')"#,
            ),
            DomIndicator::new(
                "account_menu",
                r#"!!document.querySelector('[aria-label*="Account"]')"#,
            ),
            DomIndicator::new(
                "blue_bar",
                r#"!!document.querySelector('[data-testid="blue_bar"]')"#,
            ),
            DomIndicator::new(
                "main_region",
                r#"!!document.querySelector('div[role="main"]')"#,
            ),
            DomIndicator::new("no_login_form", r#"!document.querySelector('#email')"#),
            DomIndicator::new(
                "no_email_input",
                r#"!document.querySelector('input[name="email"]')"#,
            ),
        ];
        Self::new(indicators, threshold)
    }

    /// Minimum positive count for a logged-in verdict
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of indicators voting
    pub fn indicator_count(&self) -> usize {
        self.indicators.len()
    }

    /// Evaluate all indicators and return the quorum verdict.
    ///
    /// Indicator failures count as negative votes; the check itself never
    /// fails.
    pub async fn is_logged_in(&self, session: &dyn BrowserSession) -> bool {
        let mut positives = 0;
        for indicator in &self.indicators {
            let hit = evaluate_bool(session, &indicator.script).await;
            tracing::trace!("Indicator {}: {}", indicator.name, hit);
            if hit {
                positives += 1;
            }
        }

        tracing::debug!(
            "Login quorum: {}/{} positive (threshold {})",
            positives,
            self.indicators.len(),
            self.threshold
        );
        positives >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::IndicatorSetting;

    #[test]
    fn test_default_indicator_set() {
        let quorum = QuorumCheck::facebook_defaults(3);
        assert_eq!(quorum.indicator_count(), 6);
        assert_eq!(quorum.threshold(), 3);
    }

    #[test]
    fn test_from_settings_uses_overrides() {
        let mut settings = SessionSettings::default();
        settings.indicators = vec![
            IndicatorSetting {
                name: "custom".to_string(),
                script: "true".to_string(),
            },
            IndicatorSetting {
                name: "other".to_string(),
                script: "false".to_string(),
            },
        ];
        settings.quorum_threshold = 1;

        let quorum = QuorumCheck::from_settings(&settings);
        assert_eq!(quorum.indicator_count(), 2);
        assert_eq!(quorum.threshold(), 1);
    }

    #[test]
    fn test_from_settings_defaults_when_empty() {
        let settings = SessionSettings::default();
        let quorum = QuorumCheck::from_settings(&settings);
        assert_eq!(quorum.indicator_count(), 6);
    }
}
