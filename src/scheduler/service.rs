//! Automation service
//!
//! The concrete [`JobRunner`]: pulls pending work from the job API, brings
//! up a browser, runs the login orchestration once, then posts each
//! job/group pair and records its outcome. Posting status lives per pair,
//! so an interrupted pass resumes cleanly on the next tick.

use crate::api::JobApiClient;
use crate::browser::{BrowserSession, ChromiumSession};
use crate::config::Settings;
use crate::scheduler::automation::JobRunner;
use crate::session::LoginOrchestrator;
use crate::types::{JobPosting, PostStatus, RunStats};
use crate::utils::human_pause;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Publishes one job into one group over an authenticated session.
///
/// The concrete selectors are swappable; group-feed markup shifts often
/// and nothing else in the pipeline should care.
#[async_trait]
pub trait GroupPoster: Send + Sync {
    /// Post the job, returning the created post's URL
    async fn post_job(
        &self,
        session: &dyn BrowserSession,
        job: &JobPosting,
        group_url: &str,
    ) -> Result<String>;
}

/// Composer affordances on a group feed
const COMPOSER_OPEN_SELECTORS: [&str; 3] = [
    r#"[data-testid="react-composer-post-button"]"#,
    r#"[role="button"][aria-label*="Write something"]"#,
    r#"[role="button"][aria-label*="Create a public post"]"#,
];
const COMPOSER_TEXTBOX_SELECTOR: &str = r#"[role="textbox"][contenteditable="true"]"#;
const COMPOSER_SUBMIT_SELECTORS: [&str; 2] = [
    r#"[aria-label="Post"]"#,
    r#"[data-testid="react-composer-post-button"]"#,
];

/// Default poster driving the group composer directly
#[derive(Debug, Default)]
pub struct ComposerPoster;

#[async_trait]
impl GroupPoster for ComposerPoster {
    async fn post_job(
        &self,
        session: &dyn BrowserSession,
        job: &JobPosting,
        group_url: &str,
    ) -> Result<String> {
        session.navigate(group_url).await?;
        human_pause(3000, 5000).await;

        let mut opened = false;
        for selector in COMPOSER_OPEN_SELECTORS {
            if session
                .wait_visible(selector, Duration::from_secs(3))
                .await
                .is_ok()
                && session.click_element(selector).await.is_ok()
            {
                opened = true;
                break;
            }
        }
        if !opened {
            return Err(Error::browser("group composer not found"));
        }
        human_pause(1500, 2500).await;

        session
            .wait_visible(COMPOSER_TEXTBOX_SELECTOR, Duration::from_secs(10))
            .await?;
        session
            .input_text(COMPOSER_TEXTBOX_SELECTOR, &job.body)
            .await?;
        human_pause(1500, 2500).await;

        let mut submitted = false;
        for selector in COMPOSER_SUBMIT_SELECTORS {
            if session.click_element(selector).await.is_ok() {
                submitted = true;
                break;
            }
        }
        if !submitted {
            return Err(Error::browser("composer submit control not found"));
        }
        human_pause(4000, 6000).await;

        session.current_url().await
    }
}

/// Concrete posting/monitoring routine behind the scheduler
pub struct AutomationService {
    settings: Arc<Settings>,
    api: JobApiClient,
    orchestrator: LoginOrchestrator,
    poster: Arc<dyn GroupPoster>,
}

impl AutomationService {
    /// Create a service with the default composer poster
    pub fn new(settings: Arc<Settings>) -> Self {
        Self::with_poster(settings, Arc::new(ComposerPoster))
    }

    /// Create a service with a custom poster
    pub fn with_poster(settings: Arc<Settings>, poster: Arc<dyn GroupPoster>) -> Self {
        let api = JobApiClient::new(&settings.api);
        let orchestrator =
            LoginOrchestrator::with_guard(Arc::clone(&settings), Default::default());

        Self {
            settings,
            api,
            orchestrator,
            poster,
        }
    }

    /// Post every pending job/group pair over an authenticated session
    async fn run_jobs(
        &self,
        session: &dyn BrowserSession,
        jobs: &[JobPosting],
    ) -> Result<RunStats> {
        let credentials = self.settings.credentials();
        if !self
            .orchestrator
            .ensure_logged_in(session, &credentials)
            .await?
        {
            return Err(Error::login("login did not produce a usable session"));
        }

        let mut stats = RunStats::default();
        for job in jobs {
            for group_url in &job.group_urls {
                match self.poster.post_job(session, job, group_url).await {
                    Ok(post_url) => {
                        tracing::info!("Posted job {} to {}", job.id, group_url);
                        self.record_status(&job.id, group_url, PostStatus::Success, Some(&post_url))
                            .await;
                        stats.record_success();
                    }
                    Err(e) => {
                        tracing::warn!("Posting job {} to {} failed: {}", job.id, group_url, e);
                        self.record_status(&job.id, group_url, PostStatus::Failed, None)
                            .await;
                        stats.record_failure();
                    }
                }

                // Pace between groups; bursts read as automation
                human_pause(3000, 6000).await;
            }
        }

        Ok(stats)
    }

    /// Record an outcome, logging instead of failing the pass
    async fn record_status(
        &self,
        job_id: &str,
        group_url: &str,
        status: PostStatus,
        post_url: Option<&str>,
    ) {
        if let Err(e) = self
            .api
            .update_post_status(job_id, group_url, status, post_url)
            .await
        {
            tracing::warn!("Failed to record post status for job {}: {}", job_id, e);
        }
    }
}

#[async_trait]
impl JobRunner for AutomationService {
    async fn pending_count(&self) -> Result<u64> {
        let jobs = self.api.pending_jobs().await?;
        Ok(jobs.iter().map(|job| job.group_urls.len() as u64).sum())
    }

    async fn process_pending(&self) -> Result<RunStats> {
        let jobs = self.api.pending_jobs().await?;
        if jobs.is_empty() {
            return Ok(RunStats::default());
        }

        let browser = ChromiumSession::new(self.settings.browser.clone());
        browser.start().await?;

        let result = self.run_jobs(&browser, &jobs).await;

        if let Err(e) = browser.stop().await {
            tracing::warn!("Browser shutdown failed: {}", e);
        }

        result
    }
}
