//! Job API client
//!
//! Thin client for the job/candidate REST API, an external collaborator.
//! The automation core only lists pending work and records per-pair
//! posting outcomes; the CRUD surface itself lives with the API.

use crate::config::settings::ApiSettings;
use crate::types::{JobPosting, PostStatus};
use crate::{Error, Result};
use reqwest::Client;
use serde::Serialize;

/// Body for a posting-status update
#[derive(Debug, Serialize)]
struct PostStatusUpdate<'a> {
    #[serde(rename = "groupUrl")]
    group_url: &'a str,
    status: PostStatus,
    #[serde(rename = "postUrl", skip_serializing_if = "Option::is_none")]
    post_url: Option<&'a str>,
}

/// HTTP client for the job/candidate REST API
#[derive(Debug, Clone)]
pub struct JobApiClient {
    http: Client,
    base_url: String,
}

impl JobApiClient {
    /// Create a client for the configured API
    pub fn new(settings: &ApiSettings) -> Self {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Jobs still lacking a successful post in at least one target group
    pub async fn pending_jobs(&self) -> Result<Vec<JobPosting>> {
        let url = format!("{}/jobs/pending", self.base_url);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::api(format!(
                "pending jobs request failed with status {}",
                response.status()
            )));
        }

        let jobs = response.json::<Vec<JobPosting>>().await?;
        Ok(jobs)
    }

    /// Record the outcome of one job/group posting attempt
    pub async fn update_post_status(
        &self,
        job_id: &str,
        group_url: &str,
        status: PostStatus,
        post_url: Option<&str>,
    ) -> Result<()> {
        let url = format!("{}/jobs/{}/posts", self.base_url, job_id);
        let body = PostStatusUpdate {
            group_url,
            status,
            post_url,
        };

        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::api(format!(
                "status update for job {} failed with status {}",
                job_id,
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        let mut settings = ApiSettings::default();
        settings.base_url = "http://localhost:3000/api/".to_string();

        let client = JobApiClient::new(&settings);
        assert_eq!(client.base_url, "http://localhost:3000/api");
    }

    #[test]
    fn test_status_update_serialization() {
        let update = PostStatusUpdate {
            group_url: "https://www.facebook.com/groups/123",
            status: PostStatus::Success,
            post_url: Some("https://www.facebook.com/groups/123/posts/9"),
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"status\":\"SUCCESS\""));
        assert!(json.contains("groupUrl"));
        assert!(json.contains("postUrl"));
    }

    #[test]
    fn test_status_update_omits_missing_post_url() {
        let update = PostStatusUpdate {
            group_url: "https://www.facebook.com/groups/123",
            status: PostStatus::Failed,
            post_url: None,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(!json.contains("postUrl"));
    }
}
