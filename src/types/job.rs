//! Job posting types
//!
//! Shapes exchanged with the job/candidate REST API collaborator. The API
//! owns the CRUD surface; the automation core only consumes pending work
//! and reports per-group posting outcomes.

use serde::{Deserialize, Serialize};

/// Posting status for one job/group pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    /// Not yet posted
    Pending,
    /// Posted successfully
    Success,
    /// Posting attempt failed
    Failed,
}

/// A job listing pending publication to one or more groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    /// Job identifier
    pub id: String,
    /// Job title
    pub title: String,
    /// Rendered post body
    pub body: String,
    /// Target group URLs still lacking a successful post
    #[serde(default)]
    pub group_urls: Vec<String>,
}

impl JobPosting {
    /// Create a new job posting
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            group_urls: Vec::new(),
        }
    }

    /// Add a target group URL
    pub fn with_group(mut self, url: impl Into<String>) -> Self {
        self.group_urls.push(url.into());
        self
    }
}

/// Aggregate outcome of one automation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Job/group pairs attempted
    pub total: u64,
    /// Pairs recorded as SUCCESS
    pub successful: u64,
    /// Pairs recorded as FAILED
    pub failed: u64,
}

impl RunStats {
    /// Record one successful pair
    pub fn record_success(&mut self) {
        self.total += 1;
        self.successful += 1;
    }

    /// Record one failed pair
    pub fn record_failure(&mut self) {
        self.total += 1;
        self.failed += 1;
    }

    /// Merge another stats block into this one
    pub fn merge(&mut self, other: RunStats) {
        self.total += other.total;
        self.successful += other.successful;
        self.failed += other.failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PostStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::to_string(&PostStatus::Success).unwrap(),
            "\"SUCCESS\""
        );
        assert_eq!(
            serde_json::to_string(&PostStatus::Failed).unwrap(),
            "\"FAILED\""
        );
    }

    #[test]
    fn test_run_stats_accumulation() {
        let mut stats = RunStats::default();
        stats.record_success();
        stats.record_success();
        stats.record_failure();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn test_run_stats_merge() {
        let mut a = RunStats {
            total: 2,
            successful: 1,
            failed: 1,
        };
        let b = RunStats {
            total: 3,
            successful: 3,
            failed: 0,
        };
        a.merge(b);
        assert_eq!(a.total, 5);
        assert_eq!(a.successful, 4);
        assert_eq!(a.failed, 1);
    }

    #[test]
    fn test_job_posting_builder() {
        let job = JobPosting::new("job_1", "Backend Engineer", "We are hiring...")
            .with_group("https://www.facebook.com/groups/123")
            .with_group("https://www.facebook.com/groups/456");
        assert_eq!(job.group_urls.len(), 2);
    }
}
