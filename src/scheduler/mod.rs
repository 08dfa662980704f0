//! Automation scheduling
//!
//! A recurring, single-flight driver for the posting/monitoring pipeline.
//! The scheduler owns the run state; the work itself sits behind the
//! [`JobRunner`] seam so tests and alternate frontends can substitute it.

pub mod automation;
pub mod service;

pub use automation::{AutomationScheduler, JobRunner};
pub use service::{AutomationService, ComposerPoster, GroupPoster};
