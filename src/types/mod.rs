//! Type definitions for the automation service
//!
//! This module contains the main data structures used for the cookie jar,
//! job postings and HTTP payloads.

pub mod cookie;
pub mod job;
pub mod response;

pub use cookie::{Cookie, Credentials, SameSite};
pub use job::{JobPosting, PostStatus, RunStats};
pub use response::{ErrorResponse, LoginVerdict, PingResponse, StatusResponse};
