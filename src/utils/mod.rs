//! Utility functions and helpers
//!
//! This module contains utility functions used throughout the application.

pub mod pacing;
pub mod version;

pub use pacing::human_pause;
pub use version::get_version;
