//! HTTP server components
//!
//! This module contains the axum application setup and request handlers
//! for the automation service.

pub mod app;
pub mod handlers;

pub use app::{AppState, create_app};
