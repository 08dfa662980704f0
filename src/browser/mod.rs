//! Browser automation layer
//!
//! Abstracts the driven browser behind the [`BrowserSession`] trait so the
//! session state machines stay testable without Chromium. The concrete
//! driver speaks CDP through chromiumoxide.

pub mod chromium;
pub mod driver;
pub mod stealth;

pub use chromium::ChromiumSession;
pub use driver::BrowserSession;
