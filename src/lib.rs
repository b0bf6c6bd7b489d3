//! Callcard - in-call screen coordination built with Rust
//!
//! Decides which calls the in-call screen shows as primary and secondary,
//! resolves contact details for them in the background and keeps the
//! display, including the elapsed-time counter, in sync with the call list.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
