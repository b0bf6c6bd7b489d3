//! Domain layer - Core model and rules
//!
//! This layer contains:
//! - Call snapshots and the call registry
//! - Contact cache entries and the contact resolver port
//! - Call selection for the primary and secondary display slots
//! - Ports for accounts and telecom actions

pub mod account;
pub mod call;
pub mod contact;
pub mod selection;
pub mod shared;
pub mod telecom;

// Re-export commonly used types
pub use shared::{DomainError, Result};
