//! Domain result type

use super::error::DomainError;

/// Result of call list updates and telecom requests
pub type Result<T> = std::result::Result<T, DomainError>;
