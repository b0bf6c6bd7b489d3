//! Shared kernel - Common types and utilities used across the crate

pub mod clock;
pub mod error;
pub mod phone_number;
pub mod result;
pub mod value_objects;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, LookupError};
pub use result::Result;
pub use value_objects::*;
