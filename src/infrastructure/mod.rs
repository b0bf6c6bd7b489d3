//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - Account and telephony lookups
//! - The contact info cache and its directory backends
//! - A telecom adapter acting on the published call list

pub mod account;
pub mod contact_cache;
pub mod telecom;

pub use account::StaticAccountProvider;
pub use contact_cache::{ContactDirectory, ContactInfoCache, ContactRecord, InMemoryContactDirectory};
pub use telecom::CallListTelecomAdapter;
