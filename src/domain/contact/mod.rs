//! Contact bounded context - what we know about the party on the other end of a call

pub mod entry;
pub mod resolver;

pub use entry::ContactCacheEntry;
pub use resolver::{ContactLookupCallback, ContactResolver, LookupCompletion, LookupSlot, LookupStage};
