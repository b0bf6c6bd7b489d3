//! Application layer - the call card use case
//!
//! This layer orchestrates domain objects to fulfill use cases.
//! It's responsible for:
//! - Coordinating call selection, contact lookups and display pushes
//! - Serializing every handler onto one task
//! - Publishing in-call state changes to listeners

pub mod call_timer;
pub mod coordinator;
pub mod in_call;
pub mod service;

pub use call_timer::{format_elapsed_time, CallTimer, TimerTick};
pub use coordinator::{CallCardCoordinator, CoordinatorDeps, CoordinatorSnapshot};
pub use in_call::{CallListPublisher, InCallEvent, InCallNotifier};
pub use service::{CallCardCommand, CallCardHandle, CallCardService};
