//! Call bounded context - call snapshots and the registry that holds them

pub mod aggregate;
pub mod details;
pub mod registry;
pub mod value_object;

pub use aggregate::{are_calls_same, Call, GatewayInfo};
pub use details::{CallDetails, StatusHints, EXTRA_CALL_BACK_NUMBER};
pub use registry::{CallList, CallRegistry, SharedCallList};
pub use value_object::{CallCapabilities, CallState, DisconnectCause, InCallState};
