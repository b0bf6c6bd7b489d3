//! Call snapshot
//!
//! A `Call` is an immutable value handed out by the registry. Updates produce
//! a new snapshot through the `with_*` builders; nothing downstream of the
//! registry mutates a call in place.

use crate::domain::call::value_object::{CallCapabilities, CallState, DisconnectCause};
use crate::domain::shared::value_objects::{number_from_handle, CallId, Handle, PhoneAccountHandle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Routing through a third-party calling service for an outgoing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayInfo {
    /// Package of the app providing the gateway
    pub provider_package: String,
    /// Number actually dialed through the gateway
    pub gateway_handle: Option<Handle>,
    /// Number the user dialed
    pub original_handle: Option<Handle>,
}

impl GatewayInfo {
    pub fn new(
        provider_package: impl Into<String>,
        gateway_handle: Option<Handle>,
        original_handle: Option<Handle>,
    ) -> Self {
        Self {
            provider_package: provider_package.into(),
            gateway_handle,
            original_handle,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.provider_package.is_empty() || self.gateway_handle.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    id: CallId,
    state: CallState,
    disconnect_cause: DisconnectCause,
    capabilities: CallCapabilities,
    /// Call represents several merged parties
    conference: bool,
    video: bool,
    handle: Option<Handle>,
    /// Caller name supplied by the network (CNAP)
    cnap_name: Option<String>,
    gateway_info: Option<GatewayInfo>,
    account_handle: Option<PhoneAccountHandle>,
    connect_time: Option<DateTime<Utc>>,
}

impl Call {
    pub fn new(id: CallId, state: CallState) -> Self {
        Self {
            id,
            state,
            disconnect_cause: DisconnectCause::NotValid,
            capabilities: CallCapabilities::NONE,
            conference: false,
            video: false,
            handle: None,
            cnap_name: None,
            gateway_info: None,
            account_handle: None,
            connect_time: None,
        }
    }

    pub fn with_state(mut self, state: CallState) -> Self {
        self.state = state;
        self
    }

    pub fn with_disconnect_cause(mut self, cause: DisconnectCause) -> Self {
        self.disconnect_cause = cause;
        self
    }

    pub fn with_capabilities(mut self, capabilities: CallCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_conference(mut self, conference: bool) -> Self {
        self.conference = conference;
        self
    }

    pub fn with_video(mut self, video: bool) -> Self {
        self.video = video;
        self
    }

    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_cnap_name(mut self, name: impl Into<String>) -> Self {
        self.cnap_name = Some(name.into());
        self
    }

    pub fn with_gateway_info(mut self, gateway_info: GatewayInfo) -> Self {
        self.gateway_info = Some(gateway_info);
        self
    }

    pub fn with_account_handle(mut self, account_handle: PhoneAccountHandle) -> Self {
        self.account_handle = Some(account_handle);
        self
    }

    pub fn with_connect_time(mut self, connect_time: DateTime<Utc>) -> Self {
        self.connect_time = Some(connect_time);
        self
    }

    pub fn id(&self) -> &CallId {
        &self.id
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn disconnect_cause(&self) -> &DisconnectCause {
        &self.disconnect_cause
    }

    pub fn capabilities(&self) -> CallCapabilities {
        self.capabilities
    }

    pub fn can(&self, capability: CallCapabilities) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn is_conference_call(&self) -> bool {
        self.conference
    }

    pub fn is_video_call(&self) -> bool {
        self.video
    }

    pub fn is_sip_call(&self) -> bool {
        self.handle.as_ref().is_some_and(Handle::is_sip)
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }

    /// Number shown for this call, empty when the handle is unknown
    pub fn number(&self) -> String {
        number_from_handle(self.handle.as_ref())
    }

    pub fn cnap_name(&self) -> Option<&str> {
        self.cnap_name.as_deref()
    }

    pub fn gateway_info(&self) -> Option<&GatewayInfo> {
        self.gateway_info.as_ref()
    }

    pub fn account_handle(&self) -> Option<&PhoneAccountHandle> {
        self.account_handle.as_ref()
    }

    pub fn connect_time(&self) -> Option<DateTime<Utc>> {
        self.connect_time
    }

    pub fn is_incoming(&self) -> bool {
        self.state == CallState::Incoming
    }

    /// Same call, regardless of how its state has changed between snapshots
    pub fn is_same_call(&self, other: &Call) -> bool {
        self.id == other.id
    }
}

/// Null-safe identity comparison: both absent are the same, one absent differs.
pub fn are_calls_same(a: Option<&Call>, b: Option<&Call>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.is_same_call(b),
        _ => false,
    }
}
