//! Picks which calls the call card shows in its primary and secondary slots

use crate::domain::call::{Call, CallRegistry, InCallState};
use tracing::debug;

/// Calls chosen for display. Never the same call in both slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub primary: Option<Call>,
    pub secondary: Option<Call>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }
}

/// Compute the primary and secondary call from scratch for a registry snapshot.
pub fn select_primary_and_secondary(registry: &dyn CallRegistry, state: InCallState) -> Selection {
    let (primary, secondary) = match state {
        InCallState::Incoming => (registry.incoming_call().cloned(), None),
        InCallState::Outgoing => {
            let primary = registry.outgoing_call().cloned();
            // The ladder never returns incoming or outgoing calls, so it can
            // only pick something other than the dialing call.
            let secondary = call_to_display(registry, primary.as_ref(), true);
            (primary, secondary)
        }
        InCallState::InCall => {
            let primary = call_to_display(registry, None, false);
            let secondary = call_to_display(registry, primary.as_ref(), true);
            (primary, secondary)
        }
        InCallState::NoCalls => (None, None),
    };

    debug!(
        "Selected primary {:?}, secondary {:?}",
        primary.as_ref().map(|c| c.id().as_str()),
        secondary.as_ref().map(|c| c.id().as_str())
    );

    Selection { primary, secondary }
}

/// Highest-priority call to display, skipping `ignore`.
///
/// Active call first, then (unless `skip_disconnected`) the call being or just
/// disconnected so the user sees it end, then calls on hold.
pub fn call_to_display(
    registry: &dyn CallRegistry,
    ignore: Option<&Call>,
    skip_disconnected: bool,
) -> Option<Call> {
    let eligible = |call: Option<&Call>| -> Option<Call> {
        call.filter(|c| ignore.map_or(true, |ignored| !c.is_same_call(ignored)))
            .cloned()
    };

    if let Some(call) = eligible(registry.active_call()) {
        return Some(call);
    }

    if !skip_disconnected {
        if let Some(call) = eligible(registry.disconnecting_call()) {
            return Some(call);
        }
        if let Some(call) = eligible(registry.disconnected_call()) {
            return Some(call);
        }
    }

    if let Some(call) = eligible(registry.background_call()) {
        return Some(call);
    }

    eligible(registry.second_background_call())
}
