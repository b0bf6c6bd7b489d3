//! Call registry: the set of calls currently known to the telephony stack

use crate::domain::call::aggregate::Call;
use crate::domain::call::value_object::{CallState, InCallState};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CallId;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Query surface over the registry.
///
/// Each query returns at most one call. At most one call is active at a time.
pub trait CallRegistry: Send + Sync {
    fn active_call(&self) -> Option<&Call>;

    fn incoming_call(&self) -> Option<&Call>;

    fn outgoing_call(&self) -> Option<&Call>;

    fn disconnecting_call(&self) -> Option<&Call>;

    fn disconnected_call(&self) -> Option<&Call>;

    /// First call on hold
    fn background_call(&self) -> Option<&Call>;

    /// Second call on hold, if two are held at once
    fn second_background_call(&self) -> Option<&Call>;
}

/// In-memory registry in arrival order
#[derive(Debug, Clone, Default)]
pub struct CallList {
    calls: Vec<Call>,
}

/// Registry shared between the publisher and the coordinator
pub type SharedCallList = Arc<RwLock<CallList>>;

impl CallList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new call or replace the snapshot of a known one.
    pub fn update(&mut self, call: Call) -> Result<()> {
        match self.calls.iter_mut().find(|c| c.is_same_call(&call)) {
            Some(existing) => {
                if !existing.state().can_transition_to(&call.state()) {
                    return Err(DomainError::InvalidStateTransition(format!(
                        "Call {} cannot move from {} to {}",
                        call.id(),
                        existing.state(),
                        call.state()
                    )));
                }
                debug!("Call {} {} -> {}", call.id(), existing.state(), call.state());
                *existing = call;
            }
            None => {
                debug!("Call {} added as {}", call.id(), call.state());
                self.calls.push(call);
            }
        }
        Ok(())
    }

    /// Remove a call once it is gone for good.
    pub fn remove(&mut self, id: &CallId) -> Result<Call> {
        let index = self
            .calls
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| DomainError::NotFound(format!("Call {}", id)))?;
        Ok(self.calls.remove(index))
    }

    pub fn get(&self, id: &CallId) -> Option<&Call> {
        self.calls.iter().find(|c| c.id() == id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Screen state implied by the current calls
    pub fn in_call_state(&self) -> InCallState {
        if self.incoming_call().is_some() {
            InCallState::Incoming
        } else if self.outgoing_call().is_some() {
            InCallState::Outgoing
        } else if !self.calls.is_empty() {
            InCallState::InCall
        } else {
            InCallState::NoCalls
        }
    }

    fn nth_with_state(&self, state: CallState, n: usize) -> Option<&Call> {
        self.calls.iter().filter(|c| c.state() == state).nth(n)
    }
}

impl CallRegistry for CallList {
    fn active_call(&self) -> Option<&Call> {
        self.nth_with_state(CallState::Active, 0)
    }

    fn incoming_call(&self) -> Option<&Call> {
        self.nth_with_state(CallState::Incoming, 0)
    }

    fn outgoing_call(&self) -> Option<&Call> {
        self.nth_with_state(CallState::Outgoing, 0)
    }

    fn disconnecting_call(&self) -> Option<&Call> {
        self.nth_with_state(CallState::Disconnecting, 0)
    }

    fn disconnected_call(&self) -> Option<&Call> {
        self.nth_with_state(CallState::Disconnected, 0)
    }

    fn background_call(&self) -> Option<&Call> {
        self.nth_with_state(CallState::Background, 0)
    }

    fn second_background_call(&self) -> Option<&Call> {
        self.nth_with_state(CallState::Background, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str, state: CallState) -> Call {
        Call::new(CallId::from(id), state)
    }

    #[test]
    fn test_queries_by_state() {
        let mut list = CallList::new();
        list.update(call("a", CallState::Active)).unwrap();
        list.update(call("b", CallState::Background)).unwrap();
        list.update(call("c", CallState::Background)).unwrap();

        assert_eq!(list.active_call().unwrap().id().as_str(), "a");
        assert_eq!(list.background_call().unwrap().id().as_str(), "b");
        assert_eq!(list.second_background_call().unwrap().id().as_str(), "c");
        assert!(list.incoming_call().is_none());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_update_replaces_snapshot() {
        let mut list = CallList::new();
        list.update(call("a", CallState::Incoming)).unwrap();
        list.update(call("a", CallState::Active)).unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list.get(&CallId::from("a")).unwrap().state(), CallState::Active);
    }

    #[test]
    fn test_update_rejects_invalid_transition() {
        let mut list = CallList::new();
        list.update(call("a", CallState::Disconnected)).unwrap();

        let result = list.update(call("a", CallState::Active));
        assert!(matches!(result, Err(DomainError::InvalidStateTransition(_))));
    }

    #[test]
    fn test_remove() {
        let mut list = CallList::new();
        list.update(call("a", CallState::Active)).unwrap();

        assert!(list.remove(&CallId::from("a")).is_ok());
        assert!(list.is_empty());
        assert!(matches!(
            list.remove(&CallId::from("a")),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn test_in_call_state() {
        let mut list = CallList::new();
        assert_eq!(list.in_call_state(), InCallState::NoCalls);

        list.update(call("a", CallState::Active)).unwrap();
        assert_eq!(list.in_call_state(), InCallState::InCall);

        list.update(call("b", CallState::Outgoing)).unwrap();
        assert_eq!(list.in_call_state(), InCallState::Outgoing);

        list.update(call("c", CallState::Incoming)).unwrap();
        assert_eq!(list.in_call_state(), InCallState::Incoming);
    }
}
