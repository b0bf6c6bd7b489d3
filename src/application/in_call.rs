//! In-call state notifications
//!
//! [`CallListPublisher`] owns the shared call list. Every update is applied to
//! the list and then broadcast through [`InCallNotifier`] to whoever is
//! subscribed, e.g. a running call card service.

use crate::domain::call::{Call, CallDetails, CallList, InCallState, SharedCallList};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CallId;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Change published to in-call listeners
#[derive(Debug, Clone)]
pub enum InCallEvent {
    StateChanged { state: InCallState, calls: CallList },
    IncomingCall { state: InCallState, call: Call },
    DetailsChanged(CallDetails),
}

/// Broadcast hub for in-call events
#[derive(Debug, Clone)]
pub struct InCallNotifier {
    tx: broadcast::Sender<InCallEvent>,
}

impl InCallNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: InCallEvent) {
        // No subscribers is normal while no call card is showing
        if self.tx.send(event).is_err() {
            debug!("In-call event published with no listeners");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InCallEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for InCallNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Applies call updates to the shared list and publishes the outcome
pub struct CallListPublisher {
    calls: SharedCallList,
    notifier: InCallNotifier,
}

impl CallListPublisher {
    pub fn new(notifier: InCallNotifier) -> Self {
        Self {
            calls: Arc::new(RwLock::new(CallList::new())),
            notifier,
        }
    }

    /// Shared handle to the list, for the coordinator
    pub fn calls(&self) -> SharedCallList {
        self.calls.clone()
    }

    pub fn notifier(&self) -> &InCallNotifier {
        &self.notifier
    }

    pub fn snapshot(&self) -> CallList {
        self.calls.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Add or update a call. A call that just started ringing is announced
    /// as an incoming call, everything else as a state change.
    pub fn update_call(&self, call: Call) -> Result<()> {
        let event = {
            let mut calls = self.calls.write().unwrap_or_else(PoisonError::into_inner);
            let newly_incoming =
                call.is_incoming() && calls.get(call.id()).map_or(true, |c| !c.is_incoming());

            calls.update(call.clone()).inspect_err(|e| {
                warn!("Rejected update for call {}: {}", call.id(), e);
            })?;

            let state = calls.in_call_state();
            if newly_incoming {
                InCallEvent::IncomingCall { state, call }
            } else {
                InCallEvent::StateChanged {
                    state,
                    calls: calls.clone(),
                }
            }
        };

        self.notifier.publish(event);
        Ok(())
    }

    /// Drop a call that is gone for good.
    pub fn remove_call(&self, id: &CallId) -> Result<Call> {
        let (removed, event) = {
            let mut calls = self.calls.write().unwrap_or_else(PoisonError::into_inner);
            let removed = calls.remove(id)?;
            let event = InCallEvent::StateChanged {
                state: calls.in_call_state(),
                calls: calls.clone(),
            };
            (removed, event)
        };

        self.notifier.publish(event);
        Ok(removed)
    }

    pub fn details_changed(&self, details: CallDetails) {
        self.notifier.publish(InCallEvent::DetailsChanged(details));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::CallState;
    use crate::domain::DomainError;

    #[tokio::test]
    async fn test_new_incoming_call_is_announced() {
        let notifier = InCallNotifier::new(16);
        let mut rx = notifier.subscribe();
        let publisher = CallListPublisher::new(notifier);

        publisher
            .update_call(Call::new(CallId::from("c1"), CallState::Incoming))
            .unwrap();

        match rx.recv().await.unwrap() {
            InCallEvent::IncomingCall { state, call } => {
                assert_eq!(state, InCallState::Incoming);
                assert_eq!(call.id().as_str(), "c1");
            }
            other => panic!("unexpected event {:?}", other),
        }

        publisher
            .update_call(Call::new(CallId::from("c1"), CallState::Active))
            .unwrap();

        match rx.recv().await.unwrap() {
            InCallEvent::StateChanged { state, calls } => {
                assert_eq!(state, InCallState::InCall);
                assert_eq!(calls.len(), 1);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remove_publishes_remaining_calls() {
        let notifier = InCallNotifier::new(16);
        let publisher = CallListPublisher::new(notifier.clone());
        publisher
            .update_call(Call::new(CallId::from("c1"), CallState::Active))
            .unwrap();

        let mut rx = notifier.subscribe();
        publisher.remove_call(&CallId::from("c1")).unwrap();

        match rx.recv().await.unwrap() {
            InCallEvent::StateChanged { state, calls } => {
                assert_eq!(state, InCallState::NoCalls);
                assert!(calls.is_empty());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_invalid_update_is_not_published() {
        let notifier = InCallNotifier::new(16);
        let mut rx = notifier.subscribe();
        let publisher = CallListPublisher::new(notifier);

        publisher
            .update_call(Call::new(CallId::from("c1"), CallState::Disconnected))
            .unwrap();
        let _ = rx.try_recv();

        let result = publisher.update_call(Call::new(CallId::from("c1"), CallState::Active));
        assert!(matches!(result, Err(DomainError::InvalidStateTransition(_))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let notifier = InCallNotifier::default();
        assert_eq!(notifier.subscriber_count(), 0);
        notifier.publish(InCallEvent::DetailsChanged(CallDetails::default()));
    }
}
