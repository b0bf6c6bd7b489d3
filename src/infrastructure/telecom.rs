//! Telecom adapter that acts directly on the published call list

use crate::application::in_call::CallListPublisher;
use crate::domain::call::{CallRegistry, CallState, DisconnectCause};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CallId;
use crate::domain::telecom::TelecomAdapter;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Applies call card requests to a [`CallListPublisher`], so every change
/// flows back out as an in-call event.
pub struct CallListTelecomAdapter {
    publisher: Arc<CallListPublisher>,
}

impl CallListTelecomAdapter {
    pub fn new(publisher: Arc<CallListPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl TelecomAdapter for CallListTelecomAdapter {
    async fn disconnect_call(&self, call_id: &CallId) -> Result<()> {
        let call = self
            .publisher
            .snapshot()
            .get(call_id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("Call {}", call_id)))?;

        info!("Disconnecting call {}", call_id);
        self.publisher.update_call(
            call.with_state(CallState::Disconnected)
                .with_disconnect_cause(DisconnectCause::Local),
        )
    }

    async fn unhold_call(&self, call_id: &CallId) -> Result<()> {
        let calls = self.publisher.snapshot();
        let target = calls
            .get(call_id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("Call {}", call_id)))?;

        if target.state() != CallState::Background {
            return Err(DomainError::InvalidOperation(format!(
                "Call {} is {}, not on hold",
                call_id,
                target.state()
            )));
        }

        // Swap: whatever is active goes on hold first
        if let Some(active) = calls.active_call().filter(|c| c.id() != call_id) {
            info!("Holding call {}", active.id());
            self.publisher
                .update_call(active.clone().with_state(CallState::Background))?;
        }

        info!("Unholding call {}", call_id);
        self.publisher.update_call(target.with_state(CallState::Active))
    }

    async fn phone_account_clicked(&self, call_id: &CallId) -> Result<()> {
        info!("Phone account clicked for call {}", call_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::in_call::InCallNotifier;
    use crate::domain::call::Call;

    fn publisher_with(calls: &[(&str, CallState)]) -> Arc<CallListPublisher> {
        let publisher = Arc::new(CallListPublisher::new(InCallNotifier::new(16)));
        for (id, state) in calls {
            publisher
                .update_call(Call::new(CallId::from(*id), *state))
                .unwrap();
        }
        publisher
    }

    #[tokio::test]
    async fn test_disconnect() {
        let publisher = publisher_with(&[("c1", CallState::Active)]);
        let adapter = CallListTelecomAdapter::new(publisher.clone());

        tokio_test::assert_ok!(adapter.disconnect_call(&CallId::from("c1")).await);

        let calls = publisher.snapshot();
        let call = calls.get(&CallId::from("c1")).unwrap();
        assert_eq!(call.state(), CallState::Disconnected);
        assert_eq!(call.disconnect_cause(), &DisconnectCause::Local);
    }

    #[tokio::test]
    async fn test_unhold_swaps_calls() {
        let publisher = publisher_with(&[("a", CallState::Active), ("b", CallState::Background)]);
        let adapter = CallListTelecomAdapter::new(publisher.clone());

        tokio_test::assert_ok!(adapter.unhold_call(&CallId::from("b")).await);

        let calls = publisher.snapshot();
        assert_eq!(calls.get(&CallId::from("a")).unwrap().state(), CallState::Background);
        assert_eq!(calls.get(&CallId::from("b")).unwrap().state(), CallState::Active);
    }

    #[tokio::test]
    async fn test_unhold_rejects_unheld_call() {
        let publisher = publisher_with(&[("a", CallState::Active)]);
        let adapter = CallListTelecomAdapter::new(publisher);

        let err = tokio_test::assert_err!(adapter.unhold_call(&CallId::from("a")).await);
        assert!(matches!(err, DomainError::InvalidOperation(_)));

        let err = tokio_test::assert_err!(adapter.disconnect_call(&CallId::from("missing")).await);
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
