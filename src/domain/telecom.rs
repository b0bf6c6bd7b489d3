//! Telecom actions triggered from the call card

use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CallId;
use async_trait::async_trait;

/// Request the coordinator asks the service to forward to the telecom stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelecomRequest {
    Disconnect(CallId),
    Unhold(CallId),
    PhoneAccountClicked(CallId),
}

impl TelecomRequest {
    pub fn call_id(&self) -> &CallId {
        match self {
            TelecomRequest::Disconnect(id)
            | TelecomRequest::Unhold(id)
            | TelecomRequest::PhoneAccountClicked(id) => id,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelecomAdapter: Send + Sync {
    async fn disconnect_call(&self, call_id: &CallId) -> Result<()>;

    async fn unhold_call(&self, call_id: &CallId) -> Result<()>;

    async fn phone_account_clicked(&self, call_id: &CallId) -> Result<()>;
}

/// Forward a request to the adapter.
pub async fn dispatch(adapter: &dyn TelecomAdapter, request: &TelecomRequest) -> Result<()> {
    match request {
        TelecomRequest::Disconnect(id) => adapter.disconnect_call(id).await,
        TelecomRequest::Unhold(id) => adapter.unhold_call(id).await,
        TelecomRequest::PhoneAccountClicked(id) => adapter.phone_account_clicked(id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatch_routes_requests() {
        let mut adapter = MockTelecomAdapter::new();
        adapter
            .expect_disconnect_call()
            .withf(|id| id.as_str() == "c1")
            .times(1)
            .returning(|_| Ok(()));
        adapter
            .expect_unhold_call()
            .withf(|id| id.as_str() == "c2")
            .times(1)
            .returning(|_| Ok(()));

        dispatch(&adapter, &TelecomRequest::Disconnect(CallId::from("c1")))
            .await
            .unwrap();
        dispatch(&adapter, &TelecomRequest::Unhold(CallId::from("c2")))
            .await
            .unwrap();
    }

    #[test]
    fn test_request_call_id() {
        let id = CallId::from("c3");
        assert_eq!(TelecomRequest::Disconnect(id.clone()).call_id(), &id);
        assert_eq!(TelecomRequest::PhoneAccountClicked(id.clone()).call_id(), &id);
    }
}
