//! Phone accounts and telephony facts needed to label a call

use crate::domain::shared::error::LookupError;
use crate::domain::shared::value_objects::{Icon, PhoneAccountHandle};

/// A registered way of placing calls (SIM slot, VoIP provider)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneAccount {
    pub handle: PhoneAccountHandle,
    pub label: Option<String>,
    pub icon: Option<Icon>,
    /// Number of the subscription behind the account, used as an emergency callback number
    pub subscription_number: Option<String>,
}

impl PhoneAccount {
    pub fn new(handle: PhoneAccountHandle) -> Self {
        Self {
            handle,
            label: None,
            icon: None,
            subscription_number: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_subscription_number(mut self, number: impl Into<String>) -> Self {
        self.subscription_number = Some(number.into());
        self
    }
}

/// Account and telephony information provider
#[cfg_attr(test, mockall::automock)]
pub trait AccountProvider: Send + Sync {
    fn phone_account(&self, handle: &PhoneAccountHandle) -> Option<PhoneAccount>;

    /// This device's own line number, if the network reports it
    fn line_number(&self) -> Option<String>;

    fn is_emergency_number(&self, number: &str) -> bool;

    /// Format-tolerant number equality
    fn compare_numbers(&self, a: &str, b: &str) -> bool;

    /// User-visible name of the app behind a gateway package
    fn application_label(&self, package: &str) -> Result<String, LookupError>;
}
