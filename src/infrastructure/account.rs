//! In-memory account provider

use crate::config::TelephonyConfig;
use crate::domain::account::{AccountProvider, PhoneAccount};
use crate::domain::shared::error::LookupError;
use crate::domain::shared::phone_number;
use crate::domain::shared::value_objects::PhoneAccountHandle;
use std::collections::HashMap;

/// Account provider backed by fixed tables, configured up front
#[derive(Debug, Clone, Default)]
pub struct StaticAccountProvider {
    accounts: HashMap<PhoneAccountHandle, PhoneAccount>,
    application_labels: HashMap<String, String>,
    line_number: Option<String>,
    emergency_numbers: Vec<String>,
}

impl StaticAccountProvider {
    pub fn new(config: &TelephonyConfig) -> Self {
        Self {
            accounts: HashMap::new(),
            application_labels: HashMap::new(),
            line_number: config.line_number.clone(),
            emergency_numbers: config.emergency_numbers.clone(),
        }
    }

    pub fn with_account(mut self, account: PhoneAccount) -> Self {
        self.accounts.insert(account.handle.clone(), account);
        self
    }

    pub fn with_application_label(mut self, package: impl Into<String>, label: impl Into<String>) -> Self {
        self.application_labels.insert(package.into(), label.into());
        self
    }

    pub fn with_line_number(mut self, number: impl Into<String>) -> Self {
        self.line_number = Some(number.into());
        self
    }
}

impl AccountProvider for StaticAccountProvider {
    fn phone_account(&self, handle: &PhoneAccountHandle) -> Option<PhoneAccount> {
        self.accounts.get(handle).cloned()
    }

    fn line_number(&self) -> Option<String> {
        self.line_number.clone()
    }

    fn is_emergency_number(&self, number: &str) -> bool {
        phone_number::is_emergency_number(number, &self.emergency_numbers)
    }

    fn compare_numbers(&self, a: &str, b: &str) -> bool {
        phone_number::compare(a, b)
    }

    fn application_label(&self, package: &str) -> Result<String, LookupError> {
        self.application_labels
            .get(package)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(format!("application {}", package)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::value_objects::Icon;

    #[test]
    fn test_lookups() {
        let handle = PhoneAccountHandle::new("sim", "1");
        let provider = StaticAccountProvider::new(&TelephonyConfig::default())
            .with_account(
                PhoneAccount::new(handle.clone())
                    .with_label("SIM 1")
                    .with_icon(Icon::new("ic_sim")),
            )
            .with_application_label("com.example.gateway", "Gateway Dialer")
            .with_line_number("6505551234");

        assert_eq!(provider.phone_account(&handle).unwrap().label.as_deref(), Some("SIM 1"));
        assert!(provider.phone_account(&PhoneAccountHandle::new("sim", "2")).is_none());
        assert_eq!(provider.line_number().as_deref(), Some("6505551234"));
        assert_eq!(
            provider.application_label("com.example.gateway").unwrap(),
            "Gateway Dialer"
        );
        assert!(matches!(
            provider.application_label("com.missing"),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_emergency_numbers_follow_config() {
        let config = TelephonyConfig {
            line_number: None,
            emergency_numbers: vec!["123".to_string()],
        };
        let provider = StaticAccountProvider::new(&config);
        assert!(provider.is_emergency_number("123"));
        assert!(!provider.is_emergency_number("911"));
    }
}
