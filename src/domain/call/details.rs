//! Extra call details pushed by the telecom stack after a call is set up

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Extras key carrying the number the network will call back on
pub const EXTRA_CALL_BACK_NUMBER: &str = "callback_number";

/// Provider hints about how to present a call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHints {
    pub label: Option<String>,
    pub extras: Option<HashMap<String, String>>,
}

impl StatusHints {
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.as_ref()?.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDetails {
    pub status_hints: Option<StatusHints>,
}

impl CallDetails {
    /// Details whose status hints carry a callback number
    pub fn with_callback_number(number: impl Into<String>) -> Self {
        let mut extras = HashMap::new();
        extras.insert(EXTRA_CALL_BACK_NUMBER.to_string(), number.into());
        Self {
            status_hints: Some(StatusHints {
                label: None,
                extras: Some(extras),
            }),
        }
    }
}
