//! Shared value objects used across multiple bounded contexts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Call identifier
///
/// Opaque to this crate: the telephony stack hands out the ids and equality is
/// the only operation the coordinator relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(String);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for CallId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CallId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a call endpoint, e.g. `tel:5551234` or `sip:alice@example.com`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    scheme: String,
    scheme_specific_part: String,
}

impl Handle {
    pub const SCHEME_TEL: &'static str = "tel";
    pub const SCHEME_SIP: &'static str = "sip";
    pub const SCHEME_VOICEMAIL: &'static str = "voicemail";

    pub fn new(scheme: impl Into<String>, scheme_specific_part: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            scheme_specific_part: scheme_specific_part.into(),
        }
    }

    pub fn tel(number: impl Into<String>) -> Self {
        Self::new(Self::SCHEME_TEL, number)
    }

    pub fn sip(address: impl Into<String>) -> Self {
        Self::new(Self::SCHEME_SIP, address)
    }

    /// Parse `scheme:part`. A string without a scheme is treated as a `tel` number.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((scheme, part)) if !scheme.is_empty() => Self::new(scheme, part),
            _ => Self::tel(raw),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn scheme_specific_part(&self) -> &str {
        &self.scheme_specific_part
    }

    pub fn is_sip(&self) -> bool {
        self.scheme.eq_ignore_ascii_case(Self::SCHEME_SIP)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.scheme_specific_part)
    }
}

/// Number shown for a handle: its scheme-specific part, or empty when absent.
pub fn number_from_handle(handle: Option<&Handle>) -> String {
    handle
        .map(|h| h.scheme_specific_part().to_string())
        .unwrap_or_default()
}

/// Identifies the phone account (SIM, VoIP provider) a call is placed through
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneAccountHandle {
    pub component: String,
    pub id: String,
}

impl PhoneAccountHandle {
    pub fn new(component: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for PhoneAccountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component, self.id)
    }
}

/// Contact photo. Cheap to clone; the bytes are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    source: String,
    data: Arc<[u8]>,
}

impl Photo {
    pub fn new(source: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            source: source.into(),
            data: data.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Icon resource for a phone account or provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Icon(String);

impl Icon {
    pub fn new(resource: impl Into<String>) -> Self {
        Self(resource.into())
    }

    pub fn resource(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_parse() {
        let handle = Handle::parse("tel:5551234");
        assert_eq!(handle.scheme(), "tel");
        assert_eq!(handle.scheme_specific_part(), "5551234");
        assert!(!handle.is_sip());

        let sip = Handle::parse("sip:alice@example.com");
        assert!(sip.is_sip());
        assert_eq!(sip.scheme_specific_part(), "alice@example.com");

        let bare = Handle::parse("911");
        assert_eq!(bare.scheme(), "tel");
        assert_eq!(bare.to_string(), "tel:911");
    }

    #[test]
    fn test_number_from_handle() {
        assert_eq!(number_from_handle(None), "");
        assert_eq!(number_from_handle(Some(&Handle::tel("555"))), "555");
    }

    #[test]
    fn test_call_id_equality() {
        let a = CallId::from("call-1");
        assert_eq!(a, CallId::from("call-1".to_string()));
        assert_ne!(CallId::new(), CallId::new());
    }
}
