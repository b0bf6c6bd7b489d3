//! Contact cache entry

use crate::domain::call::Call;
use crate::domain::shared::value_objects::Photo;

/// Name displayed for conference calls, which never get a contact lookup
pub const CONFERENCE_CALL_NAME: &str = "Conference call";

/// Resolved contact data for one call.
///
/// Entries are delivered whole and replaced whole; a newer entry for the same
/// call supersedes the older one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactCacheEntry {
    pub name: Option<String>,
    pub number: Option<String>,
    /// Geocoded location, e.g. "Mountain View, CA"
    pub location: Option<String>,
    /// Number type label, e.g. "Mobile"
    pub label: Option<String>,
    pub photo: Option<Photo>,
    pub contact_uri: Option<String>,
    pub is_sip_call: bool,
}

impl ContactCacheEntry {
    /// Placeholder built from the call itself, shown until a lookup completes.
    pub fn from_call(call: &Call) -> Self {
        let number = call.number();
        Self {
            name: call.cnap_name().filter(|n| !n.is_empty()).map(str::to_string),
            number: (!number.is_empty()).then_some(number),
            is_sip_call: call.is_sip_call(),
            ..Default::default()
        }
    }

    /// Generic entry for a merged conference call
    pub fn conference() -> Self {
        Self {
            name: Some(CONFERENCE_CALL_NAME.to_string()),
            ..Default::default()
        }
    }

    pub fn with_photo(mut self, photo: Photo) -> Self {
        self.photo = Some(photo);
        self
    }

    fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Name to show: the contact name, or the number for unknown callers.
    pub fn display_name(&self) -> Option<&str> {
        if self.has_name() {
            self.name.as_deref()
        } else {
            self.number.as_deref()
        }
    }

    /// Second line to show. When the number already stands in for the name,
    /// show the location instead of repeating it.
    pub fn display_number(&self) -> Option<&str> {
        if self.has_name() {
            self.number.as_deref()
        } else {
            self.location.as_deref()
        }
    }

    pub fn name_is_number(&self) -> bool {
        match (self.display_name(), self.number.as_deref()) {
            (Some(name), Some(number)) => name == number,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::CallState;
    use crate::domain::shared::value_objects::{CallId, Handle};

    #[test]
    fn test_display_falls_back_to_number_and_location() {
        let entry = ContactCacheEntry {
            name: Some(String::new()),
            number: Some("555".to_string()),
            location: Some("Mobile".to_string()),
            ..Default::default()
        };

        assert_eq!(entry.display_name(), Some("555"));
        assert_eq!(entry.display_number(), Some("Mobile"));
        assert!(entry.name_is_number());
    }

    #[test]
    fn test_display_with_name() {
        let entry = ContactCacheEntry {
            name: Some("Alice".to_string()),
            number: Some("555".to_string()),
            location: Some("Mobile".to_string()),
            ..Default::default()
        };

        assert_eq!(entry.display_name(), Some("Alice"));
        assert_eq!(entry.display_number(), Some("555"));
        assert!(!entry.name_is_number());
    }

    #[test]
    fn test_placeholder_from_call() {
        let call = Call::new(CallId::from("c1"), CallState::Incoming)
            .with_handle(Handle::sip("bob@example.com"))
            .with_cnap_name("BOB SMITH");

        let entry = ContactCacheEntry::from_call(&call);
        assert_eq!(entry.name.as_deref(), Some("BOB SMITH"));
        assert_eq!(entry.number.as_deref(), Some("bob@example.com"));
        assert!(entry.is_sip_call);
        assert!(entry.photo.is_none());
    }

    #[test]
    fn test_placeholder_without_handle() {
        let call = Call::new(CallId::from("c1"), CallState::Incoming);
        let entry = ContactCacheEntry::from_call(&call);
        assert!(entry.display_name().is_none());
        assert!(!entry.name_is_number());
    }
}
