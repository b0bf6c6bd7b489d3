//! Contact resolver port and the completion messages it reports back with

use crate::domain::call::Call;
use crate::domain::contact::entry::ContactCacheEntry;
use crate::domain::shared::value_objects::CallId;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// Display slot a lookup was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupSlot {
    Primary,
    Secondary,
}

impl LookupSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupSlot::Primary => "primary",
            LookupSlot::Secondary => "secondary",
        }
    }
}

impl fmt::Display for LookupSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two lookup results a completion carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStage {
    /// Name, number, label and location
    ContactInfo,
    /// Photo finished loading after the contact info
    Image,
}

/// Tagged lookup result routed back to the coordinator
#[derive(Debug, Clone)]
pub struct LookupCompletion {
    pub call_id: CallId,
    pub slot: LookupSlot,
    pub stage: LookupStage,
    pub entry: ContactCacheEntry,
}

/// Reply channel handed to the resolver with each request.
///
/// The slot is fixed when the request is issued, so every completion arrives
/// tagged with `(call_id, slot)`.
#[derive(Debug, Clone)]
pub struct ContactLookupCallback {
    slot: LookupSlot,
    tx: mpsc::UnboundedSender<LookupCompletion>,
}

impl ContactLookupCallback {
    pub fn new(slot: LookupSlot, tx: mpsc::UnboundedSender<LookupCompletion>) -> Self {
        Self { slot, tx }
    }

    pub fn slot(&self) -> LookupSlot {
        self.slot
    }

    pub fn on_contact_info_complete(&self, call_id: CallId, entry: ContactCacheEntry) {
        self.send(call_id, LookupStage::ContactInfo, entry);
    }

    pub fn on_image_load_complete(&self, call_id: CallId, entry: ContactCacheEntry) {
        self.send(call_id, LookupStage::Image, entry);
    }

    fn send(&self, call_id: CallId, stage: LookupStage, entry: ContactCacheEntry) {
        let completion = LookupCompletion {
            call_id,
            slot: self.slot,
            stage,
            entry,
        };
        if self.tx.send(completion).is_err() {
            // Coordinator is gone; nobody is left to display the result
            debug!("Dropping {:?} completion, coordinator closed", stage);
        }
    }
}

/// Asynchronous contact lookup.
///
/// `find_info` must not block: it starts the lookup and returns. The callback
/// is invoked at most once per stage, contact info before image.
pub trait ContactResolver: Send + Sync {
    fn find_info(&self, call: &Call, is_incoming: bool, callback: ContactLookupCallback);

    /// Record that a contact was shown to the user.
    fn send_view_notification(&self, _contact_uri: &str) {}

    /// Drop everything remembered about past calls.
    fn clear_cache(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_tags_completions() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback = ContactLookupCallback::new(LookupSlot::Secondary, tx);

        callback.on_contact_info_complete(CallId::from("c1"), ContactCacheEntry::default());
        callback.on_image_load_complete(CallId::from("c1"), ContactCacheEntry::default());

        let first = rx.try_recv().unwrap();
        assert_eq!(first.call_id, CallId::from("c1"));
        assert_eq!(first.slot, LookupSlot::Secondary);
        assert_eq!(first.stage, LookupStage::ContactInfo);

        let second = rx.try_recv().unwrap();
        assert_eq!(second.stage, LookupStage::Image);
    }

    #[test]
    fn test_callback_survives_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let callback = ContactLookupCallback::new(LookupSlot::Primary, tx);
        callback.on_contact_info_complete(CallId::from("c1"), ContactCacheEntry::default());
    }
}
