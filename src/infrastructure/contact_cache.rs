//! Contact info cache: resolves contact entries for calls against a directory backend

use crate::config::ContactsConfig;
use crate::domain::call::Call;
use crate::domain::contact::{ContactCacheEntry, ContactLookupCallback, ContactResolver};
use crate::domain::shared::error::LookupError;
use crate::domain::shared::phone_number;
use crate::domain::shared::value_objects::{CallId, Photo};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Contact as stored in the directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactRecord {
    pub name: Option<String>,
    pub label: Option<String>,
    pub location: Option<String>,
    pub photo_uri: Option<String>,
    pub contact_uri: Option<String>,
}

/// Backend the cache queries (contacts database, remote directory)
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn lookup_number(&self, number: &str) -> Result<Option<ContactRecord>, LookupError>;

    async fn load_photo(&self, photo_uri: &str) -> Result<Option<Photo>, LookupError>;

    /// A contact was shown on the call card
    fn mark_viewed(&self, _contact_uri: &str) {}
}

#[derive(Debug, Clone)]
struct CachedLookup {
    entry: ContactCacheEntry,
    /// Photo stage finished (or there is no photo to load)
    image_done: bool,
}

/// [`ContactResolver`] that runs each lookup as its own task and memoizes
/// successful results per call until the cache is cleared.
pub struct ContactInfoCache {
    directory: Arc<dyn ContactDirectory>,
    load_photos: bool,
    entries: Arc<RwLock<HashMap<CallId, CachedLookup>>>,
}

impl ContactInfoCache {
    pub fn new(directory: Arc<dyn ContactDirectory>, config: &ContactsConfig) -> Self {
        Self {
            directory,
            load_photos: config.load_photos,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn cached_entry(&self, call_id: &CallId) -> Option<ContactCacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(call_id)
            .map(|c| c.entry.clone())
    }

    pub fn cached_calls(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn store(entries: &RwLock<HashMap<CallId, CachedLookup>>, call_id: CallId, lookup: CachedLookup) {
        entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(call_id, lookup);
    }

    async fn lookup(
        directory: Arc<dyn ContactDirectory>,
        entries: Arc<RwLock<HashMap<CallId, CachedLookup>>>,
        load_photos: bool,
        call: Call,
        callback: ContactLookupCallback,
    ) {
        let call_id = call.id().clone();

        let cached = entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&call_id)
            .cloned();
        if let Some(cached) = cached {
            debug!("Contact cache hit for {}", call_id);
            callback.on_contact_info_complete(call_id.clone(), cached.entry.clone());
            // A photo still loading for an earlier request is not waited on
            if cached.image_done && cached.entry.photo.is_some() {
                callback.on_image_load_complete(call_id, cached.entry);
            }
            return;
        }

        let placeholder = ContactCacheEntry::from_call(&call);
        let number = call.number();
        let record = if number.is_empty() || call.is_conference_call() {
            None
        } else {
            match directory.lookup_number(&number).await {
                Ok(record) => record,
                Err(e) => {
                    // Not cached, so the next request for this call retries
                    warn!("Contact lookup for {} failed: {}", call_id, e);
                    callback.on_contact_info_complete(call_id, placeholder);
                    return;
                }
            }
        };

        let photo_uri = record
            .as_ref()
            .and_then(|r| r.photo_uri.clone())
            .filter(|_| load_photos);
        let entry = merge(placeholder, record);

        Self::store(
            &entries,
            call_id.clone(),
            CachedLookup {
                entry: entry.clone(),
                image_done: photo_uri.is_none(),
            },
        );
        callback.on_contact_info_complete(call_id.clone(), entry.clone());

        let Some(photo_uri) = photo_uri else {
            return;
        };

        let photo = match directory.load_photo(&photo_uri).await {
            Ok(photo) => photo,
            Err(e) => {
                warn!("Photo load for {} failed: {}", call_id, e);
                None
            }
        };

        let entry = match photo {
            Some(photo) => entry.with_photo(photo),
            None => entry,
        };
        Self::store(
            &entries,
            call_id.clone(),
            CachedLookup {
                entry: entry.clone(),
                image_done: true,
            },
        );
        if entry.photo.is_some() {
            callback.on_image_load_complete(call_id, entry);
        }
    }
}

impl ContactResolver for ContactInfoCache {
    fn find_info(&self, call: &Call, is_incoming: bool, callback: ContactLookupCallback) {
        debug!(
            "Finding contact info for {} call {} ({} slot)",
            if is_incoming { "incoming" } else { "outgoing" },
            call.id(),
            callback.slot()
        );

        tokio::spawn(Self::lookup(
            self.directory.clone(),
            self.entries.clone(),
            self.load_photos,
            call.clone(),
            callback,
        ));
    }

    fn send_view_notification(&self, contact_uri: &str) {
        self.directory.mark_viewed(contact_uri);
    }

    fn clear_cache(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        debug!("Clearing {} cached contact lookups", entries.len());
        entries.clear();
    }
}

/// Directory data wins over what the network told us; the number always
/// comes from the call itself.
fn merge(placeholder: ContactCacheEntry, record: Option<ContactRecord>) -> ContactCacheEntry {
    let Some(record) = record else {
        return placeholder;
    };

    ContactCacheEntry {
        name: record.name.or(placeholder.name),
        number: placeholder.number,
        location: record.location,
        label: record.label,
        photo: None,
        contact_uri: record.contact_uri,
        is_sip_call: placeholder.is_sip_call,
    }
}

/// Directory held in memory, keyed by normalized number
#[derive(Debug, Default)]
pub struct InMemoryContactDirectory {
    contacts: HashMap<String, ContactRecord>,
    photos: HashMap<String, Photo>,
    latency: Option<Duration>,
    viewed: Mutex<Vec<String>>,
}

impl InMemoryContactDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contact(mut self, number: &str, record: ContactRecord) -> Self {
        self.contacts.insert(phone_number::normalize(number), record);
        self
    }

    pub fn with_photo(mut self, photo_uri: impl Into<String>, photo: Photo) -> Self {
        self.photos.insert(photo_uri.into(), photo);
        self
    }

    /// Delay every lookup and photo load, to simulate a slow backend
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn viewed(&self) -> Vec<String> {
        self.viewed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ContactDirectory for InMemoryContactDirectory {
    async fn lookup_number(&self, number: &str) -> Result<Option<ContactRecord>, LookupError> {
        self.simulate_latency().await;
        Ok(self.contacts.get(&phone_number::normalize(number)).cloned())
    }

    async fn load_photo(&self, photo_uri: &str) -> Result<Option<Photo>, LookupError> {
        self.simulate_latency().await;
        Ok(self.photos.get(photo_uri).cloned())
    }

    fn mark_viewed(&self, contact_uri: &str) {
        info!("Contact viewed: {}", contact_uri);
        self.viewed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(contact_uri.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::CallState;
    use crate::domain::contact::{LookupSlot, LookupStage};
    use crate::domain::shared::value_objects::Handle;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    struct FailingDirectory;

    #[async_trait]
    impl ContactDirectory for FailingDirectory {
        async fn lookup_number(&self, _number: &str) -> Result<Option<ContactRecord>, LookupError> {
            Err(LookupError::Unavailable("offline".to_string()))
        }

        async fn load_photo(&self, _photo_uri: &str) -> Result<Option<Photo>, LookupError> {
            Err(LookupError::Unavailable("offline".to_string()))
        }
    }

    fn alice_directory() -> InMemoryContactDirectory {
        InMemoryContactDirectory::new()
            .with_contact(
                "650-555-1234",
                ContactRecord {
                    name: Some("Alice".to_string()),
                    label: Some("Mobile".to_string()),
                    location: Some("Mountain View, CA".to_string()),
                    photo_uri: Some("photo://alice".to_string()),
                    contact_uri: Some("contact://alice".to_string()),
                },
            )
            .with_photo("photo://alice", Photo::new("photo://alice", vec![1u8, 2, 3]))
    }

    fn incoming(id: &str, number: &str) -> Call {
        Call::new(CallId::from(id), CallState::Incoming).with_handle(Handle::tel(number))
    }

    #[tokio::test]
    async fn test_info_then_image() {
        let cache = ContactInfoCache::new(Arc::new(alice_directory()), &ContactsConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        cache.find_info(
            &incoming("c1", "6505551234"),
            true,
            ContactLookupCallback::new(LookupSlot::Primary, tx),
        );

        let info = rx.recv().await.unwrap();
        assert_eq!(info.stage, LookupStage::ContactInfo);
        assert_eq!(info.slot, LookupSlot::Primary);
        assert_eq!(info.entry.name.as_deref(), Some("Alice"));
        assert_eq!(info.entry.number.as_deref(), Some("6505551234"));
        assert_eq!(info.entry.label.as_deref(), Some("Mobile"));
        assert!(info.entry.photo.is_none());

        let image = rx.recv().await.unwrap();
        assert_eq!(image.stage, LookupStage::Image);
        assert_eq!(image.entry.photo.as_ref().unwrap().data(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unknown_number_keeps_placeholder() {
        let cache = ContactInfoCache::new(Arc::new(alice_directory()), &ContactsConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        cache.find_info(
            &incoming("c2", "555").with_cnap_name("WIRELESS CALLER"),
            true,
            ContactLookupCallback::new(LookupSlot::Secondary, tx),
        );

        let info = rx.recv().await.unwrap();
        assert_eq!(info.entry.name.as_deref(), Some("WIRELESS CALLER"));
        assert_eq!(info.entry.number.as_deref(), Some("555"));

        // No photo stage for an unknown caller
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_placeholder() {
        let cache = ContactInfoCache::new(Arc::new(FailingDirectory), &ContactsConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        cache.find_info(
            &incoming("c3", "6505551234"),
            false,
            ContactLookupCallback::new(LookupSlot::Primary, tx),
        );

        let info = rx.recv().await.unwrap();
        assert!(info.entry.name.is_none());
        assert_eq!(info.entry.display_name(), Some("6505551234"));
    }

    #[tokio::test]
    async fn test_photo_loading_disabled() {
        let config = ContactsConfig { load_photos: false };
        let cache = ContactInfoCache::new(Arc::new(alice_directory()), &config);
        let (tx, mut rx) = mpsc::unbounded_channel();

        cache.find_info(
            &incoming("c4", "6505551234"),
            true,
            ContactLookupCallback::new(LookupSlot::Primary, tx),
        );

        let info = rx.recv().await.unwrap();
        assert_eq!(info.entry.name.as_deref(), Some("Alice"));
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cached_entry_is_replayed() {
        let cache = ContactInfoCache::new(Arc::new(alice_directory()), &ContactsConfig::default());
        let call = incoming("c5", "6505551234");

        let (tx, mut rx) = mpsc::unbounded_channel();
        cache.find_info(&call, true, ContactLookupCallback::new(LookupSlot::Primary, tx));
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        assert!(cache.cached_entry(call.id()).unwrap().photo.is_some());

        let (tx, mut rx) = mpsc::unbounded_channel();
        cache.find_info(&call, false, ContactLookupCallback::new(LookupSlot::Secondary, tx));
        let info = rx.recv().await.unwrap();
        assert_eq!(info.slot, LookupSlot::Secondary);
        assert_eq!(info.stage, LookupStage::ContactInfo);
        let image = rx.recv().await.unwrap();
        assert_eq!(image.stage, LookupStage::Image);
    }

    /// Fails the first `failures` lookups, then answers from the inner directory
    struct FlakyDirectory {
        failures: AtomicUsize,
        inner: InMemoryContactDirectory,
    }

    #[async_trait]
    impl ContactDirectory for FlakyDirectory {
        async fn lookup_number(&self, number: &str) -> Result<Option<ContactRecord>, LookupError> {
            let failed = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(LookupError::Unavailable("timeout".to_string()));
            }
            self.inner.lookup_number(number).await
        }

        async fn load_photo(&self, photo_uri: &str) -> Result<Option<Photo>, LookupError> {
            self.inner.load_photo(photo_uri).await
        }
    }

    #[tokio::test]
    async fn test_failed_lookup_is_retried() {
        let directory = FlakyDirectory {
            failures: AtomicUsize::new(1),
            inner: alice_directory(),
        };
        let config = ContactsConfig { load_photos: false };
        let cache = ContactInfoCache::new(Arc::new(directory), &config);
        let call = incoming("c6", "6505551234");

        let (tx, mut rx) = mpsc::unbounded_channel();
        cache.find_info(&call, true, ContactLookupCallback::new(LookupSlot::Primary, tx));
        let info = rx.recv().await.unwrap();
        assert!(info.entry.name.is_none());
        assert!(cache.cached_entry(call.id()).is_none());

        let (tx, mut rx) = mpsc::unbounded_channel();
        cache.find_info(&call, true, ContactLookupCallback::new(LookupSlot::Primary, tx));
        let info = rx.recv().await.unwrap();
        assert_eq!(info.entry.name.as_deref(), Some("Alice"));
        assert!(cache.cached_entry(call.id()).is_some());
    }

    #[tokio::test]
    async fn test_clear_cache_evicts_finished_calls() {
        let config = ContactsConfig { load_photos: false };
        let cache = ContactInfoCache::new(Arc::new(alice_directory()), &config);

        let (tx, mut rx) = mpsc::unbounded_channel();
        for i in 0..50 {
            let call = incoming(&format!("done-{}", i), "6505551234");
            cache.find_info(&call, true, ContactLookupCallback::new(LookupSlot::Primary, tx.clone()));
        }
        for _ in 0..50 {
            rx.recv().await.unwrap();
        }
        assert_eq!(cache.cached_calls(), 50);

        cache.clear_cache();
        assert_eq!(cache.cached_calls(), 0);
        assert!(cache.cached_entry(&CallId::from("done-0")).is_none());
    }

    #[test]
    fn test_view_notification_reaches_directory() {
        let directory = Arc::new(alice_directory());
        let cache = ContactInfoCache::new(directory.clone(), &ContactsConfig::default());

        cache.send_view_notification("contact://alice");
        assert_eq!(directory.viewed(), vec!["contact://alice".to_string()]);
    }
}
