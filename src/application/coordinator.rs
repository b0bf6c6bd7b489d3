//! Call card coordinator
//!
//! Owns the primary/secondary selection and the contact entries shown for
//! them. Reacts to registry changes, contact lookup completions and timer
//! ticks, and pushes display commands to the attached UI.
//!
//! All methods take `&mut self`; the owning service runs them one at a time.
//! Lookup results arrive tagged with `(call_id, slot)` and are dropped when
//! the slot has since moved on to another call.

use crate::application::call_timer::{format_elapsed_time, CallTimer, TimerTick};
use crate::config::CoordinatorConfig;
use crate::domain::account::{AccountProvider, PhoneAccount};
use crate::domain::call::{
    are_calls_same, Call, CallCapabilities, CallDetails, CallRegistry, CallState, InCallState,
    SharedCallList, EXTRA_CALL_BACK_NUMBER,
};
use crate::domain::contact::{
    ContactCacheEntry, ContactLookupCallback, ContactResolver, LookupCompletion, LookupSlot,
    LookupStage,
};
use crate::domain::selection::{select_primary_and_secondary, Selection};
use crate::domain::shared::clock::Clock;
use crate::domain::shared::value_objects::{number_from_handle, CallId, Icon};
use crate::domain::telecom::TelecomRequest;
use crate::interface::call_card::{CallCardUi, CallStateDisplay, PrimaryDisplay, SecondaryDisplay};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Collaborators injected at construction
#[derive(Clone)]
pub struct CoordinatorDeps {
    pub registry: SharedCallList,
    pub resolver: Arc<dyn ContactResolver>,
    pub accounts: Arc<dyn AccountProvider>,
    pub clock: Arc<dyn Clock>,
}

/// Read-only view of the coordinator state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatorSnapshot {
    pub primary: Option<CallId>,
    pub secondary: Option<CallId>,
    pub primary_contact: Option<ContactCacheEntry>,
    pub secondary_contact: Option<ContactCacheEntry>,
    pub timer_running: bool,
    pub ui_attached: bool,
}

pub struct CallCardCoordinator {
    registry: SharedCallList,
    resolver: Arc<dyn ContactResolver>,
    accounts: Arc<dyn AccountProvider>,
    clock: Arc<dyn Clock>,
    ui: Option<Arc<dyn CallCardUi>>,

    primary: Option<Call>,
    secondary: Option<Call>,
    primary_contact: Option<ContactCacheEntry>,
    secondary_contact: Option<ContactCacheEntry>,

    timer: CallTimer,
    tick_interval: Duration,
    completions: mpsc::UnboundedSender<LookupCompletion>,
}

impl CallCardCoordinator {
    pub fn new(
        deps: CoordinatorDeps,
        config: &CoordinatorConfig,
        completions: mpsc::UnboundedSender<LookupCompletion>,
        ticks: mpsc::UnboundedSender<TimerTick>,
    ) -> Self {
        Self {
            registry: deps.registry,
            resolver: deps.resolver,
            accounts: deps.accounts,
            clock: deps.clock,
            ui: None,
            primary: None,
            secondary: None,
            primary_contact: None,
            secondary_contact: None,
            timer: CallTimer::new(ticks),
            tick_interval: config.tick_interval(),
            completions,
        }
    }

    /// Seed the primary call before the UI attaches so the lookup starts early.
    pub fn init(&mut self, call: Option<Call>) {
        // May be None if the call disconnected already
        let Some(call) = call else {
            return;
        };

        self.primary = Some(call.clone());
        if call.is_conference_call() {
            self.update_contact_entry(Some(ContactCacheEntry::conference()), LookupSlot::Primary, true);
        } else {
            self.start_contact_info_search(&call, LookupSlot::Primary);
        }
    }

    pub fn on_ui_ready(&mut self, ui: Arc<dyn CallCardUi>) {
        self.ui = Some(ui);

        // Contact search may have completed before the UI was ready
        if let Some(entry) = self.primary_contact.clone() {
            let is_conference = is_conference(self.primary.as_ref());
            self.update_primary_display_info(Some(&entry), is_conference);
        }

        // Selection made while detached
        if self.secondary.is_some() {
            self.update_secondary_display_info(is_conference(self.secondary.as_ref()));
        }
        if self.primary.is_some() {
            let call_state = self.push_call_state();
            self.push_card_controls(call_state);
            if call_state == CallState::Active && !self.timer.is_running() {
                self.timer.start(self.tick_interval);
            }
        }
    }

    pub fn on_ui_unready(&mut self) {
        self.ui = None;
        self.timer.cancel();
        self.resolver.clear_cache();

        self.primary = None;
        self.secondary = None;
        self.primary_contact = None;
        self.secondary_contact = None;
    }

    pub fn is_ui_attached(&self) -> bool {
        self.ui.is_some()
    }

    /// Incoming calls are handled like any other state change, against the shared registry.
    pub fn on_incoming_call(&mut self, state: InCallState, call: &Call) {
        debug!("onIncomingCall {:?} {}", state, call.id());
        let calls = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.on_state_change(state, &calls);
    }

    pub fn on_state_change(&mut self, state: InCallState, registry: &dyn CallRegistry) {
        debug!("onStateChange {:?}", state);

        let Selection { primary, secondary } = select_primary_and_secondary(registry, state);

        let primary_changed = !are_calls_same(self.primary.as_ref(), primary.as_ref());
        let secondary_changed = !are_calls_same(self.secondary.as_ref(), secondary.as_ref());
        self.primary = primary;
        self.secondary = secondary;

        match self.primary.clone() {
            Some(primary) if primary_changed => {
                let entry = placeholder_entry(&primary);
                self.primary_contact = Some(entry.clone());
                self.update_primary_display_info(Some(&entry), primary.is_conference_call());
                self.maybe_start_search(&primary, LookupSlot::Primary);
            }
            Some(_) => {}
            None => self.primary_contact = None,
        }

        if state == InCallState::NoCalls {
            self.resolver.clear_cache();
        }

        match self.secondary.clone() {
            Some(secondary) if secondary_changed => {
                let entry = placeholder_entry(&secondary);
                self.secondary_contact = Some(entry);
                self.update_secondary_display_info(secondary.is_conference_call());
                self.maybe_start_search(&secondary, LookupSlot::Secondary);
            }
            Some(_) => {}
            None => {
                // Secondary call may have ended
                self.secondary_contact = None;
                if secondary_changed {
                    self.update_secondary_display_info(false);
                }
            }
        }

        if self.primary.as_ref().map(Call::state) == Some(CallState::Active) {
            debug!("Starting the call time timer");
            self.timer.start(self.tick_interval);
        } else {
            debug!("Canceling the call time timer");
            self.timer.cancel();
            if let Some(ui) = self.ui() {
                ui.set_primary_call_elapsed_time(false, None);
            }
        }

        let call_state = self.push_call_state();

        if let Some(primary) = self.primary.clone() {
            if self.accounts.is_emergency_number(&primary.number()) {
                let callback_number = self.subscription_number();
                self.set_callback_number(callback_number, true);
            }
        }

        self.push_card_controls(call_state);
    }

    pub fn on_details_changed(&mut self, details: &CallDetails) {
        if let Some(ui) = self.ui() {
            ui.set_call_details(details.clone());
        }

        if self.primary.is_some() {
            self.push_call_state();
            self.set_callback_number_if_set(details);
        }
    }

    /// Route a tagged completion to the matching handler.
    pub fn on_lookup_complete(&mut self, completion: LookupCompletion) {
        let LookupCompletion {
            call_id,
            slot,
            stage,
            entry,
        } = completion;

        match stage {
            LookupStage::ContactInfo => self.on_contact_info_complete(&call_id, slot, entry),
            LookupStage::Image => self.on_image_load_complete(&call_id, slot, entry),
        }
    }

    pub fn on_contact_info_complete(&mut self, call_id: &CallId, slot: LookupSlot, entry: ContactCacheEntry) {
        if !self.slot_holds(slot, call_id) {
            debug!("Discarding stale contact info for {} ({} slot moved on)", call_id, slot);
            metrics::counter!("callcard_stale_lookups_discarded_total", "slot" => slot.as_str())
                .increment(1);
            return;
        }

        if entry.name.is_some() {
            debug!("Contact found for {}: {:?}", call_id, entry.name);
        }
        if let Some(contact_uri) = &entry.contact_uri {
            self.resolver.send_view_notification(contact_uri);
        }

        self.update_contact_entry(Some(entry), slot, false);
    }

    /// Photos only ever update the primary slot.
    pub fn on_image_load_complete(&mut self, call_id: &CallId, slot: LookupSlot, entry: ContactCacheEntry) {
        if self.primary.as_ref().map(Call::id) != Some(call_id) {
            debug!("Discarding photo for {} ({} lookup), not the primary call", call_id, slot);
            metrics::counter!("callcard_stale_lookups_discarded_total", "slot" => slot.as_str())
                .increment(1);
            return;
        }

        let Some(photo) = entry.photo.clone() else {
            return;
        };

        self.primary_contact = Some(entry);
        if let Some(ui) = self.ui() {
            ui.set_primary_image(photo);
        }
    }

    pub fn on_timer_tick(&mut self, tick: TimerTick) {
        if !self.timer.accepts(tick) {
            return;
        }
        self.update_call_time();
    }

    pub fn update_call_time(&mut self) {
        let active = self
            .primary
            .as_ref()
            .filter(|p| p.state() == CallState::Active);

        match (self.ui.as_ref(), active) {
            (Some(ui), Some(primary)) => {
                let elapsed = primary
                    .connect_time()
                    .map(|connected| (self.clock.now() - connected).num_seconds())
                    .unwrap_or(0);
                ui.set_primary_call_elapsed_time(true, Some(format_elapsed_time(elapsed)));
            }
            (ui, _) => {
                if let Some(ui) = ui {
                    ui.set_primary_call_elapsed_time(false, None);
                }
                self.timer.cancel();
            }
        }
    }

    pub fn end_call_clicked(&self) -> Option<TelecomRequest> {
        let primary = self.primary.as_ref()?;
        info!("Disconnecting call: {}", primary.id());
        Some(TelecomRequest::Disconnect(primary.id().clone()))
    }

    pub fn secondary_info_clicked(&self) -> Option<TelecomRequest> {
        let Some(secondary) = self.secondary.as_ref() else {
            warn!("Secondary info clicked but no secondary call");
            return None;
        };
        info!("Swapping call to foreground: {}", secondary.id());
        Some(TelecomRequest::Unhold(secondary.id().clone()))
    }

    pub fn phone_account_clicked(&self) -> Option<TelecomRequest> {
        let primary = self.primary.as_ref()?;
        Some(TelecomRequest::PhoneAccountClicked(primary.id().clone()))
    }

    pub fn primary(&self) -> Option<&Call> {
        self.primary.as_ref()
    }

    pub fn secondary(&self) -> Option<&Call> {
        self.secondary.as_ref()
    }

    pub fn primary_contact(&self) -> Option<&ContactCacheEntry> {
        self.primary_contact.as_ref()
    }

    pub fn secondary_contact(&self) -> Option<&ContactCacheEntry> {
        self.secondary_contact.as_ref()
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            primary: self.primary.as_ref().map(|c| c.id().clone()),
            secondary: self.secondary.as_ref().map(|c| c.id().clone()),
            primary_contact: self.primary_contact.clone(),
            secondary_contact: self.secondary_contact.clone(),
            timer_running: self.timer.is_running(),
            ui_attached: self.ui.is_some(),
        }
    }

    fn ui(&self) -> Option<&Arc<dyn CallCardUi>> {
        if self.ui.is_none() {
            metrics::counter!("callcard_display_pushes_skipped_total").increment(1);
        }
        self.ui.as_ref()
    }

    fn slot_holds(&self, slot: LookupSlot, call_id: &CallId) -> bool {
        let current = match slot {
            LookupSlot::Primary => self.primary.as_ref(),
            LookupSlot::Secondary => self.secondary.as_ref(),
        };
        current.map(Call::id) == Some(call_id)
    }

    fn maybe_start_search(&self, call: &Call, slot: LookupSlot) {
        // Conference calls show generic info, nothing to look up
        if !call.is_conference_call() {
            self.start_contact_info_search(call, slot);
        }
    }

    fn start_contact_info_search(&self, call: &Call, slot: LookupSlot) {
        debug!("Starting {} contact lookup for {}", slot, call.id());
        metrics::counter!("callcard_contact_lookups_total", "slot" => slot.as_str()).increment(1);

        let callback = ContactLookupCallback::new(slot, self.completions.clone());
        self.resolver.find_info(call, call.is_incoming(), callback);
    }

    fn update_contact_entry(&mut self, entry: Option<ContactCacheEntry>, slot: LookupSlot, is_conference: bool) {
        match slot {
            LookupSlot::Primary => {
                self.primary_contact = entry.clone();
                self.update_primary_display_info(entry.as_ref(), is_conference);
            }
            LookupSlot::Secondary => {
                self.secondary_contact = entry;
                self.update_secondary_display_info(is_conference);
            }
        }
    }

    fn update_primary_display_info(&self, entry: Option<&ContactCacheEntry>, is_conference: bool) {
        debug!("Update primary display {:?}", entry);
        let Some(ui) = self.ui() else {
            debug!("updatePrimaryDisplayInfo called but ui is not attached");
            return;
        };

        let is_generic_conference = is_generic_conference(self.primary.as_ref());
        let display = match entry {
            Some(entry) => PrimaryDisplay {
                number: entry.display_number().map(str::to_string),
                name: entry.display_name().map(str::to_string),
                name_is_number: entry.name_is_number(),
                label: entry.label.clone(),
                photo: entry.photo.clone(),
                is_conference,
                is_generic_conference,
                is_sip_call: entry.is_sip_call,
            },
            None => PrimaryDisplay {
                is_conference,
                is_generic_conference,
                ..Default::default()
            },
        };
        ui.set_primary(display);
    }

    fn update_secondary_display_info(&self, is_conference: bool) {
        let Some(ui) = self.ui() else {
            return;
        };

        // Evaluated at push time against the current secondary call
        let is_generic_conference = is_generic_conference(self.secondary.as_ref());
        let display = match &self.secondary_contact {
            Some(entry) => {
                debug!("updateSecondaryDisplayInfo() {:?}", entry);
                let account = self.secondary.as_ref().and_then(|c| self.phone_account_for(c));
                SecondaryDisplay {
                    show: true,
                    name: entry.display_name().map(str::to_string),
                    name_is_number: entry.name_is_number(),
                    label: entry.label.clone(),
                    provider_label: account.as_ref().and_then(|a| a.label.clone()),
                    provider_icon: account.and_then(|a| a.icon),
                    is_conference,
                    is_generic_conference,
                }
            }
            // Reset so it starts off blank next time
            None => SecondaryDisplay {
                show: false,
                is_conference,
                is_generic_conference,
                ..Default::default()
            },
        };
        ui.set_secondary(display);
    }

    /// Push the state line and return the primary's state (`Idle` without one).
    fn push_call_state(&self) -> CallState {
        let Some(primary) = self.primary.as_ref() else {
            if let Some(ui) = self.ui() {
                ui.set_call_state(CallStateDisplay::idle());
            }
            return CallState::Idle;
        };

        if let Some(ui) = self.ui() {
            ui.set_call_state(CallStateDisplay {
                state: primary.state(),
                cause: primary.disconnect_cause().clone(),
                connection_label: self.connection_label(),
                connection_icon: self.connection_icon(),
                gateway_number: self.gateway_number(),
            });
        }
        primary.state()
    }

    /// Photo is hidden for video calls; hang-up needs a connected, non-ringing primary.
    fn push_card_controls(&self, call_state: CallState) {
        let photo_visible = self.primary.as_ref().map_or(true, |p| !p.is_video_call());
        let enable_end_call_button =
            self.primary.is_some() && call_state.is_connected() && call_state != CallState::Incoming;

        if let Some(ui) = self.ui() {
            ui.set_photo_visible(photo_visible);
            ui.set_end_call_button_enabled(enable_end_call_button);
        }
    }

    fn set_callback_number_if_set(&self, details: &CallDetails) {
        let Some(primary) = self.primary.as_ref() else {
            return;
        };

        let is_emergency_call = self.accounts.is_emergency_number(&primary.number());
        let mut callback_number = None;

        match &details.status_hints {
            Some(hints) if hints.extras.is_some() => {
                callback_number = hints.extra(EXTRA_CALL_BACK_NUMBER).map(str::to_string);
                if is_emergency_call {
                    callback_number = self.subscription_number();
                }
            }
            Some(_) => debug!("No extras; not updating callback number"),
            None => debug!("No status hints; not updating callback number"),
        }

        self.set_callback_number(callback_number, is_emergency_call);
    }

    fn set_callback_number(&self, callback_number: Option<String>, is_emergency_call: bool) {
        let Some(callback_number) = callback_number.filter(|n| !n.is_empty()) else {
            debug!("No callback number; aborting");
            return;
        };

        if !is_emergency_call {
            if let Some(line_number) = self.accounts.line_number() {
                if self.accounts.compare_numbers(&callback_number, &line_number) {
                    debug!("Callback number is this device's own number; not showing it");
                    return;
                }
            }
        }

        if let Some(ui) = self.ui() {
            ui.set_callback_number(callback_number, is_emergency_call);
        }
    }

    /// Emergency fallback: the subscription number of the primary's account.
    fn subscription_number(&self) -> Option<String> {
        let primary = self.primary.as_ref()?;
        self.phone_account_for(primary)?.subscription_number
    }

    fn phone_account_for(&self, call: &Call) -> Option<PhoneAccount> {
        let handle = call.account_handle()?;
        self.accounts.phone_account(handle)
    }

    /// Gateway details are only shown while the primary is still dialing.
    fn has_outgoing_gateway_call(&self) -> bool {
        self.primary.as_ref().is_some_and(|p| {
            p.state().is_dialing() && p.gateway_info().is_some_and(|g| !g.is_empty())
        })
    }

    /// Text above the name, e.g. the gateway app or the account label.
    fn connection_label(&self) -> Option<String> {
        let primary = self.primary.as_ref()?;

        if self.has_outgoing_gateway_call() && self.ui.is_some() {
            let package = &primary.gateway_info()?.provider_package;
            return match self.accounts.application_label(package) {
                Ok(label) => Some(label),
                Err(e) => {
                    error!("Gateway application not found: {}", e);
                    None
                }
            };
        }

        self.phone_account_for(primary)?.label
    }

    fn connection_icon(&self) -> Option<Icon> {
        let primary = self.primary.as_ref()?;
        self.phone_account_for(primary)?.icon
    }

    fn gateway_number(&self) -> Option<String> {
        if !self.has_outgoing_gateway_call() {
            return None;
        }
        let gateway = self.primary.as_ref()?.gateway_info()?;
        Some(number_from_handle(gateway.gateway_handle.as_ref()))
    }
}

/// Entry shown as soon as a call takes a slot, before any lookup completes.
fn placeholder_entry(call: &Call) -> ContactCacheEntry {
    if call.is_conference_call() {
        ContactCacheEntry::conference()
    } else {
        ContactCacheEntry::from_call(call)
    }
}

fn is_conference(call: Option<&Call>) -> bool {
    call.is_some_and(Call::is_conference_call)
}

fn is_generic_conference(call: Option<&Call>) -> bool {
    call.is_some_and(|c| c.can(CallCapabilities::GENERIC_CONFERENCE))
}
