//! Call card UI port
//!
//! The coordinator pushes display commands through [`CallCardUi`]. There is no
//! wire format; a view layer implements the trait in-process.

use crate::domain::call::{CallDetails, CallState, DisconnectCause};
use crate::domain::shared::value_objects::{Icon, Photo};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Content of the primary (large) call slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimaryDisplay {
    pub number: Option<String>,
    pub name: Option<String>,
    pub name_is_number: bool,
    pub label: Option<String>,
    pub photo: Option<Photo>,
    pub is_conference: bool,
    pub is_generic_conference: bool,
    pub is_sip_call: bool,
}

/// Content of the secondary (small) call slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecondaryDisplay {
    pub show: bool,
    pub name: Option<String>,
    pub name_is_number: bool,
    pub label: Option<String>,
    pub provider_label: Option<String>,
    pub provider_icon: Option<Icon>,
    pub is_conference: bool,
    pub is_generic_conference: bool,
}

/// State line above the primary call
#[derive(Debug, Clone, PartialEq)]
pub struct CallStateDisplay {
    pub state: CallState,
    pub cause: DisconnectCause,
    /// e.g. "calling via Google Voice"
    pub connection_label: Option<String>,
    pub connection_icon: Option<Icon>,
    pub gateway_number: Option<String>,
}

impl CallStateDisplay {
    /// State shown when there is no primary call
    pub fn idle() -> Self {
        Self {
            state: CallState::Idle,
            cause: DisconnectCause::NotValid,
            connection_label: None,
            connection_icon: None,
            gateway_number: None,
        }
    }
}

pub trait CallCardUi: Send + Sync {
    fn set_primary(&self, primary: PrimaryDisplay);

    fn set_secondary(&self, secondary: SecondaryDisplay);

    fn set_call_state(&self, state: CallStateDisplay);

    fn set_primary_call_elapsed_time(&self, show: bool, duration: Option<String>);

    fn set_primary_image(&self, photo: Photo);

    fn set_end_call_button_enabled(&self, enabled: bool);

    fn set_callback_number(&self, number: String, is_emergency_call: bool);

    fn set_call_details(&self, details: CallDetails);

    fn set_photo_visible(&self, visible: bool);
}

/// One pushed command, as captured by [`RecordingCallCardUi`]
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCommand {
    Primary(PrimaryDisplay),
    Secondary(SecondaryDisplay),
    CallState(CallStateDisplay),
    ElapsedTime { show: bool, duration: Option<String> },
    PrimaryImage(Photo),
    EndCallButtonEnabled(bool),
    CallbackNumber { number: String, is_emergency_call: bool },
    CallDetails(CallDetails),
    PhotoVisible(bool),
}

/// UI that records every command and logs it.
///
/// Used by the demo binary in place of a real view, and by tests.
#[derive(Debug, Default)]
pub struct RecordingCallCardUi {
    commands: Mutex<Vec<DisplayCommand>>,
}

impl RecordingCallCardUi {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, command: DisplayCommand) {
        debug!("UI <- {:?}", command);
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }

    pub fn commands(&self) -> Vec<DisplayCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain recorded commands
    pub fn take(&self) -> Vec<DisplayCommand> {
        std::mem::take(&mut *self.commands.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn primaries(&self) -> Vec<PrimaryDisplay> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                DisplayCommand::Primary(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn secondaries(&self) -> Vec<SecondaryDisplay> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                DisplayCommand::Secondary(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn elapsed_times(&self) -> Vec<(bool, Option<String>)> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                DisplayCommand::ElapsedTime { show, duration } => Some((show, duration)),
                _ => None,
            })
            .collect()
    }

    pub fn last_call_state(&self) -> Option<CallStateDisplay> {
        self.commands().into_iter().rev().find_map(|c| match c {
            DisplayCommand::CallState(s) => Some(s),
            _ => None,
        })
    }

    pub fn last_end_call_button(&self) -> Option<bool> {
        self.commands().into_iter().rev().find_map(|c| match c {
            DisplayCommand::EndCallButtonEnabled(e) => Some(e),
            _ => None,
        })
    }
}

impl CallCardUi for RecordingCallCardUi {
    fn set_primary(&self, primary: PrimaryDisplay) {
        self.record(DisplayCommand::Primary(primary));
    }

    fn set_secondary(&self, secondary: SecondaryDisplay) {
        self.record(DisplayCommand::Secondary(secondary));
    }

    fn set_call_state(&self, state: CallStateDisplay) {
        self.record(DisplayCommand::CallState(state));
    }

    fn set_primary_call_elapsed_time(&self, show: bool, duration: Option<String>) {
        self.record(DisplayCommand::ElapsedTime { show, duration });
    }

    fn set_primary_image(&self, photo: Photo) {
        self.record(DisplayCommand::PrimaryImage(photo));
    }

    fn set_end_call_button_enabled(&self, enabled: bool) {
        self.record(DisplayCommand::EndCallButtonEnabled(enabled));
    }

    fn set_callback_number(&self, number: String, is_emergency_call: bool) {
        self.record(DisplayCommand::CallbackNumber {
            number,
            is_emergency_call,
        });
    }

    fn set_call_details(&self, details: CallDetails) {
        self.record(DisplayCommand::CallDetails(details));
    }

    fn set_photo_visible(&self, visible: bool) {
        self.record(DisplayCommand::PhotoVisible(visible));
    }
}
