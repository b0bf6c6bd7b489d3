//! Interface layer - the push contract towards the view

pub mod call_card;

pub use call_card::{
    CallCardUi, CallStateDisplay, DisplayCommand, PrimaryDisplay, RecordingCallCardUi,
    SecondaryDisplay,
};
