//! Exposed channels which connect the engine with the matrix scanner, the HID transport and the controllers

use embassy_sync::channel::Channel;
pub use embassy_sync::{blocking_mutex, channel};

use crate::event::{ControllerEvent, KeyboardEvent};
use crate::hid::Report;
use crate::{CONTROLLER_CHANNEL_SIZE, EVENT_CHANNEL_SIZE, REPORT_CHANNEL_SIZE, RawMutex};

/// Channel for debounced key events from the matrix scanner
pub static KEY_EVENT_CHANNEL: Channel<RawMutex, KeyboardEvent, EVENT_CHANNEL_SIZE> = Channel::new();
/// Channel for keyboard reports from the engine to the hid writer
pub static KEYBOARD_REPORT_CHANNEL: Channel<RawMutex, Report, REPORT_CHANNEL_SIZE> = Channel::new();
/// Channel for layer, indicator and caps word notifications
pub static CONTROLLER_CHANNEL: Channel<RawMutex, ControllerEvent, CONTROLLER_CHANNEL_SIZE> = Channel::new();
