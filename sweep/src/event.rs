//! Events flowing into and out of the decision engine.
use embassy_time::Instant;
use sweep_types::indicator::LayerIndicator;

use crate::hid::Report;

/// A debounced key transition at a matrix position.
///
/// Produced by the matrix scanner and consumed exactly once by [`crate::keyboard::Keyboard`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardEvent {
    pub row: u8,
    pub col: u8,
    pub pressed: bool,
    /// When the transition was detected
    pub time: Instant,
}

impl KeyboardEvent {
    pub const fn key(row: u8, col: u8, pressed: bool, time: Instant) -> Self {
        Self {
            row,
            col,
            pressed,
            time,
        }
    }
}

/// Notifications for everything besides the HID transport
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerEvent {
    /// A layer was switched on (`true`) or off (`false`)
    Layer(u8, bool),
    /// Requested indicator state, sent on every layer state change
    Indicator(LayerIndicator),
    /// Caps Word was enabled or disabled
    CapsWord(bool),
    /// Reboot into the bootloader
    Bootloader,
}

/// Anything produced while processing a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Output {
    Report(Report),
    Controller(ControllerEvent),
}
