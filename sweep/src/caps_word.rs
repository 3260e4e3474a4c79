//! Caps Word: shift letters until the end of the current word.
use embassy_time::{Duration, Instant};
use sweep_types::keycode::KeyCode;
use sweep_types::modifier::HidModifiers;

use crate::config::CapsWordConfig;

#[derive(Debug, Clone, Copy)]
pub(crate) struct CapsWord {
    active: bool,
    /// The last key pressed gets shift added
    shifted: bool,
    last_press: Instant,
    idle_timeout: Duration,
}

impl CapsWord {
    pub(crate) fn new(config: CapsWordConfig) -> Self {
        Self {
            active: false,
            shifted: false,
            last_press: Instant::from_ticks(0),
            idle_timeout: config.idle_timeout,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// Shift which must be added to the report
    pub(crate) fn modifiers(&self) -> HidModifiers {
        HidModifiers::new().with_left_shift(self.active && self.shifted)
    }

    pub(crate) fn activate(&mut self, now: Instant) -> bool {
        self.last_press = now;
        !core::mem::replace(&mut self.active, true)
    }

    pub(crate) fn deactivate(&mut self) -> bool {
        self.shifted = false;
        core::mem::replace(&mut self.active, false)
    }

    /// Update on a key press, returns false if caps word ended.
    ///
    /// `modifiers` are the modifiers held when the key was pressed.
    pub(crate) fn on_key_press(&mut self, key: KeyCode, modifiers: HidModifiers, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        if key.is_modifier() {
            return true;
        }
        if modifiers.has_non_shift() || !key.is_caps_word_continue_key() {
            self.deactivate();
            return false;
        }
        self.shifted = key.is_caps_word_shifted_key();
        self.last_press = now;
        true
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.active.then(|| self.last_press + self.idle_timeout)
    }

    /// Turn off after the idle timeout, returns true if caps word ended
    pub(crate) fn expire(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.deactivate(),
            _ => false,
        }
    }
}
