//! Keyboard actions.
//!
//! - [`Action`] - Single operations that keyboards send or execute
//! - [`KeyAction`] - What a key position does, stored in the keymap

use crate::keycode::KeyCode;
use crate::modifier::ModifierCombination;

/// The two long-lived one-shot machines of the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OneShotSlot {
    /// Shift-class machine, usually bound to a layer while held
    Shift,
    /// Control-class machine
    Ctrl,
}

/// A KeyAction is the action at a keyboard position, stored in keymap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    /// No action
    No,
    /// Transparent action, next layer will be checked
    Transparent,
    /// A single action, triggered when pressed and cancelled when released
    Single(Action),
    /// Keep the action active until the next key is triggered
    OneShot(Action),
}

/// A single basic action that a keyboard can execute.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// A normal key stroke, including mouse keys and quantum keycodes
    Key(KeyCode),
    /// Key stroke with modifier combination triggered
    KeyWithModifier(KeyCode, ModifierCombination),
    /// Activate a layer while held
    LayerOn(u8),
    /// Toggle a layer
    LayerToggle(u8),
    /// Activate a layer and deactivate all other layers(except default layer)
    LayerToggleOnly(u8),
    /// Drive one of the two one-shot machines
    UserOneShot(OneShotSlot),
}
