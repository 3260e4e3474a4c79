//! The two custom one-shot machines.
//!
//! A one-shot key applies its modifier to exactly one following keystroke when
//! tapped, and behaves like a plain held modifier (or momentary layer) when held
//! while another key is pressed. The machine never times out: a tapped one-shot
//! stays armed until the next key event arrives.
//!
//! The machine is pure. Every side effect goes through [`OneShotEffects`], which
//! is implemented by the keyboard state and by recorders in tests.

use sweep_types::keycode::KeyCode;

use crate::config::OneShotBinding;

/// Side effects a one-shot transition may request
pub trait OneShotEffects {
    fn register_modifier(&mut self, modifier: KeyCode);
    fn unregister_modifier(&mut self, modifier: KeyCode);
    fn layer_on(&mut self, layer: u8);
    fn layer_off(&mut self, layer: u8);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OneShotStatus {
    /// Not armed
    #[default]
    Disabled,
    /// The one-shot key is down and nothing else has been pressed yet
    Holding,
    /// The one-shot key was tapped, the modifier waits for the next key
    Released,
    /// Another key was pressed while the one-shot key is still down
    OtherKeyPressed,
    /// The armed modifier has been consumed by a key, drop it on the next transition
    PendingDisable,
}

/// One of the two long-lived one-shot machines
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OneShotState {
    status: OneShotStatus,
    modifier: KeyCode,
    layer: Option<u8>,
}

impl OneShotState {
    pub const fn new(binding: OneShotBinding) -> Self {
        Self {
            status: OneShotStatus::Disabled,
            modifier: binding.modifier,
            layer: binding.layer,
        }
    }

    pub fn status(&self) -> OneShotStatus {
        self.status
    }

    pub fn is_disabled(&self) -> bool {
        self.status == OneShotStatus::Disabled
    }

    /// Transition on the one-shot key's own press or release.
    pub fn apply<E: OneShotEffects>(&mut self, pressed: bool, effects: &mut E) {
        let previous = self.status;
        match (pressed, self.status) {
            (true, OneShotStatus::Disabled) => {
                self.status = OneShotStatus::Holding;
                match self.layer {
                    None => effects.register_modifier(self.modifier),
                    Some(layer) => effects.layer_on(layer),
                }
                debug!("One-shot {:?}: {:?} -> {:?}", self.modifier, previous, self.status);
                // The bound layer stays on while the key is down
                return;
            }
            (_, OneShotStatus::Holding) => {
                // Tapped: arm the modifier for the next key
                self.status = OneShotStatus::Released;
                effects.register_modifier(self.modifier);
            }
            (_, OneShotStatus::OtherKeyPressed) => {
                // Used as a plain hold, a bound layer is torn down below
                self.status = OneShotStatus::Disabled;
                if self.layer.is_none() {
                    effects.unregister_modifier(self.modifier);
                }
            }
            (_, OneShotStatus::Released) | (_, OneShotStatus::PendingDisable) | (false, OneShotStatus::Disabled) => {
                self.status = OneShotStatus::Disabled;
                effects.unregister_modifier(self.modifier);
            }
        }

        if let Some(layer) = self.layer {
            effects.layer_off(layer);
        }
        debug!("One-shot {:?}: {:?} -> {:?}", self.modifier, previous, self.status);
    }

    /// Transition on any key event that is not the one-shot key's own.
    ///
    /// Must run before the other key's own effect is computed.
    pub fn notify_other_key<E: OneShotEffects>(&mut self, pressed: bool, effects: &mut E) {
        let previous = self.status;
        match (pressed, self.status) {
            (true, OneShotStatus::Holding) => self.status = OneShotStatus::OtherKeyPressed,
            (true, OneShotStatus::Released) => self.status = OneShotStatus::PendingDisable,
            (_, OneShotStatus::PendingDisable) => {
                self.status = OneShotStatus::Disabled;
                effects.unregister_modifier(self.modifier);
            }
            (true, OneShotStatus::Disabled)
            | (true, OneShotStatus::OtherKeyPressed)
            | (false, OneShotStatus::Disabled)
            | (false, OneShotStatus::Holding)
            | (false, OneShotStatus::Released)
            | (false, OneShotStatus::OtherKeyPressed) => return,
        }
        debug!("One-shot {:?}: {:?} -> {:?}", self.modifier, previous, self.status);
    }

    /// Drop an armed modifier without waiting for the next key.
    pub fn cancel<E: OneShotEffects>(&mut self, effects: &mut E) {
        if self.status != OneShotStatus::Disabled {
            self.status = OneShotStatus::Disabled;
            effects.unregister_modifier(self.modifier);
        }
    }

    /// Hold the bound layer without touching the modifier.
    ///
    /// Used while caps word is active, where registering and unregistering shift
    /// would end caps word.
    pub fn hold_layer<E: OneShotEffects>(&mut self, effects: &mut E) {
        // A modifier armed by an earlier tap would outlive the layer
        if !self.is_disabled() {
            effects.unregister_modifier(self.modifier);
        }
        if let Some(layer) = self.layer {
            effects.layer_on(layer);
        }
        self.status = OneShotStatus::Holding;
    }

    /// Release a layer taken with [`OneShotState::hold_layer`].
    ///
    /// Returns true if no other key was pressed in between, i.e. the key was tapped.
    pub fn release_layer<E: OneShotEffects>(&mut self, effects: &mut E) -> bool {
        let tapped = self.status == OneShotStatus::Holding;
        self.status = OneShotStatus::Disabled;
        if let Some(layer) = self.layer {
            effects.layer_off(layer);
        }
        tapped
    }
}
