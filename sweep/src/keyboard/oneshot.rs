use embassy_time::Instant;

use crate::event::KeyboardEvent;
use crate::keyboard::Keyboard;
use crate::oneshot::OneShotEffects;

/// State machine for the built-in one shot layer
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OneShotLayerState {
    /// First one shot key press
    Initial(u8),
    /// One shot key was released before any other key, normal one shot behavior.
    /// Carries the time of the release, the layer times out from there
    Single(u8, Instant),
    /// Another key was pressed before one shot key was released, treat as a normal layer
    Held(u8),
    /// Tapped enough times in a row, stays on until the key is pressed again
    Locked(u8),
    /// One shot inactive
    #[default]
    None,
}

impl OneShotLayerState {
    /// Get the current one shot layer if any
    pub fn value(&self) -> Option<u8> {
        match *self {
            OneShotLayerState::Initial(l)
            | OneShotLayerState::Single(l, _)
            | OneShotLayerState::Held(l)
            | OneShotLayerState::Locked(l) => Some(l),
            OneShotLayerState::None => None,
        }
    }
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> Keyboard<'a, ROW, COL, NUM_LAYER> {
    pub(crate) fn process_action_osl(&mut self, layer_num: u8, event: KeyboardEvent) {
        // Update one shot state
        if event.pressed {
            if let OneShotLayerState::Locked(l) = self.osl_state {
                debug!("One shot layer {} unlocked", l);
                self.state.layer_off(l);
                self.osl_state = OneShotLayerState::None;
                self.osl_taps = 0;
                return;
            }

            // Count taps of the same layer only
            if !matches!(self.osl_state, OneShotLayerState::Single(l, _) if l == layer_num) {
                self.osl_taps = 0;
            }

            // Deactivate old layer if any
            if let Some(l) = self.osl_state.value() {
                self.state.layer_off(l);
            }

            // Update layer of one shot
            self.osl_state = match self.osl_state {
                OneShotLayerState::None | OneShotLayerState::Initial(_) | OneShotLayerState::Locked(_) => {
                    OneShotLayerState::Initial(layer_num)
                }
                OneShotLayerState::Single(_, released) => OneShotLayerState::Single(layer_num, released),
                OneShotLayerState::Held(_) => OneShotLayerState::Held(layer_num),
            };

            // Activate new layer
            self.state.layer_on(layer_num);
        } else {
            match self.osl_state {
                OneShotLayerState::Initial(l) | OneShotLayerState::Single(l, _) => {
                    self.osl_taps = self.osl_taps.saturating_add(1);
                    if self.one_shot.tap_toggle.is_some_and(|n| self.osl_taps >= n) {
                        debug!("One shot layer {} locked", l);
                        self.osl_state = OneShotLayerState::Locked(l);
                        self.osl_taps = 0;
                    } else {
                        // The timeout is polled, see `expire_osl`
                        self.osl_state = OneShotLayerState::Single(l, event.time);
                    }
                }
                OneShotLayerState::Held(l) => {
                    self.osl_state = OneShotLayerState::None;
                    self.state.layer_off(l);
                }
                OneShotLayerState::Locked(_) | OneShotLayerState::None => (),
            };
        }
    }

    /// Update the one shot layer on any other key event
    pub(crate) fn update_osl(&mut self, event: KeyboardEvent) {
        match self.osl_state {
            OneShotLayerState::Initial(l) => self.osl_state = OneShotLayerState::Held(l),
            OneShotLayerState::Single(layer_num, _) => {
                if !event.pressed {
                    self.state.layer_off(layer_num);
                    self.osl_state = OneShotLayerState::None;
                }
            }
            _ => (),
        }
    }

    /// Turn off a tapped one shot layer which wasn't used in time
    pub(crate) fn expire_osl(&mut self, now: Instant) {
        if let OneShotLayerState::Single(layer_num, released) = self.osl_state {
            if now.saturating_duration_since(released) >= self.one_shot.timeout {
                debug!("One shot layer {} timed out", layer_num);
                self.state.layer_off(layer_num);
                self.osl_state = OneShotLayerState::None;
            }
        }
    }

    pub(crate) fn osl_deadline(&self) -> Option<Instant> {
        match self.osl_state {
            OneShotLayerState::Single(_, released) => Some(released + self.one_shot.timeout),
            _ => None,
        }
    }
}
