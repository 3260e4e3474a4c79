use sweep_types::action::KeyAction;

use crate::event::KeyboardEvent;

/// Keymap represents the stack of layers.
///
/// The conception of Keymap is borrowed from qmk: <https://docs.qmk.fm/#/keymap>.
///
/// Keymap should be binded to the actual pcb matrix definition.
/// Hardware key strokes use tuple `(row, col, layer)` to retrieve the action from Keymap.
pub struct KeyMap<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    /// Layers
    layers: &'a [[[KeyAction; COL]; ROW]; NUM_LAYER],
    /// Bitset of activated layers, the default layer isn't stored here
    layer_state: u32,
    /// Default layer number, max: 32
    default_layer: u8,
    /// Layer cache
    layer_cache: [[u8; COL]; ROW],
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> KeyMap<'a, ROW, COL, NUM_LAYER> {
    const LAYER_LIMIT: () = assert!(NUM_LAYER > 0 && NUM_LAYER <= 32, "1 to 32 layers are supported");

    pub fn new(layers: &'a [[[KeyAction; COL]; ROW]; NUM_LAYER]) -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::LAYER_LIMIT;
        KeyMap {
            layers,
            layer_state: 0,
            default_layer: 0,
            layer_cache: [[0; COL]; ROW],
        }
    }

    /// Fetch the action in keymap, with layer cache
    pub(crate) fn get_action_with_layer_cache(&mut self, event: KeyboardEvent) -> KeyAction {
        let row = event.row as usize;
        let col = event.col as usize;
        if row >= ROW || col >= COL {
            warn!("Key ({}, {}) is outside of the keymap", row, col);
            return KeyAction::No;
        }
        if !event.pressed {
            // Releasing a pressed key, use cached layer and restore the cache
            let layer = self.pop_layer_from_cache(row, col);
            return self.layers[layer as usize][row][col];
        }

        // Iterate from higher layer to lower layer, the lowest checked layer is the default layer
        for (layer_idx, layer) in self.layers.iter().enumerate().rev() {
            if self.is_layer_active(layer_idx as u8) {
                let action = layer[row][col];
                if action == KeyAction::Transparent {
                    continue;
                }
                // Found a valid action in the layer, cache it
                self.layer_cache[row][col] = layer_idx as u8;
                return action;
            }
            if layer_idx as u8 == self.default_layer {
                // No action
                break;
            }
        }
        KeyAction::No
    }

    fn pop_layer_from_cache(&mut self, row: usize, col: usize) -> u8 {
        let layer = self.layer_cache[row][col];
        self.layer_cache[row][col] = self.default_layer;
        layer
    }

    /// The highest active layer
    pub(crate) fn get_activated_layer(&self) -> u8 {
        let highest = (u32::BITS - self.layer_state().leading_zeros()).saturating_sub(1) as u8;
        highest.max(self.default_layer)
    }

    /// All active layers including the default one
    pub(crate) fn layer_state(&self) -> u32 {
        self.layer_state | (1 << self.default_layer)
    }

    pub(crate) fn is_layer_active(&self, layer_num: u8) -> bool {
        layer_num == self.default_layer || self.layer_state & (1 << layer_num) != 0
    }

    fn is_valid_layer(&self, layer_num: u8) -> bool {
        if layer_num as usize >= NUM_LAYER {
            warn!(
                "Not a valid layer {}, keyboard supports only {} layers",
                layer_num, NUM_LAYER
            );
            return false;
        }
        true
    }

    /// Activate given layer, returns false if nothing changed
    pub(crate) fn activate_layer(&mut self, layer_num: u8) -> bool {
        if !self.is_valid_layer(layer_num) {
            return false;
        }
        let old = self.layer_state;
        self.layer_state |= 1 << layer_num;
        old != self.layer_state
    }

    /// Deactivate given layer, returns false if nothing changed
    pub(crate) fn deactivate_layer(&mut self, layer_num: u8) -> bool {
        if !self.is_valid_layer(layer_num) {
            return false;
        }
        let old = self.layer_state;
        self.layer_state &= !(1 << layer_num);
        old != self.layer_state
    }

    /// Toggle given layer, returns whether the layer is now active
    pub(crate) fn toggle_layer(&mut self, layer_num: u8) -> bool {
        if !self.is_valid_layer(layer_num) {
            return false;
        }
        self.layer_state ^= 1 << layer_num;
        self.layer_state & (1 << layer_num) != 0
    }

    /// Turn off every layer, the default layer stays active
    pub(crate) fn clear_layers(&mut self) -> u32 {
        core::mem::take(&mut self.layer_state)
    }
}

#[cfg(test)]
mod test {
    use embassy_time::Instant;

    use super::*;
    use crate::{a, k, layer};

    static LAYERS: [[[KeyAction; 2]; 1]; 3] = [
        layer!([[k!(A), k!(B)]]),
        layer!([[k!(Kc1), a!(Transparent)]]),
        layer!([[a!(Transparent), k!(F2)]]),
    ];

    fn event(col: u8, pressed: bool) -> KeyboardEvent {
        KeyboardEvent::key(0, col, pressed, Instant::from_millis(0))
    }

    #[test]
    fn test_transparent_falls_through() {
        let mut keymap = KeyMap::new(&LAYERS);
        keymap.activate_layer(1);
        assert_eq!(keymap.get_action_with_layer_cache(event(0, true)), k!(Kc1));
        assert_eq!(keymap.get_action_with_layer_cache(event(1, true)), k!(B));
        keymap.activate_layer(2);
        assert_eq!(keymap.get_activated_layer(), 2);
        assert_eq!(keymap.get_action_with_layer_cache(event(0, true)), k!(Kc1));
        assert_eq!(keymap.layer_state(), 0b111);
    }

    #[test]
    fn test_release_uses_press_layer() {
        let mut keymap = KeyMap::new(&LAYERS);
        keymap.activate_layer(1);
        assert_eq!(keymap.get_action_with_layer_cache(event(0, true)), k!(Kc1));
        keymap.deactivate_layer(1);
        assert_eq!(keymap.get_action_with_layer_cache(event(0, false)), k!(Kc1));
        assert_eq!(keymap.get_action_with_layer_cache(event(0, true)), k!(A));
    }

    #[test]
    fn test_layer_bookkeeping() {
        let mut keymap = KeyMap::new(&LAYERS);
        assert_eq!(keymap.get_activated_layer(), 0);
        assert!(keymap.activate_layer(2));
        assert!(!keymap.activate_layer(2));
        assert!(!keymap.activate_layer(3));
        assert!(!keymap.toggle_layer(2));
        assert!(!keymap.is_layer_active(2));
        assert!(keymap.toggle_layer(1));
        assert_eq!(keymap.clear_layers(), 0b10);
        assert_eq!(keymap.layer_state(), 0b1);
        let outside = KeyboardEvent::key(4, 0, true, Instant::from_millis(0));
        assert_eq!(keymap.get_action_with_layer_cache(outside), KeyAction::No);
    }
}
