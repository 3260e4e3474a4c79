//! Key overrides: send another key when a key is pressed with certain modifiers.
use heapless::Vec;
use sweep_types::keycode::KeyCode;
use sweep_types::modifier::{HidModifiers, ModifierCombination};

use crate::event::KeyboardEvent;

// Max number of key overrides
pub const KEY_OVERRIDE_MAX_NUM: usize = 8;

/// Replace `trigger` with `replacement` while `modifiers` are held.
///
/// Modifiers are matched regardless of the side, `SHIFT` is triggered by either shift key.
/// The matched modifiers are suppressed for as long as the replacement is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyOverride {
    pub(crate) modifiers: ModifierCombination,
    pub(crate) trigger: KeyCode,
    pub(crate) replacement: KeyCode,
}

impl KeyOverride {
    pub const fn new(modifiers: ModifierCombination, trigger: KeyCode, replacement: KeyCode) -> Self {
        Self {
            modifiers,
            trigger,
            replacement,
        }
    }

    /// Held modifiers that satisfy this override, empty if it doesn't match
    fn matched_modifiers(&self, active: HidModifiers) -> HidModifiers {
        // Left and right bit of a modifier class, starting at ctrl
        const BOTH_SIDES: u8 = 0b0001_0001;
        let mut matched = HidModifiers::new();
        for (shift, required) in [
            self.modifiers.ctrl(),
            self.modifiers.shift(),
            self.modifiers.alt(),
            self.modifiers.gui(),
        ]
        .into_iter()
        .enumerate()
        {
            let class = BOTH_SIDES << shift;
            if !required {
                continue;
            }
            let held = active.into_bits() & class;
            if held == 0 {
                return HidModifiers::new();
            }
            matched |= HidModifiers::from_bits(held);
        }
        matched
    }
}

#[derive(Clone, Copy, Debug)]
struct ActiveOverride {
    row: u8,
    col: u8,
    replacement: KeyCode,
    suppress: HidModifiers,
}

pub(crate) struct KeyOverrides {
    overrides: Vec<KeyOverride, KEY_OVERRIDE_MAX_NUM>,
    active: Vec<ActiveOverride, KEY_OVERRIDE_MAX_NUM>,
}

impl KeyOverrides {
    pub(crate) fn new(overrides: Vec<KeyOverride, KEY_OVERRIDE_MAX_NUM>) -> Self {
        Self {
            overrides,
            active: Vec::new(),
        }
    }

    /// Check a key press against the overrides, returns the key to register instead
    pub(crate) fn try_start(&mut self, key: KeyCode, event: KeyboardEvent, active: HidModifiers) -> Option<KeyCode> {
        let (replacement, suppress) = self.overrides.iter().find_map(|o| {
            if o.trigger != key {
                return None;
            }
            let matched = o.matched_modifiers(active);
            (!matched.is_empty()).then_some((o.replacement, matched))
        })?;
        let started = ActiveOverride {
            row: event.row,
            col: event.col,
            replacement,
            suppress,
        };
        if self.active.push(started).is_err() {
            warn!("Too many active key overrides, ignoring {:?}", key);
            return None;
        }
        debug!("Key override {:?} -> {:?}", key, replacement);
        Some(replacement)
    }

    /// Finish the override started at this position, returns the key to unregister
    pub(crate) fn finish(&mut self, event: KeyboardEvent) -> Option<KeyCode> {
        let i = self.active.iter().position(|a| a.row == event.row && a.col == event.col)?;
        Some(self.active.swap_remove(i).replacement)
    }

    /// Modifiers hidden from the report while overrides are held
    pub(crate) fn suppressed(&self) -> HidModifiers {
        self.active.iter().fold(HidModifiers::new(), |m, a| m | a.suppress)
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod test {
    use embassy_time::Instant;
    use sweep_types::modifier::{CTRL, SHIFT};

    use super::*;

    fn overrides() -> KeyOverrides {
        let mut list = Vec::new();
        list.push(KeyOverride::new(SHIFT, KeyCode::Dot, KeyCode::RAlt)).unwrap();
        list.push(KeyOverride::new(CTRL | SHIFT, KeyCode::A, KeyCode::B)).unwrap();
        KeyOverrides::new(list)
    }

    fn event(pressed: bool) -> KeyboardEvent {
        KeyboardEvent::key(0, 1, pressed, Instant::from_millis(0))
    }

    #[test]
    fn test_either_shift_triggers() {
        let mut ko = overrides();
        let right_shift = HidModifiers::new().with_right_shift(true);
        assert_eq!(ko.try_start(KeyCode::Dot, event(true), right_shift), Some(KeyCode::RAlt));
        assert_eq!(ko.suppressed(), right_shift);
        assert_eq!(ko.finish(event(false)), Some(KeyCode::RAlt));
        assert!(ko.suppressed().is_empty());
        assert!(ko.is_idle());
    }

    #[test]
    fn test_all_modifiers_required() {
        let mut ko = overrides();
        let shift = HidModifiers::new().with_left_shift(true);
        assert_eq!(ko.try_start(KeyCode::A, event(true), shift), None);
        assert_eq!(ko.try_start(KeyCode::Dot, event(true), HidModifiers::new()), None);
        assert_eq!(ko.finish(event(false)), None);

        let ctrl_shift = shift.with_right_ctrl(true);
        assert_eq!(ko.try_start(KeyCode::A, event(true), ctrl_shift), Some(KeyCode::B));
        assert_eq!(ko.suppressed(), ctrl_shift);
    }
}
