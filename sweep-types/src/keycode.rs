//! Keycodes understood by the decision engine.
//!
//! The basic range (`0x00..=0xE7`) follows the HID keyboard usage page, so a
//! basic keycode can be written into a keyboard report as-is. Mouse keys live in
//! the unused `0xCD..=0xDF` gap like QMK does, and the few quantum keycodes the
//! engine handles itself sit above the HID range.

use serde::{Deserialize, Serialize};
use strum::FromRepr;

use crate::modifier::HidModifiers;

#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyCode {
    /// Reserved, no-key.
    No = 0x0000,
    A = 0x0004,
    B = 0x0005,
    C = 0x0006,
    D = 0x0007,
    E = 0x0008,
    F = 0x0009,
    G = 0x000A,
    H = 0x000B,
    I = 0x000C,
    J = 0x000D,
    K = 0x000E,
    L = 0x000F,
    M = 0x0010,
    N = 0x0011,
    O = 0x0012,
    P = 0x0013,
    Q = 0x0014,
    R = 0x0015,
    S = 0x0016,
    T = 0x0017,
    U = 0x0018,
    V = 0x0019,
    W = 0x001A,
    X = 0x001B,
    Y = 0x001C,
    Z = 0x001D,
    /// `1` and `!`
    Kc1 = 0x001E,
    /// `2` and `@`
    Kc2 = 0x001F,
    /// `3` and `#`
    Kc3 = 0x0020,
    /// `4` and `$`
    Kc4 = 0x0021,
    /// `5` and `%`
    Kc5 = 0x0022,
    /// `6` and `^`
    Kc6 = 0x0023,
    /// `7` and `&`
    Kc7 = 0x0024,
    /// `8` and `*`
    Kc8 = 0x0025,
    /// `9` and `(`
    Kc9 = 0x0026,
    /// `0` and `)`
    Kc0 = 0x0027,
    Enter = 0x0028,
    Escape = 0x0029,
    Backspace = 0x002A,
    Tab = 0x002B,
    Space = 0x002C,
    /// `-` and `_`
    Minus = 0x002D,
    /// `=` and `+`
    Equal = 0x002E,
    /// `[` and `{`
    LeftBracket = 0x002F,
    /// `]` and `}`
    RightBracket = 0x0030,
    /// `\` and `|`
    Backslash = 0x0031,
    /// Non-US `#` and `~`
    NonusHash = 0x0032,
    /// `;` and `:`
    Semicolon = 0x0033,
    /// `'` and `"`
    Quote = 0x0034,
    /// `` ` `` and `~`
    Grave = 0x0035,
    /// `,` and `<`
    Comma = 0x0036,
    /// `.` and `>`
    Dot = 0x0037,
    /// `/` and `?`
    Slash = 0x0038,
    CapsLock = 0x0039,
    F1 = 0x003A,
    F2 = 0x003B,
    F3 = 0x003C,
    F4 = 0x003D,
    F5 = 0x003E,
    F6 = 0x003F,
    F7 = 0x0040,
    F8 = 0x0041,
    F9 = 0x0042,
    F10 = 0x0043,
    F11 = 0x0044,
    F12 = 0x0045,
    PrintScreen = 0x0046,
    ScrollLock = 0x0047,
    Pause = 0x0048,
    Insert = 0x0049,
    Home = 0x004A,
    PageUp = 0x004B,
    Delete = 0x004C,
    End = 0x004D,
    PageDown = 0x004E,
    Right = 0x004F,
    Left = 0x0050,
    Down = 0x0051,
    Up = 0x0052,
    Application = 0x0065,
    MouseUp = 0x00CD,
    MouseDown = 0x00CE,
    MouseLeft = 0x00CF,
    MouseRight = 0x00D0,
    MouseBtn1 = 0x00D1,
    MouseBtn2 = 0x00D2,
    MouseBtn3 = 0x00D3,
    MouseBtn4 = 0x00D4,
    MouseBtn5 = 0x00D5,
    MouseWheelUp = 0x00D9,
    MouseWheelDown = 0x00DA,
    MouseWheelLeft = 0x00DB,
    MouseWheelRight = 0x00DC,
    LCtrl = 0x00E0,
    LShift = 0x00E1,
    LAlt = 0x00E2,
    LGui = 0x00E3,
    RCtrl = 0x00E4,
    RShift = 0x00E5,
    RAlt = 0x00E6,
    RGui = 0x00E7,
    /// Reboot into the bootloader (`QK_BOOT`)
    Bootloader = 0x7C00,
    /// Toggle Caps Word (`CW_TOGG`)
    CapsWordToggle = 0x7C73,
}

impl KeyCode {
    /// Returns `true` if the keycode can be written into a keyboard report
    pub fn is_basic(self) -> bool {
        KeyCode::No <= self && self <= KeyCode::RGui && !self.is_mouse_key()
    }

    /// Returns `true` if the keycode is a modifier keycode
    pub fn is_modifier(self) -> bool {
        KeyCode::LCtrl <= self && self <= KeyCode::RGui
    }

    /// Returns `true` if the keycode is a mouse keycode
    pub fn is_mouse_key(self) -> bool {
        KeyCode::MouseUp <= self && self <= KeyCode::MouseWheelRight
    }

    /// Returns `true` for `A` to `Z`
    pub fn is_letter(self) -> bool {
        KeyCode::A <= self && self <= KeyCode::Z
    }

    /// HID modifier bits of a modifier keycode, empty for everything else
    pub fn to_hid_modifiers(self) -> HidModifiers {
        if self.is_modifier() {
            HidModifiers::from_bits(1 << (self as u16 - KeyCode::LCtrl as u16))
        } else {
            HidModifiers::new()
        }
    }

    /// Does current keycode continue Caps Word?
    pub fn is_caps_word_continue_key(self) -> bool {
        if self.is_letter() {
            return true;
        }
        if self >= KeyCode::Kc1 && self <= KeyCode::Kc0 {
            return true;
        }
        matches!(self, KeyCode::Minus | KeyCode::Backspace | KeyCode::Delete)
    }

    /// Does current keycode get shifted by Caps Word?
    pub fn is_caps_word_shifted_key(self) -> bool {
        self.is_letter() || self == KeyCode::Minus
    }

    /// Byte written into the keycode array of a keyboard report
    pub fn as_report_code(self) -> u8 {
        if self.is_basic() { self as u16 as u8 } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_bits() {
        assert_eq!(KeyCode::LCtrl.to_hid_modifiers().into_bits(), 0b0000_0001);
        assert_eq!(KeyCode::LShift.to_hid_modifiers().into_bits(), 0b0000_0010);
        assert_eq!(KeyCode::RAlt.to_hid_modifiers().into_bits(), 0b0100_0000);
        assert_eq!(KeyCode::A.to_hid_modifiers().into_bits(), 0);
    }

    #[test]
    fn test_key_classes() {
        assert!(KeyCode::Z.is_basic());
        assert!(!KeyCode::MouseBtn1.is_basic());
        assert!(KeyCode::MouseWheelDown.is_mouse_key());
        assert!(!KeyCode::CapsWordToggle.is_basic());
        assert_eq!(KeyCode::Bootloader.as_report_code(), 0);
        assert_eq!(KeyCode::from_repr(0x0004), Some(KeyCode::A));
    }

    #[test]
    fn test_caps_word_classes() {
        assert!(KeyCode::Kc5.is_caps_word_continue_key());
        assert!(!KeyCode::Kc5.is_caps_word_shifted_key());
        assert!(KeyCode::Minus.is_caps_word_shifted_key());
        assert!(!KeyCode::Space.is_caps_word_continue_key());
    }
}
