//! Keymap and behaviors of the Aurora Sweep.
//!
//! The Sweep is a 3x5+2 split board, wired here as a 4x10 matrix. Only the
//! middle four positions of the last row are populated, the rest is `No`.
use embassy_time::Duration;
use sweep_types::action::KeyAction;
use sweep_types::keycode::KeyCode;
use sweep_types::modifier::{ALT, CTRL, ModifierCombination, SHIFT};

use crate::combo::ComboConfig;
use crate::config::{
    BehaviorConfig, CombosConfig, ConfigError, IndicatorConfig, KeyOverridesConfig, LayerSwapConfig, OneShotBinding,
    UserOneShotConfig,
};
use crate::key_override::KeyOverride;
use crate::{a, k, layer, mo, osl, tg, user_os, wm};

pub const ROW: usize = 4;
pub const COL: usize = 10;
pub const NUM_LAYER: usize = 6;

pub const NORMAL: u8 = 0;
pub const PRIMARY: u8 = 1;
pub const SECONDARY: u8 = 2;
pub const NAV: u8 = 3;
pub const FUNCTION: u8 = 4;
pub const MOUSE: u8 = 5;

const CTRL_ALT: ModifierCombination = ModifierCombination::new().with_ctrl(true).with_alt(true);

#[rustfmt::skip]
pub static KEYMAP: [[[KeyAction; COL]; ROW]; NUM_LAYER] = [
    layer!([
        [k!(Q), k!(W), k!(F), k!(P), k!(B), k!(J), k!(L), k!(U), k!(Y), k!(Backspace)],
        [k!(A), k!(R), k!(S), k!(T), k!(G), k!(M), k!(N), k!(E), k!(I), k!(O)],
        [k!(Z), k!(X), k!(C), k!(D), k!(V), k!(K), k!(H), k!(Comma), k!(Dot), k!(CapsWordToggle)],
        [a!(No), a!(No), a!(No), tg!(MOUSE), k!(Space), user_os!(Shift), osl!(FUNCTION), a!(No), a!(No), a!(No)]
    ]),
    layer!([
        [wm!(Kc1, SHIFT), wm!(Slash, SHIFT), wm!(Kc9, SHIFT), wm!(Equal, SHIFT), wm!(Kc2, SHIFT), k!(Backslash), k!(Equal), wm!(Kc0, SHIFT), k!(Grave), wm!(Kc8, SHIFT)],
        [wm!(Backslash, SHIFT), k!(Slash), wm!(LeftBracket, SHIFT), k!(Minus), wm!(Comma, SHIFT), wm!(Dot, SHIFT), wm!(Minus, SHIFT), wm!(RightBracket, SHIFT), k!(Quote), wm!(Kc4, SHIFT)],
        [wm!(Kc6, SHIFT), wm!(Kc3, SHIFT), k!(LeftBracket), k!(Semicolon), wm!(Kc7, SHIFT), wm!(Grave, SHIFT), wm!(Semicolon, SHIFT), k!(RightBracket), wm!(Quote, SHIFT), wm!(Kc5, SHIFT)],
        [a!(No), a!(No), a!(No), a!(Transparent), mo!(SECONDARY), a!(Transparent), a!(Transparent), a!(No), a!(No), a!(No)]
    ]),
    layer!([
        [a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent)],
        [k!(Kc1), k!(Kc2), k!(Kc3), k!(Kc4), k!(Kc5), k!(Kc6), k!(Kc7), k!(Kc8), k!(Kc9), k!(Kc0)],
        [a!(Transparent), k!(LAlt), wm!(Tab, SHIFT), k!(Tab), a!(Transparent), a!(Transparent), a!(Transparent), k!(Comma), k!(Dot), a!(Transparent)],
        [a!(No), a!(No), a!(No), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(No), a!(No), a!(No)]
    ]),
    layer!([
        [a!(Transparent), a!(Transparent), k!(Up), a!(Transparent), wm!(F11, ALT), wm!(Delete, CTRL_ALT), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent)],
        [a!(Transparent), k!(Left), k!(Down), k!(Right), k!(PageUp), a!(Transparent), wm!(F1, CTRL), wm!(F2, CTRL), wm!(F3, CTRL), wm!(F4, CTRL)],
        [a!(Transparent), wm!(Kc1, CTRL), wm!(Kc2, CTRL), wm!(Kc3, CTRL), k!(PageDown), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent)],
        [a!(No), a!(No), a!(No), a!(Transparent), a!(Transparent), k!(LGui), a!(Transparent), a!(No), a!(No), a!(No)]
    ]),
    layer!([
        [a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), k!(PrintScreen), a!(Transparent), a!(Transparent), a!(Transparent)],
        [k!(F1), k!(F2), k!(F3), k!(F4), k!(F5), k!(F6), k!(F7), k!(F8), k!(F9), k!(F10)],
        [k!(F11), k!(F12), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), k!(Bootloader)],
        [a!(No), a!(No), a!(No), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(No), a!(No), a!(No)]
    ]),
    layer!([
        [a!(Transparent), wm!(C, CTRL), wm!(V, CTRL), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent)],
        [a!(Transparent), k!(MouseBtn3), k!(MouseBtn2), k!(MouseBtn1), k!(MouseWheelUp), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent)],
        [a!(Transparent), k!(LShift), k!(LCtrl), a!(Transparent), k!(MouseWheelDown), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent)],
        [a!(No), a!(No), a!(No), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(No), a!(No), a!(No)]
    ]),
];

/// Combos, one-shots and the other behaviors of the Sweep keymap
pub fn behavior() -> Result<BehaviorConfig, ConfigError> {
    let combos = [
        ComboConfig::new([k!(P), k!(F)], k!(Escape), None)?.with_idle_time(Duration::from_millis(25)),
        ComboConfig::new([k!(C), k!(D)], user_os!(Ctrl), None)?,
        ComboConfig::new([k!(U), k!(L)], osl!(NAV), None)?.with_idle_time(Duration::from_millis(125)),
        // Rolled in order, available even mid-word and with a one-shot armed
        ComboConfig::new([k!(Comma), k!(H)], k!(Enter), None)?
            .in_order()
            .with_term(Duration::from_millis(100))
            .always_on(),
    ];

    Ok(BehaviorConfig {
        user_one_shot: UserOneShotConfig::new(
            OneShotBinding::new(KeyCode::LShift, Some(PRIMARY)),
            OneShotBinding::new(KeyCode::LCtrl, None),
            [osl!(FUNCTION)],
        )?,
        layer_swap: Some(LayerSwapConfig {
            trigger: k!(Space),
            layer: SECONDARY,
        }),
        combo: CombosConfig::new(combos, Duration::from_millis(40))?,
        key_override: KeyOverridesConfig::new([KeyOverride::new(SHIFT, KeyCode::Dot, KeyCode::RAlt)])?,
        indicator: IndicatorConfig {
            mouse_layer: Some(MOUSE),
            function_layer: Some(FUNCTION),
            value: 32,
        },
        ..Default::default()
    })
}
