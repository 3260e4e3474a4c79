use embassy_time::Duration;
use heapless::Vec;
use sweep_types::action::KeyAction;
use sweep_types::keycode::KeyCode;

use crate::combo::{COMBO_MAX_NUM, ComboConfig};
use crate::key_override::{KEY_OVERRIDE_MAX_NUM, KeyOverride};

// Max number of keys which skip the one-shot bookkeeping
pub(crate) const PASSTHROUGH_MAX_NUM: usize = 4;

/// Errors raised while building a behavior config
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// More combos than `COMBO_MAX_NUM`
    TooManyCombos,
    /// A combo has more members than `COMBO_MAX_LENGTH`
    TooManyComboKeys,
    /// A combo needs at least one member key
    EmptyCombo,
    /// More overrides than `KEY_OVERRIDE_MAX_NUM`
    TooManyKeyOverrides,
    /// More passthrough keys than `PASSTHROUGH_MAX_NUM`
    TooManyPassthroughKeys,
}

/// Config for configurable action behavior
#[derive(Clone, Debug, Default)]
pub struct BehaviorConfig {
    pub one_shot: OneShotConfig,
    pub user_one_shot: UserOneShotConfig,
    pub layer_swap: Option<LayerSwapConfig>,
    pub combo: CombosConfig,
    pub caps_word: CapsWordConfig,
    pub key_override: KeyOverridesConfig,
    pub indicator: IndicatorConfig,
}

/// Config for the built-in one shot layer
#[derive(Clone, Copy, Debug)]
pub struct OneShotConfig {
    pub timeout: Duration,
    /// Taps in a row which lock the one shot layer, `None` disables locking
    pub tap_toggle: Option<u8>,
}

impl Default for OneShotConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(3000),
            tap_toggle: Some(5),
        }
    }
}

/// What a custom one-shot machine activates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OneShotBinding {
    /// Modifier registered when the key is tapped
    pub modifier: KeyCode,
    /// Layer held while the key is down, instead of the modifier
    pub layer: Option<u8>,
}

impl OneShotBinding {
    pub const fn new(modifier: KeyCode, layer: Option<u8>) -> Self {
        Self { modifier, layer }
    }
}

/// Config for the two custom one-shot machines
#[derive(Clone, Debug)]
pub struct UserOneShotConfig {
    pub shift: OneShotBinding,
    pub ctrl: OneShotBinding,
    /// Keys that neither arm nor consume the one-shot modifiers
    pub passthrough: Vec<KeyAction, PASSTHROUGH_MAX_NUM>,
}

impl Default for UserOneShotConfig {
    fn default() -> Self {
        Self {
            shift: OneShotBinding::new(KeyCode::LShift, None),
            ctrl: OneShotBinding::new(KeyCode::LCtrl, None),
            passthrough: Vec::new(),
        }
    }
}

impl UserOneShotConfig {
    pub fn new<I: IntoIterator<Item = KeyAction>>(
        shift: OneShotBinding,
        ctrl: OneShotBinding,
        passthrough: I,
    ) -> Result<Self, ConfigError> {
        let mut keys = Vec::new();
        for action in passthrough {
            keys.push(action).map_err(|_| ConfigError::TooManyPassthroughKeys)?;
        }
        Ok(Self {
            shift,
            ctrl,
            passthrough: keys,
        })
    }
}

/// A key which swaps an armed one-shot shift for a layer
#[derive(Clone, Copy, Debug)]
pub struct LayerSwapConfig {
    pub trigger: KeyAction,
    pub layer: u8,
}

/// Config for combo behavior
#[derive(Clone, Debug)]
pub struct CombosConfig {
    pub combos: Vec<ComboConfig, COMBO_MAX_NUM>,
    /// Default term of combos without their own
    pub timeout: Duration,
}

impl Default for CombosConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(40),
            combos: Vec::new(),
        }
    }
}

impl CombosConfig {
    pub fn new<I: IntoIterator<Item = ComboConfig>>(combos: I, timeout: Duration) -> Result<Self, ConfigError> {
        let mut list = Vec::new();
        for combo in combos {
            list.push(combo).map_err(|_| ConfigError::TooManyCombos)?;
        }
        Ok(Self { combos: list, timeout })
    }
}

/// Config for caps word
#[derive(Clone, Copy, Debug)]
pub struct CapsWordConfig {
    /// Caps word turns off after this long without a key press
    pub idle_timeout: Duration,
}

impl Default for CapsWordConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_millis(5000),
        }
    }
}

/// Config for key overrides
#[derive(Clone, Debug, Default)]
pub struct KeyOverridesConfig {
    pub overrides: Vec<KeyOverride, KEY_OVERRIDE_MAX_NUM>,
}

impl KeyOverridesConfig {
    pub fn new<I: IntoIterator<Item = KeyOverride>>(overrides: I) -> Result<Self, ConfigError> {
        let mut list = Vec::new();
        for o in overrides {
            list.push(o).map_err(|_| ConfigError::TooManyKeyOverrides)?;
        }
        Ok(Self { overrides: list })
    }
}

/// Config for the layer indicator
#[derive(Clone, Copy, Debug)]
pub struct IndicatorConfig {
    pub mouse_layer: Option<u8>,
    pub function_layer: Option<u8>,
    /// Brightness of the indicator colours
    pub value: u8,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            mouse_layer: None,
            function_layer: None,
            value: 32,
        }
    }
}
