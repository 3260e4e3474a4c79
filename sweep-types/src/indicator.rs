//! Layer indicator states.
use serde::{Deserialize, Serialize};

/// Colour in the HSV space used by RGB light drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hsv {
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
}

impl Hsv {
    pub const BLACK: Hsv = Hsv::new(0, 0, 0);

    pub const fn new(hue: u8, sat: u8, val: u8) -> Self {
        Self { hue, sat, val }
    }
}

/// What the underglow shows for the highest active layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayerIndicator {
    /// Base layer and every layer without a colour
    #[default]
    Off,
    /// Mouse layer, blue
    Mouse,
    /// Function layer, pink
    Function,
}

impl LayerIndicator {
    /// Colour of the indicator at the given brightness
    pub const fn hsv(self, val: u8) -> Hsv {
        match self {
            LayerIndicator::Off => Hsv::BLACK,
            LayerIndicator::Mouse => Hsv::new(170, 255, val),
            LayerIndicator::Function => Hsv::new(234, 128, val),
        }
    }
}
