#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

//! Key decision engine for the Aurora Sweep.
//!
//! The engine turns debounced matrix transitions into HID reports and
//! controller notifications. It owns two custom one-shot machines, a combo
//! detector, caps word, key overrides and the layer stack.
//!
//! ```ignore
//! let mut keyboard = Keyboard::new(&layout::KEYMAP, layout::behavior()?);
//! keyboard.run().await;
//! ```

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod caps_word;
pub mod channel;
pub mod combo;
pub mod config;
pub mod event;
pub mod hid;
pub mod indicator;
pub mod key_override;
pub mod keyboard;
pub mod keymap;
pub mod layout;
pub mod layout_macro;
pub mod oneshot;
mod state;

pub use keyboard::Keyboard;
pub use sweep_types as types;
pub use sweep_types::{action, keycode, modifier};

/// Mutex used by every channel of the engine
pub type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Capacity of the matrix → engine channel
pub const EVENT_CHANNEL_SIZE: usize = 16;
/// Capacity of the engine → HID transport channel
pub const REPORT_CHANNEL_SIZE: usize = 16;
/// Capacity of the engine → controllers channel
pub const CONTROLLER_CHANNEL_SIZE: usize = 8;

/// Anything that runs forever inside the firmware's executor
pub trait Runnable {
    async fn run(&mut self) -> !;
}
