//! # Sweep Types
//!
//! Fundamental type definitions shared by the Sweep key decision engine.
//!
//! - [`action`] - Key actions stored in the keymap
//! - [`keycode`] - HID keycodes, mouse keys and the quantum keycodes the engine handles
//! - [`modifier`] - Modifier key combinations and HID modifier bits
//! - [`indicator`] - Layer indicator states and colours

#![cfg_attr(not(test), no_std)]

pub mod action;
pub mod indicator;
pub mod keycode;
pub mod modifier;
