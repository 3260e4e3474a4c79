pub mod common;

use sweep::action::OneShotSlot;
use sweep::oneshot::OneShotStatus;

use crate::common::{KC_LCTRL, KC_LSHIFT, create_test_keyboard};

#[test]
fn test_one_shot_shift_applies_to_next_key_only() {
    let mut keyboard = create_test_keyboard();
    key_sequence_test! {
        keyboard: &mut keyboard,
        sequence: [
            [3, 5, true, 10],   // Shift
            [3, 5, false, 50],
            [1, 0, true, 100],  // A
            [1, 0, false, 50],
            [0, 4, true, 100],  // B
            [0, 4, false, 50],
        ],
        expected_reports: [
            [KC_LSHIFT, [0; 6]],
            [KC_LSHIFT, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [0; 6]],
            [0, [kc8!(B), 0, 0, 0, 0, 0]],
            [0, [0; 6]],
        ]
    };
    assert!(keyboard.is_idle());
}

#[test]
fn test_one_shot_shift_armed_indefinitely() {
    let mut keyboard = create_test_keyboard();
    key_sequence_test! {
        keyboard: &mut keyboard,
        sequence: [
            [3, 5, true, 10],   // Shift
            [3, 5, false, 50],
            [1, 0, true, 60000],  // A, a minute later
            [1, 0, false, 50],
        ],
        expected_reports: [
            [KC_LSHIFT, [0; 6]],
            [KC_LSHIFT, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [0; 6]],
        ]
    };
    assert_eq!(keyboard.one_shot_status(OneShotSlot::Shift), OneShotStatus::Disabled);
}

#[test]
fn test_one_shot_shift_rolled_keys() {
    // Only the first rolled key is shifted
    key_sequence_test! {
        keyboard: create_test_keyboard(),
        sequence: [
            [3, 5, true, 10],   // Shift
            [3, 5, false, 50],
            [1, 0, true, 100],  // A
            [0, 4, true, 20],   // B
            [1, 0, false, 20],
            [0, 4, false, 20],
        ],
        expected_reports: [
            [KC_LSHIFT, [0; 6]],
            [KC_LSHIFT, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [kc8!(A), kc8!(B), 0, 0, 0, 0]],
            [0, [0, kc8!(B), 0, 0, 0, 0]],
            [0, [0; 6]],
        ]
    };
}

#[test]
fn test_one_shot_shift_hold_is_primary_layer() {
    let mut keyboard = create_test_keyboard();
    key_sequence_test! {
        keyboard: &mut keyboard,
        sequence: [
            [3, 5, true, 10],   // Shift
            [1, 3, true, 50],   // T -> Minus on the primary layer
            [1, 3, false, 50],
            [3, 5, false, 50],
            [1, 3, true, 50],   // T
            [1, 3, false, 50],
        ],
        expected_reports: [
            [0, [kc8!(Minus), 0, 0, 0, 0, 0]],
            [0, [0; 6]],
            [0, [kc8!(T), 0, 0, 0, 0, 0]],
            [0, [0; 6]],
        ]
    };
    assert_eq!(keyboard.layer_state(), 0b1);
    assert!(keyboard.is_idle());
}

#[test]
fn test_primary_layer_shifted_symbol() {
    // `!` is shift + 1
    key_sequence_test! {
        keyboard: create_test_keyboard(),
        sequence: [
            [3, 5, true, 10],   // Shift
            [0, 0, true, 50],   // Q -> !
            [0, 0, false, 50],
            [3, 5, false, 50],
        ],
        expected_reports: [
            [KC_LSHIFT, [kc8!(Kc1), 0, 0, 0, 0, 0]],
            [KC_LSHIFT, [0; 6]],
            [0, [0; 6]],
        ]
    };
}

#[test]
fn test_one_shot_shift_double_tap_disarms() {
    let mut keyboard = create_test_keyboard();
    key_sequence_test! {
        keyboard: &mut keyboard,
        sequence: [
            [3, 5, true, 10],   // Shift
            [3, 5, false, 50],
            [3, 5, true, 50],   // Shift again
            [3, 5, false, 50],
            [1, 0, true, 50],   // A
            [1, 0, false, 50],
        ],
        expected_reports: [
            [KC_LSHIFT, [0; 6]],
            [0, [0; 6]],
            [0, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [0; 6]],
        ]
    };
    assert!(keyboard.is_idle());
}

#[test]
fn test_one_shot_ctrl_from_combo() {
    // C + D is the one-shot ctrl key
    let mut keyboard = create_test_keyboard();
    key_sequence_test! {
        keyboard: &mut keyboard,
        sequence: [
            [2, 2, true, 10],   // C
            [2, 3, true, 10],   // D
            [2, 2, false, 20],
            [2, 3, false, 10],
            [1, 0, true, 100],  // A
            [1, 0, false, 50],
        ],
        expected_reports: [
            [KC_LCTRL, [0; 6]],
            [KC_LCTRL, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [0; 6]],
        ]
    };
    assert!(keyboard.is_idle());
}

#[test]
fn test_one_shot_ctrl_and_shift() {
    key_sequence_test! {
        keyboard: create_test_keyboard(),
        sequence: [
            [2, 2, true, 10],   // C
            [2, 3, true, 10],   // D
            [2, 2, false, 20],
            [2, 3, false, 10],
            [3, 5, true, 100],  // Shift
            [3, 5, false, 50],
            [1, 0, true, 100],  // A
            [1, 0, false, 50],
        ],
        expected_reports: [
            [KC_LCTRL, [0; 6]],
            [KC_LCTRL | KC_LSHIFT, [0; 6]],
            [KC_LCTRL | KC_LSHIFT, [kc8!(A), 0, 0, 0, 0, 0]],
            [KC_LCTRL, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [0; 6]],
        ]
    };
}

#[test]
fn test_function_layer_keeps_one_shot_shift() {
    // The function layer key doesn't consume the armed shift
    key_sequence_test! {
        keyboard: create_test_keyboard(),
        sequence: [
            [3, 5, true, 10],   // Shift
            [3, 5, false, 50],
            [3, 6, true, 100],  // Function layer
            [3, 6, false, 50],
            [1, 0, true, 100],  // A -> F1
            [1, 0, false, 50],
            [1, 0, true, 50],   // A
            [1, 0, false, 50],
        ],
        expected_reports: [
            [KC_LSHIFT, [0; 6]],
            [KC_LSHIFT, [kc8!(F1), 0, 0, 0, 0, 0]],
            [0, [kc8!(F1), 0, 0, 0, 0, 0]],
            [0, [0; 6]],
            [0, [kc8!(A), 0, 0, 0, 0, 0]],
            [0, [0; 6]],
        ]
    };
}
