pub mod test_macro;

use embassy_time::Instant;
use log::debug;
use sweep::event::{ControllerEvent, KeyboardEvent, Output};
use sweep::hid::{KeyboardReport, Report};
use sweep::layout::{self, COL, NUM_LAYER, ROW};
use sweep::Keyboard;

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub(crate) const KC_LCTRL: u8 = 1 << 0;
pub(crate) const KC_LSHIFT: u8 = 1 << 1;
pub(crate) const KC_RALT: u8 = 1 << 6;

// Max number of deadlines handled after the last key event
const MAX_TRAILING_TICKS: usize = 16;

#[derive(Debug, Clone)]
pub struct TestKeyPress {
    pub row: u8,
    pub col: u8,
    pub pressed: bool,
    pub delay: u64, // Delay before this key event in milliseconds
}

pub type SweepKeyboard = Keyboard<'static, ROW, COL, NUM_LAYER>;

pub fn create_test_keyboard() -> SweepKeyboard {
    Keyboard::new(&layout::KEYMAP, layout::behavior().unwrap())
}

/// Handle every deadline up to `now`, like the run loop's timer would
pub fn advance(keyboard: &mut SweepKeyboard, now: Instant) {
    while let Some(deadline) = keyboard.deadline() {
        if deadline > now {
            break;
        }
        keyboard.tick(deadline);
    }
}

/// Handle the remaining deadlines, as if no key is pressed for a long time
pub fn settle(keyboard: &mut SweepKeyboard) {
    for _ in 0..MAX_TRAILING_TICKS {
        match keyboard.deadline() {
            Some(deadline) => keyboard.tick(deadline),
            None => return,
        }
    }
    panic!("Keyboard keeps scheduling deadlines");
}

pub fn drain_outputs(keyboard: &mut SweepKeyboard) -> Vec<Output> {
    core::iter::from_fn(|| keyboard.next_output()).collect()
}

// Feed the key sequence, then let all pending timeouts expire. Returns everything the keyboard produced
pub fn run_key_sequence(keyboard: &mut SweepKeyboard, key_sequence: &[TestKeyPress]) -> Vec<Output> {
    let mut now = 0;
    let mut outputs = Vec::new();
    for key in key_sequence {
        now += key.delay;
        let time = Instant::from_millis(now);
        advance(keyboard, time);
        keyboard.process(KeyboardEvent::key(key.row, key.col, key.pressed, time));
        outputs.extend(drain_outputs(keyboard));
    }
    settle(keyboard);
    outputs.extend(drain_outputs(keyboard));
    outputs
}

pub fn keyboard_reports(outputs: &[Output]) -> Vec<KeyboardReport> {
    outputs
        .iter()
        .filter_map(|output| match output {
            Output::Report(Report::KeyboardReport(report)) => Some(*report),
            other => {
                debug!("other output {:?}", other);
                None
            }
        })
        .collect()
}

pub fn controller_events(outputs: &[Output]) -> Vec<ControllerEvent> {
    outputs
        .iter()
        .filter_map(|output| match output {
            Output::Controller(event) => Some(*event),
            _ => None,
        })
        .collect()
}

// run a keyboard test, input is seq of key input with delay, use expected report to verify
pub fn run_key_sequence_test(
    keyboard: &mut SweepKeyboard,
    key_sequence: &[TestKeyPress],
    expected_reports: &[KeyboardReport],
) -> Vec<Output> {
    let outputs = run_key_sequence(keyboard, key_sequence);
    let reports = keyboard_reports(&outputs);
    for (index, (expected, report)) in expected_reports.iter().zip(reports.iter()).enumerate() {
        assert_eq!(
            expected, report,
            "on #{} reports, expected left but actually right",
            index
        );
    }
    assert_eq!(
        expected_reports.len(),
        reports.len(),
        "expected {} reports, got {:?}",
        expected_reports.len(),
        reports
    );
    outputs
}
