//! HID and layer state shared by every behavior of the keyboard.
//!
//! Everything the engine produces is queued in an outbox, which is drained
//! either by the async run loop or directly by tests.
use embassy_time::Instant;
use heapless::Deque;
use sweep_types::keycode::KeyCode;
use sweep_types::modifier::{HidModifiers, ModifierCombination};

use crate::caps_word::CapsWord;
use crate::config::{BehaviorConfig, IndicatorConfig};
use crate::event::{ControllerEvent, KeyboardEvent, Output};
use crate::hid::{KeyboardReport, MouseReport, Report};
use crate::indicator::layer_indicator;
use crate::key_override::KeyOverrides;
use crate::keymap::KeyMap;
use crate::oneshot::OneShotEffects;

// Max number of outputs a single key event may queue
pub(crate) const OUTBOX_SIZE: usize = 32;
// Pointer movement of a single mouse key press
const MOUSE_MOVE_DELTA: i8 = 8;

pub(crate) struct KeyboardState<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    pub(crate) keymap: KeyMap<'a, ROW, COL, NUM_LAYER>,
    /// Modifiers registered by modifier keys and the one-shot machines
    held_modifiers: HidModifiers,
    /// Modifiers of the `KeyWithModifier` actions which are held
    with_modifiers: HidModifiers,
    /// Registered keys, 6KRO
    held_keycodes: [KeyCode; 6],
    /// Matrix positions of `held_keycodes`
    registered_keys: [Option<(u8, u8)>; 6],
    mouse_buttons: u8,
    pub(crate) caps_word: CapsWord,
    key_overrides: KeyOverrides,
    indicator: IndicatorConfig,
    last_report: KeyboardReport,
    outbox: Deque<Output, OUTBOX_SIZE>,
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> KeyboardState<'a, ROW, COL, NUM_LAYER> {
    pub(crate) fn new(keymap: KeyMap<'a, ROW, COL, NUM_LAYER>, behavior: &BehaviorConfig) -> Self {
        Self {
            keymap,
            held_modifiers: HidModifiers::new(),
            with_modifiers: HidModifiers::new(),
            held_keycodes: [KeyCode::No; 6],
            registered_keys: [None; 6],
            mouse_buttons: 0,
            caps_word: CapsWord::new(behavior.caps_word),
            key_overrides: KeyOverrides::new(behavior.key_override.overrides.clone()),
            indicator: behavior.indicator,
            last_report: KeyboardReport::default(),
            outbox: Deque::new(),
        }
    }

    /// Take the next queued output
    pub(crate) fn pop_output(&mut self) -> Option<Output> {
        self.outbox.pop_front()
    }

    fn push_output(&mut self, output: Output) {
        if self.outbox.push_back(output).is_err() {
            warn!("Output queue is full, dropping {:?}", output);
        }
    }

    pub(crate) fn push_controller_event(&mut self, event: ControllerEvent) {
        self.push_output(Output::Controller(event));
    }

    /// Modifiers which are held
    pub(crate) fn held_modifiers(&self) -> HidModifiers {
        self.held_modifiers | self.with_modifiers
    }

    /// Modifiers written into the report
    pub(crate) fn resolve_modifiers(&self) -> HidModifiers {
        (self.held_modifiers() | self.caps_word.modifiers()) & !self.key_overrides.suppressed()
    }

    /// Nothing is held or pending
    pub(crate) fn is_idle(&self) -> bool {
        self.held_modifiers().is_empty()
            && self.held_keycodes.iter().all(|k| *k == KeyCode::No)
            && self.mouse_buttons == 0
            && self.key_overrides.is_idle()
    }

    /// Queue a keyboard report if it differs from the last one
    pub(crate) fn send_keyboard_report(&mut self) {
        let report = KeyboardReport {
            modifier: self.resolve_modifiers().into_bits(),
            reserved: 0,
            leds: 0,
            keycodes: self.held_keycodes.map(KeyCode::as_report_code),
        };
        if report != self.last_report {
            self.last_report = report;
            self.push_output(Output::Report(Report::KeyboardReport(report)));
        }
    }

    fn send_mouse_report(&mut self, x: i8, y: i8, wheel: i8, pan: i8) {
        let report = MouseReport {
            buttons: self.mouse_buttons,
            x,
            y,
            wheel,
            pan,
        };
        self.push_output(Output::Report(Report::MouseReport(report)));
    }

    /// Press or release a key with extra modifiers
    pub(crate) fn process_key_with_modifier(
        &mut self,
        key: KeyCode,
        modifiers: ModifierCombination,
        event: KeyboardEvent,
    ) {
        let modifiers = modifiers.to_hid_modifiers();
        if event.pressed {
            self.with_modifiers |= modifiers;
            self.process_key(key, event);
        } else {
            self.process_key(key, event);
            self.with_modifiers &= !modifiers;
            self.send_keyboard_report();
        }
    }

    /// Press or release a keycode
    pub(crate) fn process_key(&mut self, key: KeyCode, event: KeyboardEvent) {
        if key.is_mouse_key() {
            self.process_mouse_key(key, event.pressed);
            return;
        }
        match key {
            KeyCode::Bootloader => {
                if event.pressed {
                    info!("Rebooting into the bootloader");
                    self.push_controller_event(ControllerEvent::Bootloader);
                }
            }
            KeyCode::CapsWordToggle => {
                if event.pressed {
                    if self.caps_word.is_active() {
                        self.deactivate_caps_word();
                    } else if self.caps_word.activate(event.time) {
                        debug!("Caps word on");
                        self.push_controller_event(ControllerEvent::CapsWord(true));
                    }
                }
            }
            _ if event.pressed => self.press_key(key, event),
            _ => self.release_key(key, event),
        }
    }

    fn press_key(&mut self, key: KeyCode, event: KeyboardEvent) {
        if self.caps_word.is_active() && !self.caps_word.on_key_press(key, self.held_modifiers(), event.time) {
            debug!("Caps word off");
            self.push_controller_event(ControllerEvent::CapsWord(false));
        }
        let key = self
            .key_overrides
            .try_start(key, event, self.held_modifiers)
            .unwrap_or(key);
        if key.is_modifier() {
            self.held_modifiers |= key.to_hid_modifiers();
        } else {
            self.register_keycode(key, event);
        }
        self.send_keyboard_report();
    }

    fn release_key(&mut self, key: KeyCode, event: KeyboardEvent) {
        let key = self.key_overrides.finish(event).unwrap_or(key);
        if key.is_modifier() {
            self.held_modifiers &= !key.to_hid_modifiers();
        } else {
            self.unregister_keycode(key, event);
        }
        self.send_keyboard_report();
    }

    pub(crate) fn deactivate_caps_word(&mut self) {
        if self.caps_word.deactivate() {
            debug!("Caps word off");
            self.push_controller_event(ControllerEvent::CapsWord(false));
            self.send_keyboard_report();
        }
    }

    /// Turn caps word off after its idle timeout
    pub(crate) fn expire_caps_word(&mut self, now: Instant) {
        if self.caps_word.expire(now) {
            debug!("Caps word timed out");
            self.push_controller_event(ControllerEvent::CapsWord(false));
            self.send_keyboard_report();
        }
    }

    fn process_mouse_key(&mut self, key: KeyCode, pressed: bool) {
        match key {
            KeyCode::MouseBtn1
            | KeyCode::MouseBtn2
            | KeyCode::MouseBtn3
            | KeyCode::MouseBtn4
            | KeyCode::MouseBtn5 => {
                let bit = 1 << (key as u16 - KeyCode::MouseBtn1 as u16);
                if pressed {
                    self.mouse_buttons |= bit;
                } else {
                    self.mouse_buttons &= !bit;
                }
                self.send_mouse_report(0, 0, 0, 0);
            }
            // Movement and wheel keys send a single step per press
            _ if !pressed => (),
            KeyCode::MouseUp => self.send_mouse_report(0, -MOUSE_MOVE_DELTA, 0, 0),
            KeyCode::MouseDown => self.send_mouse_report(0, MOUSE_MOVE_DELTA, 0, 0),
            KeyCode::MouseLeft => self.send_mouse_report(-MOUSE_MOVE_DELTA, 0, 0, 0),
            KeyCode::MouseRight => self.send_mouse_report(MOUSE_MOVE_DELTA, 0, 0, 0),
            KeyCode::MouseWheelUp => self.send_mouse_report(0, 0, 1, 0),
            KeyCode::MouseWheelDown => self.send_mouse_report(0, 0, -1, 0),
            KeyCode::MouseWheelLeft => self.send_mouse_report(0, 0, 0, -1),
            KeyCode::MouseWheelRight => self.send_mouse_report(0, 0, 0, 1),
            _ => warn!("Unsupported mouse key {:?}", key),
        }
    }

    /// Register a key to be sent in hid report.
    fn register_keycode(&mut self, key: KeyCode, event: KeyboardEvent) {
        // First, find the key event slot according to the position
        let slot = self
            .registered_keys
            .iter()
            .position(|k| *k == Some((event.row, event.col)));

        // If the slot is found, update the key in the slot
        if let Some(index) = slot {
            self.held_keycodes[index] = key;
        } else if let Some(index) = self.held_keycodes.iter().position(|&k| k == KeyCode::No) {
            // Otherwise, find the first free slot
            self.held_keycodes[index] = key;
            self.registered_keys[index] = Some((event.row, event.col));
        } else {
            warn!("Too many keys held, dropping {:?}", key);
        }
    }

    /// Unregister a key from hid report.
    fn unregister_keycode(&mut self, key: KeyCode, event: KeyboardEvent) {
        // First, find the key event slot according to the position
        let slot = self
            .registered_keys
            .iter()
            .position(|k| *k == Some((event.row, event.col)))
            // Otherwise, release the first same key
            .or_else(|| self.held_keycodes.iter().position(|&k| k == key && key != KeyCode::No));

        if let Some(index) = slot {
            self.held_keycodes[index] = KeyCode::No;
            self.registered_keys[index] = None;
        }
    }

    fn on_layer_change(&mut self, layer: u8, active: bool) {
        let highest = self.keymap.get_activated_layer();
        debug!("Layer {} {}, highest layer: {}", layer, if active { "on" } else { "off" }, highest);
        self.push_controller_event(ControllerEvent::Layer(layer, active));
        let indicator = layer_indicator(&self.indicator, highest);
        self.push_controller_event(ControllerEvent::Indicator(indicator));
    }

    pub(crate) fn toggle_layer(&mut self, layer: u8) {
        if layer as usize >= NUM_LAYER {
            warn!("Not a valid layer {}", layer);
            return;
        }
        let active = self.keymap.toggle_layer(layer);
        self.on_layer_change(layer, active);
    }

    /// Activate a layer and deactivate all other layers(except default layer)
    pub(crate) fn move_to_layer(&mut self, layer: u8) {
        if layer as usize >= NUM_LAYER {
            warn!("Not a valid layer {}", layer);
            return;
        }
        let cleared = self.keymap.clear_layers();
        for l in 0..NUM_LAYER as u8 {
            if cleared & (1 << l) != 0 && l != layer {
                self.on_layer_change(l, false);
            }
        }
        let was_active = cleared & (1 << layer) != 0;
        if self.keymap.activate_layer(layer) && !was_active {
            self.on_layer_change(layer, true);
        }
    }
}

impl<const ROW: usize, const COL: usize, const NUM_LAYER: usize> OneShotEffects for KeyboardState<'_, ROW, COL, NUM_LAYER> {
    fn register_modifier(&mut self, modifier: KeyCode) {
        self.held_modifiers |= modifier.to_hid_modifiers();
        self.send_keyboard_report();
    }

    fn unregister_modifier(&mut self, modifier: KeyCode) {
        self.held_modifiers &= !modifier.to_hid_modifiers();
        self.send_keyboard_report();
    }

    fn layer_on(&mut self, layer: u8) {
        if self.keymap.activate_layer(layer) {
            self.on_layer_change(layer, true);
        }
    }

    fn layer_off(&mut self, layer: u8) {
        if self.keymap.deactivate_layer(layer) {
            self.on_layer_change(layer, false);
        }
    }
}
