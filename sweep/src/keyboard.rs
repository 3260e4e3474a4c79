pub(crate) mod oneshot;

use embassy_futures::select::{Either, select};
use embassy_time::{Instant, Timer};
use heapless::Vec;
use sweep_types::action::{Action, KeyAction, OneShotSlot};

use crate::Runnable;
use crate::channel::{CONTROLLER_CHANNEL, KEY_EVENT_CHANNEL, KEYBOARD_REPORT_CHANNEL};
use crate::combo::{ComboDetector, ComboGate};
use crate::config::{BehaviorConfig, LayerSwapConfig, OneShotConfig, PASSTHROUGH_MAX_NUM};
use crate::event::{KeyboardEvent, Output};
use crate::keyboard::oneshot::OneShotLayerState;
use crate::keymap::KeyMap;
use crate::oneshot::{OneShotEffects, OneShotState, OneShotStatus};
use crate::state::KeyboardState;

/// The key decision engine.
///
/// Every debounced key event goes through [`Keyboard::process`], which resolves
/// the event against the keymap, runs the combo detector and dispatches the
/// resulting actions. Outputs are queued and taken with [`Keyboard::next_output`],
/// or forwarded to the channels by [`Runnable::run`].
pub struct Keyboard<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    state: KeyboardState<'a, ROW, COL, NUM_LAYER>,

    /// Shift-class one-shot, usually holding a layer
    shift: OneShotState,
    /// Control-class one-shot
    ctrl: OneShotState,

    /// One shot layer state
    osl_state: OneShotLayerState,
    /// Consecutive taps of the current one shot layer key
    osl_taps: u8,
    one_shot: OneShotConfig,

    combos: ComboDetector,

    /// Time of the last key event which reached the dispatcher
    last_key_event: Option<Instant>,

    /// The shift one-shot key holds its layer while caps word is active
    primary_after_caps_word: bool,

    layer_swap: Option<LayerSwapConfig>,
    /// The swap layer was turned on by the swap trigger
    layer_swap_active: bool,

    /// Keys which don't touch the one-shot machines
    passthrough: Vec<KeyAction, PASSTHROUGH_MAX_NUM>,
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> Keyboard<'a, ROW, COL, NUM_LAYER> {
    pub fn new(layers: &'a [[[KeyAction; COL]; ROW]; NUM_LAYER], behavior: BehaviorConfig) -> Self {
        let state = KeyboardState::new(KeyMap::new(layers), &behavior);
        Keyboard {
            state,
            shift: OneShotState::new(behavior.user_one_shot.shift),
            ctrl: OneShotState::new(behavior.user_one_shot.ctrl),
            osl_state: OneShotLayerState::default(),
            osl_taps: 0,
            one_shot: behavior.one_shot,
            combos: ComboDetector::new(behavior.combo.combos, behavior.combo.timeout),
            last_key_event: None,
            primary_after_caps_word: false,
            layer_swap: behavior.layer_swap,
            layer_swap_active: false,
            passthrough: behavior.user_one_shot.passthrough,
        }
    }

    /// Process a debounced key event
    pub fn process(&mut self, event: KeyboardEvent) {
        // Soft deadlines which passed before this event
        self.tick(event.time);

        let action = self.state.keymap.get_action_with_layer_cache(event);
        debug!("Processing {:?}: {:?}", event, action);
        let gate = self.combo_gate();
        for (action, event) in self.combos.process(action, event, &gate) {
            self.process_key_action(action, event);
        }
    }

    /// Handle timeouts: combo terms, the one shot layer and caps word
    pub fn tick(&mut self, now: Instant) {
        let layer = self.state.keymap.get_activated_layer();
        for (action, event) in self.combos.expire(now, layer) {
            self.process_key_action(action, event);
        }
        self.expire_osl(now);
        self.state.expire_caps_word(now);
    }

    /// When [`Keyboard::tick`] must be called next, if anything is pending
    pub fn deadline(&self) -> Option<Instant> {
        let layer = self.state.keymap.get_activated_layer();
        [
            self.combos.deadline(layer),
            self.osl_deadline(),
            self.state.caps_word.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Take the next report or controller event
    pub fn next_output(&mut self) -> Option<Output> {
        self.state.pop_output()
    }

    pub fn one_shot_status(&self, slot: OneShotSlot) -> OneShotStatus {
        match slot {
            OneShotSlot::Shift => self.shift.status(),
            OneShotSlot::Ctrl => self.ctrl.status(),
        }
    }

    /// Bitset of the active layers, including the default layer
    pub fn layer_state(&self) -> u32 {
        self.state.keymap.layer_state()
    }

    pub fn is_caps_word_active(&self) -> bool {
        self.state.caps_word.is_active()
    }

    /// No key, modifier, one-shot or combo is pending
    pub fn is_idle(&self) -> bool {
        self.shift.is_disabled()
            && self.ctrl.is_disabled()
            && matches!(self.osl_state, OneShotLayerState::None | OneShotLayerState::Locked(_))
            && self.combos.is_idle()
            && self.state.is_idle()
            && !self.layer_swap_active
            && !self.primary_after_caps_word
    }

    fn combo_gate(&self) -> ComboGate {
        ComboGate {
            one_shot_active: !self.shift.is_disabled() || !self.ctrl.is_disabled(),
            last_key_event: self.last_key_event,
            active_layer: self.state.keymap.get_activated_layer(),
        }
    }

    /// Route a key event to the one-shot machines and the action handlers
    fn process_key_action(&mut self, action: KeyAction, event: KeyboardEvent) {
        self.last_key_event = Some(event.time);

        match action {
            KeyAction::Single(Action::UserOneShot(OneShotSlot::Shift)) => self.process_user_shift(event),
            KeyAction::Single(Action::UserOneShot(OneShotSlot::Ctrl)) => {
                self.ctrl.apply(event.pressed, &mut self.state);
                self.shift.notify_other_key(event.pressed, &mut self.state);
            }
            _ if self.passthrough.contains(&action) => self.process_action(action, event),
            _ => match self.layer_swap {
                Some(swap) if swap.trigger == action => self.process_layer_swap(swap, action, event),
                _ => {
                    self.notify_one_shots(event.pressed);
                    self.process_action(action, event);
                }
            },
        }

        if !matches!(action, KeyAction::OneShot(Action::LayerOn(_))) {
            self.update_osl(event);
        }
    }

    /// Shift-class one-shot key, acting as a plain layer key while caps word is on
    fn process_user_shift(&mut self, event: KeyboardEvent) {
        if event.pressed && self.state.caps_word.is_active() {
            // Registering and unregistering shift would end caps word
            self.shift.hold_layer(&mut self.state);
            self.primary_after_caps_word = true;
        } else if !event.pressed && self.primary_after_caps_word {
            // Tapping the key ends caps word
            if self.shift.release_layer(&mut self.state) {
                self.state.deactivate_caps_word();
            }
            self.primary_after_caps_word = false;
        } else {
            self.shift.apply(event.pressed, &mut self.state);
        }
    }

    /// The swap trigger replaces an armed one-shot shift with the swap layer
    fn process_layer_swap(&mut self, swap: LayerSwapConfig, action: KeyAction, event: KeyboardEvent) {
        if event.pressed && self.shift.status() == OneShotStatus::Released && self.ctrl.is_disabled() {
            self.shift.cancel(&mut self.state);
            self.state.layer_on(swap.layer);
            self.layer_swap_active = true;
        } else if !event.pressed && self.layer_swap_active {
            self.state.layer_off(swap.layer);
            self.layer_swap_active = false;
        } else {
            self.notify_one_shots(event.pressed);
            self.process_action(action, event);
        }
    }

    fn notify_one_shots(&mut self, pressed: bool) {
        self.shift.notify_other_key(pressed, &mut self.state);
        self.ctrl.notify_other_key(pressed, &mut self.state);
    }

    fn process_action(&mut self, action: KeyAction, event: KeyboardEvent) {
        match action {
            KeyAction::No | KeyAction::Transparent => (),
            KeyAction::Single(a) => self.process_action_normal(a, event),
            KeyAction::OneShot(Action::LayerOn(layer_num)) => self.process_action_osl(layer_num, event),
            KeyAction::OneShot(a) => {
                warn!("One shot {:?} is not supported, processing it as a normal action", a);
                self.process_action_normal(a, event);
            }
        }
    }

    fn process_action_normal(&mut self, action: Action, event: KeyboardEvent) {
        match action {
            Action::Key(key) => self.state.process_key(key, event),
            Action::KeyWithModifier(key, modifiers) => self.state.process_key_with_modifier(key, modifiers, event),
            Action::LayerOn(layer_num) => {
                if event.pressed {
                    self.state.layer_on(layer_num);
                } else {
                    self.state.layer_off(layer_num);
                }
            }
            Action::LayerToggle(layer_num) => {
                if event.pressed {
                    self.state.toggle_layer(layer_num);
                }
            }
            Action::LayerToggleOnly(layer_num) => {
                if event.pressed {
                    self.state.move_to_layer(layer_num);
                }
            }
            // Handled before the one-shot machines are notified
            Action::UserOneShot(_) => (),
        }
    }

    /// Forward queued outputs to the channels
    async fn send_outputs(&mut self) {
        while let Some(output) = self.state.pop_output() {
            match output {
                Output::Report(report) => KEYBOARD_REPORT_CHANNEL.send(report).await,
                Output::Controller(event) => {
                    if CONTROLLER_CHANNEL.try_send(event).is_err() {
                        warn!("Controller channel is full, dropping {:?}", event);
                    }
                }
            }
        }
    }
}

impl<const ROW: usize, const COL: usize, const NUM_LAYER: usize> Runnable for Keyboard<'_, ROW, COL, NUM_LAYER> {
    async fn run(&mut self) -> ! {
        loop {
            let event = match self.deadline() {
                Some(deadline) => match select(Timer::at(deadline), KEY_EVENT_CHANNEL.receive()).await {
                    Either::First(_) => None,
                    Either::Second(event) => Some(event),
                },
                None => Some(KEY_EVENT_CHANNEL.receive().await),
            };
            match event {
                Some(event) => self.process(event),
                None => self.tick(Instant::now()),
            }
            self.send_outputs().await;
        }
    }
}

#[cfg(test)]
mod test {
    use sweep_types::keycode::KeyCode;

    use super::*;
    use crate::config::{OneShotBinding, UserOneShotConfig};
    use crate::event::ControllerEvent;
    use crate::hid::Report;
    use crate::{k, layer, mo, osl, user_os};

    static LAYERS: [[[KeyAction; 4]; 1]; 3] = [
        layer!([[user_os!(Shift), user_os!(Ctrl), k!(A), osl!(2)]]),
        layer!([[k!(Kc1), k!(Kc2), k!(Kc3), mo!(2)]]),
        layer!([[k!(F1), k!(F2), k!(F3), k!(F4)]]),
    ];

    fn keyboard() -> Keyboard<'static, 1, 4, 3> {
        let behavior = BehaviorConfig {
            user_one_shot: UserOneShotConfig::new(
                OneShotBinding::new(KeyCode::LShift, Some(1)),
                OneShotBinding::new(KeyCode::LCtrl, None),
                [],
            )
            .unwrap(),
            ..Default::default()
        };
        Keyboard::new(&LAYERS, behavior)
    }

    fn tap(keyboard: &mut Keyboard<'static, 1, 4, 3>, col: u8, ms: u64) {
        keyboard.process(KeyboardEvent::key(0, col, true, Instant::from_millis(ms)));
        keyboard.process(KeyboardEvent::key(0, col, false, Instant::from_millis(ms + 10)));
    }

    fn reports(keyboard: &mut Keyboard<'static, 1, 4, 3>) -> std::vec::Vec<(u8, u8)> {
        core::iter::from_fn(|| keyboard.next_output())
            .filter_map(|o| match o {
                Output::Report(Report::KeyboardReport(r)) => Some((r.modifier, r.keycodes[0])),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_one_shot_ctrl_applies_once() {
        let mut keyboard = keyboard();
        tap(&mut keyboard, 1, 0);
        assert_eq!(keyboard.one_shot_status(OneShotSlot::Ctrl), OneShotStatus::Released);
        tap(&mut keyboard, 2, 100);
        tap(&mut keyboard, 2, 200);
        assert_eq!(
            reports(&mut keyboard),
            [(0x01, 0), (0x01, 0x04), (0, 0x04), (0, 0), (0, 0x04), (0, 0)]
        );
        assert!(keyboard.is_idle());
    }

    #[test]
    fn test_shift_layer_hold() {
        let mut keyboard = keyboard();
        keyboard.process(KeyboardEvent::key(0, 0, true, Instant::from_millis(0)));
        assert_eq!(keyboard.layer_state(), 0b11);
        tap(&mut keyboard, 2, 10);
        keyboard.process(KeyboardEvent::key(0, 0, false, Instant::from_millis(50)));
        assert_eq!(keyboard.layer_state(), 0b1);
        // Kc3 on the held layer, without shift
        assert_eq!(reports(&mut keyboard), [(0, 0x20), (0, 0)]);
        assert!(keyboard.is_idle());
    }

    #[test]
    fn test_one_shot_layer_timeout() {
        let mut keyboard = keyboard();
        tap(&mut keyboard, 3, 0);
        assert_eq!(keyboard.layer_state(), 0b101);
        assert_eq!(keyboard.deadline(), Some(Instant::from_millis(3010)));
        keyboard.tick(Instant::from_millis(3009));
        assert_eq!(keyboard.layer_state(), 0b101);
        keyboard.tick(Instant::from_millis(3010));
        assert_eq!(keyboard.layer_state(), 0b1);
        assert!(keyboard.is_idle());
    }

    #[test]
    fn test_one_shot_layer_applies_to_next_key() {
        let mut keyboard = keyboard();
        tap(&mut keyboard, 3, 0);
        tap(&mut keyboard, 2, 100);
        tap(&mut keyboard, 2, 200);
        assert_eq!(
            reports(&mut keyboard),
            [(0, KeyCode::F3 as u8), (0, 0), (0, 0x04), (0, 0)]
        );
        let outputs: std::vec::Vec<Output> = core::iter::from_fn(|| keyboard.next_output()).collect();
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_one_shot_layer_tap_toggle() {
        let mut keyboard = keyboard();
        for i in 0..4 {
            tap(&mut keyboard, 3, i * 100);
        }
        assert_eq!(keyboard.osl_state, OneShotLayerState::Single(2, Instant::from_millis(310)));

        // The fifth tap locks the layer, it no longer times out or ends with the next key
        tap(&mut keyboard, 3, 400);
        assert_eq!(keyboard.osl_state, OneShotLayerState::Locked(2));
        assert_eq!(keyboard.deadline(), None);
        tap(&mut keyboard, 2, 500);
        keyboard.tick(Instant::from_millis(10_000));
        assert_eq!(keyboard.layer_state(), 0b101);
        assert!(keyboard.is_idle());

        // Pressed again, the layer is unlocked
        tap(&mut keyboard, 3, 10_100);
        assert_eq!(keyboard.layer_state(), 0b1);
        tap(&mut keyboard, 2, 10_200);
        assert_eq!(
            reports(&mut keyboard),
            [(0, KeyCode::F3 as u8), (0, 0), (0, 0x04), (0, 0)]
        );
        assert!(keyboard.is_idle());
    }

    #[test]
    fn test_layer_events_are_queued() {
        let mut keyboard = keyboard();
        keyboard.process(KeyboardEvent::key(0, 0, true, Instant::from_millis(0)));
        assert_eq!(
            keyboard.next_output(),
            Some(Output::Controller(ControllerEvent::Layer(1, true)))
        );
    }
}
