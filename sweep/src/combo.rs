use embassy_time::{Duration, Instant};
use heapless::Vec;
use sweep_types::action::KeyAction;

use crate::config::ConfigError;
use crate::event::KeyboardEvent;

// Max number of combos
pub const COMBO_MAX_NUM: usize = 8;
// Max number of member keys of a combo
pub const COMBO_MAX_LENGTH: usize = 4;
// A buffer replay plus the event that caused it
pub(crate) const COMBO_DISPATCH_SIZE: usize = COMBO_MAX_LENGTH + 1;

/// Idle time of combos which don't set their own
pub const DEFAULT_COMBO_IDLE_TIME: Duration = Duration::from_millis(50);

/// Key events the dispatcher must handle, in order
pub(crate) type ComboDispatch = Vec<(KeyAction, KeyboardEvent), COMBO_DISPATCH_SIZE>;

/// A chord of member keys which is reinterpreted as a single output key
#[derive(Clone, Debug)]
pub struct ComboConfig {
    pub(crate) actions: Vec<KeyAction, COMBO_MAX_LENGTH>,
    pub(crate) output: KeyAction,
    pub(crate) layer: Option<u8>,
    pub(crate) must_press_in_order: bool,
    pub(crate) term: Option<Duration>,
    pub(crate) idle_time: Duration,
    pub(crate) always_on: bool,
}

impl ComboConfig {
    pub fn new<I: IntoIterator<Item = KeyAction>>(
        actions: I,
        output: KeyAction,
        layer: Option<u8>,
    ) -> Result<Self, ConfigError> {
        let mut members = Vec::new();
        for action in actions {
            members.push(action).map_err(|_| ConfigError::TooManyComboKeys)?;
        }
        if members.is_empty() {
            return Err(ConfigError::EmptyCombo);
        }
        Ok(Self {
            actions: members,
            output,
            layer,
            must_press_in_order: false,
            term: None,
            idle_time: DEFAULT_COMBO_IDLE_TIME,
            always_on: false,
        })
    }

    /// Members must be pressed in the declared order
    pub fn in_order(mut self) -> Self {
        self.must_press_in_order = true;
        self
    }

    /// Use a term other than `CombosConfig::timeout`
    pub fn with_term(mut self, term: Duration) -> Self {
        self.term = Some(term);
        self
    }

    /// Minimum time since the last key event outside of a combo
    pub fn with_idle_time(mut self, idle_time: Duration) -> Self {
        self.idle_time = idle_time;
        self
    }

    /// Trigger regardless of armed one-shots and the idle time
    pub fn always_on(mut self) -> Self {
        self.always_on = true;
        self
    }

    pub fn output(&self) -> KeyAction {
        self.output
    }
}

/// Dispatcher state a combo trigger depends on
#[derive(Clone, Copy, Debug)]
pub(crate) struct ComboGate {
    /// Any one-shot machine is not disabled
    pub(crate) one_shot_active: bool,
    /// Last key event the dispatcher handled
    pub(crate) last_key_event: Option<Instant>,
    pub(crate) active_layer: u8,
}

/// A triggered combo whose member keys are still down
#[derive(Clone, Debug)]
struct ActiveCombo {
    output: KeyAction,
    row: u8,
    col: u8,
    members: Vec<(u8, u8), COMBO_MAX_LENGTH>,
    released: bool,
}

/// Buffers member key presses until a combo completes, or replays them when none can.
pub(crate) struct ComboDetector {
    combos: Vec<ComboConfig, COMBO_MAX_NUM>,
    default_term: Duration,
    /// Member presses not dispatched yet, in press order
    buffer: Vec<(KeyAction, KeyboardEvent), COMBO_MAX_LENGTH>,
    active: Vec<ActiveCombo, COMBO_MAX_NUM>,
}

impl ComboDetector {
    pub(crate) fn new(combos: Vec<ComboConfig, COMBO_MAX_NUM>, default_term: Duration) -> Self {
        Self {
            combos,
            default_term,
            buffer: Vec::new(),
            active: Vec::new(),
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.buffer.is_empty() && self.active.is_empty()
    }

    fn term(&self, combo: &ComboConfig) -> Duration {
        combo.term.unwrap_or(self.default_term)
    }

    /// Whether the buffer plus `next` can still grow into `combo`
    fn accepts(&self, combo: &ComboConfig, next: Option<KeyAction>, now: Instant, layer: u8) -> bool {
        if combo.layer.is_some_and(|l| l != layer) {
            return false;
        }
        if let Some((_, first)) = self.buffer.first() {
            if now.saturating_duration_since(first.time) > self.term(combo) {
                return false;
            }
        }
        let pressed = self.buffer.iter().map(|(a, _)| *a).chain(next);
        for (i, action) in pressed.enumerate() {
            if matches!(action, KeyAction::No | KeyAction::Transparent) {
                return false;
            }
            if combo.must_press_in_order {
                if combo.actions.get(i) != Some(&action) {
                    return false;
                }
            } else if !combo.actions.contains(&action) {
                return false;
            }
        }
        match next {
            Some(action) => !self.buffer.iter().any(|(a, _)| *a == action),
            None => true,
        }
    }

    fn any_accepts(&self, next: Option<KeyAction>, now: Instant, layer: u8) -> bool {
        self.combos.iter().any(|c| self.accepts(c, next, now, layer))
    }

    fn allowed(combo: &ComboConfig, now: Instant, gate: &ComboGate) -> bool {
        if combo.always_on {
            return true;
        }
        if gate.one_shot_active {
            debug!("Combo {:?} suppressed by an armed one-shot", combo.output);
            return false;
        }
        match gate.last_key_event {
            Some(last) if now.saturating_duration_since(last) < combo.idle_time => {
                debug!("Combo {:?} suppressed, typing too fast", combo.output);
                false
            }
            _ => true,
        }
    }

    /// Feed a key event whose action was resolved from the keymap.
    pub(crate) fn process(&mut self, action: KeyAction, event: KeyboardEvent, gate: &ComboGate) -> ComboDispatch {
        let mut dispatch = ComboDispatch::new();

        if !event.pressed {
            if self.release_active(event, &mut dispatch) {
                return dispatch;
            }
            // Releasing anything while chording ends the chord
            self.flush_into(&mut dispatch);
            push(&mut dispatch, action, event);
            return dispatch;
        }

        if !self.buffer.is_empty() && !self.any_accepts(Some(action), event.time, gate.active_layer) {
            self.flush_into(&mut dispatch);
        }
        if !self.any_accepts(Some(action), event.time, gate.active_layer) || self.buffer.push((action, event)).is_err() {
            push(&mut dispatch, action, event);
            return dispatch;
        }

        let mut waiting = false;
        let mut triggered = None;
        for (i, combo) in self.combos.iter().enumerate() {
            if !self.accepts(combo, None, event.time, gate.active_layer) {
                continue;
            }
            if combo.actions.len() > self.buffer.len() {
                waiting = true;
            } else if Self::allowed(combo, event.time, gate) {
                triggered = Some(i);
                break;
            }
        }

        match triggered {
            Some(i) => self.trigger(i, event, &mut dispatch),
            None if !waiting => self.flush_into(&mut dispatch),
            None => (),
        }
        dispatch
    }

    fn trigger(&mut self, index: usize, event: KeyboardEvent, dispatch: &mut ComboDispatch) {
        let output = self.combos[index].output;
        let members = self.buffer.iter().map(|(_, e)| (e.row, e.col)).collect();
        let active = ActiveCombo {
            output,
            row: event.row,
            col: event.col,
            members,
            released: false,
        };
        if self.active.push(active).is_err() {
            warn!("Too many active combos, replaying members");
            self.flush_into(dispatch);
            return;
        }
        debug!("Combo {:?} triggered", output);
        self.buffer.clear();
        push(dispatch, output, event);
    }

    /// Release the output of a triggered combo, or absorb a member key-up.
    fn release_active(&mut self, event: KeyboardEvent, dispatch: &mut ComboDispatch) -> bool {
        let Some(i) = self.active.iter().position(|c| c.members.contains(&(event.row, event.col))) else {
            return false;
        };
        let combo = &mut self.active[i];
        combo.members.retain(|m| *m != (event.row, event.col));
        if !combo.released {
            combo.released = true;
            let release = KeyboardEvent::key(combo.row, combo.col, false, event.time);
            push(dispatch, combo.output, release);
        }
        if combo.members.is_empty() {
            self.active.swap_remove(i);
        }
        true
    }

    fn flush_into(&mut self, dispatch: &mut ComboDispatch) {
        if !self.buffer.is_empty() {
            debug!("Replaying {} buffered combo keys", self.buffer.len());
        }
        for (action, event) in self.buffer.iter() {
            push(dispatch, *action, *event);
        }
        self.buffer.clear();
    }

    /// Replay the buffer if no combo can complete anymore.
    pub(crate) fn expire(&mut self, now: Instant, active_layer: u8) -> ComboDispatch {
        let mut dispatch = ComboDispatch::new();
        if !self.buffer.is_empty() && !self.any_accepts(None, now, active_layer) {
            self.flush_into(&mut dispatch);
        }
        dispatch
    }

    /// When the buffered keys must be replayed at the latest
    pub(crate) fn deadline(&self, active_layer: u8) -> Option<Instant> {
        let (_, first) = self.buffer.first()?;
        let term = self
            .combos
            .iter()
            .filter(|c| self.accepts(c, None, first.time, active_layer))
            .map(|c| self.term(c))
            .max()
            .unwrap_or(Duration::from_ticks(0));
        Some(first.time + term + Duration::from_ticks(1))
    }
}

fn push(dispatch: &mut ComboDispatch, action: KeyAction, event: KeyboardEvent) {
    if dispatch.push((action, event)).is_err() {
        warn!("Combo dispatch buffer full, dropping {:?}", action);
    }
}
