/// Create a layer in keymap
#[macro_export]
macro_rules! layer {
    ([$([$($x: expr), +]), +]) => {
        [$([$($x), +]),+]
    };
}

/// Create a normal key. For example, `k!(A)` represents `KeyAction::Single(Action::Key(KeyCode::A))`
#[macro_export]
macro_rules! k {
    ($k: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::Key($crate::keycode::KeyCode::$k))
    };
}

/// Create a normal key with modifier action, e.g. `wm!(Kc1, SHIFT)`
#[macro_export]
macro_rules! wm {
    ($x: ident, $m: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::KeyWithModifier(
            $crate::keycode::KeyCode::$x,
            $m,
        ))
    };
}

/// Create a normal action: `KeyAction`
#[macro_export]
macro_rules! a {
    ($a: ident) => {
        $crate::action::KeyAction::$a
    };
}

/// Create a layer activate action. For example, `mo!(1)` activates layer 1.
#[macro_export]
macro_rules! mo {
    ($x: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::LayerOn($x))
    };
}

/// Create a one-shot layer action
#[macro_export]
macro_rules! osl {
    ($x: expr) => {
        $crate::action::KeyAction::OneShot($crate::action::Action::LayerOn($x))
    };
}

/// Create a layer toggle action
#[macro_export]
macro_rules! tg {
    ($x: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::LayerToggle($x))
    };
}

/// Create a layer activate action, all other layers but the default one are turned off
#[macro_export]
macro_rules! to {
    ($x: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::LayerToggleOnly($x))
    };
}

/// Drive one of the custom one-shot machines, e.g. `user_os!(Shift)`
#[macro_export]
macro_rules! user_os {
    ($slot: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::UserOneShot(
            $crate::action::OneShotSlot::$slot,
        ))
    };
}
