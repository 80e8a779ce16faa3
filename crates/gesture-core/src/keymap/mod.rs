//! Symbol names → keyboard codes and mouse actions.
//!
//! Gesture rules emit plain strings (`"w"`, `"left_shift"`,
//! `"mouse_wheel_up"`).  [`SymbolTable`] resolves each one to either a
//! [`HidKeyCode`] or a [`MouseAction`].
//!
//! Mouse actions carry a small negative *tag* (`-1` … `-11`).  The tags are
//! what gesture-authoring tools store next to key codes, so keyboard and mouse
//! actions can share one integer column: non-negative means key, negative
//! means mouse.

pub mod hid;

pub use hid::HidKeyCode;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Horizontal distance, in mouse counts, of one relative-move action.
pub const MOVE_STEP: i8 = 10;

/// A mouse operation a gesture can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseAction {
    LeftPress,
    LeftRelease,
    RightPress,
    RightRelease,
    MiddlePress,
    MiddleRelease,
    WheelUp,
    WheelDown,
    MoveLeft,
    MoveRight,
    /// Releases every button.
    ReleaseAll,
}

impl MouseAction {
    pub const ALL: [MouseAction; 11] = [
        MouseAction::LeftPress,
        MouseAction::LeftRelease,
        MouseAction::RightPress,
        MouseAction::RightRelease,
        MouseAction::MiddlePress,
        MouseAction::MiddleRelease,
        MouseAction::WheelUp,
        MouseAction::WheelDown,
        MouseAction::MoveLeft,
        MouseAction::MoveRight,
        MouseAction::ReleaseAll,
    ];

    /// The negative integer tag stored by authoring tools.
    pub fn tag(self) -> i8 {
        match self {
            MouseAction::LeftPress => -1,
            MouseAction::LeftRelease => -2,
            MouseAction::RightPress => -3,
            MouseAction::RightRelease => -4,
            MouseAction::MiddlePress => -5,
            MouseAction::MiddleRelease => -6,
            MouseAction::WheelUp => -7,
            MouseAction::WheelDown => -8,
            MouseAction::MoveLeft => -9,
            MouseAction::MoveRight => -10,
            MouseAction::ReleaseAll => -11,
        }
    }

    pub fn from_tag(tag: i8) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.tag() == tag)
    }

    /// The symbol name used in gesture files.
    pub fn symbol(self) -> &'static str {
        match self {
            MouseAction::LeftPress => "mouse_left_click",
            MouseAction::LeftRelease => "mouse_left_release",
            MouseAction::RightPress => "mouse_right_click",
            MouseAction::RightRelease => "mouse_right_release",
            MouseAction::MiddlePress => "mouse_middle_click",
            MouseAction::MiddleRelease => "mouse_middle_release",
            MouseAction::WheelUp => "mouse_wheel_up",
            MouseAction::WheelDown => "mouse_wheel_down",
            MouseAction::MoveLeft => "mouse_move_left",
            MouseAction::MoveRight => "mouse_move_right",
            MouseAction::ReleaseAll => "mouse_release",
        }
    }

    pub fn from_symbol(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.symbol() == name)
    }

    /// Wheel and movement actions must be resent every cycle to keep having
    /// an effect.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            MouseAction::WheelUp
                | MouseAction::WheelDown
                | MouseAction::MoveLeft
                | MouseAction::MoveRight
        )
    }
}

impl std::fmt::Display for MouseAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A resolved symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionSymbol {
    Key(HidKeyCode),
    Mouse(MouseAction),
}

impl ActionSymbol {
    /// Integer code as stored by authoring tools: the Usage ID for keys, the
    /// negative tag for mouse actions.
    pub fn code(self) -> i16 {
        match self {
            ActionSymbol::Key(k) => i16::from(k.as_u8()),
            ActionSymbol::Mouse(m) => i16::from(m.tag()),
        }
    }
}

/// Keyboard and mouse halves of one symbol list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSymbols {
    pub keys: Vec<HidKeyCode>,
    pub mouse: Vec<MouseAction>,
}

/// Resolves symbol names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolTable;

impl SymbolTable {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, name: &str) -> Option<ActionSymbol> {
        if let Some(key) = HidKeyCode::from_symbol(name) {
            return Some(ActionSymbol::Key(key));
        }
        MouseAction::from_symbol(name).map(ActionSymbol::Mouse)
    }

    /// Splits `symbols` into keys and mouse actions, preserving order.
    ///
    /// Unknown names are dropped with a warning.
    pub fn split<S: AsRef<str>>(&self, symbols: &[S]) -> SplitSymbols {
        let mut out = SplitSymbols::default();
        for name in symbols {
            let name = name.as_ref();
            match self.resolve(name) {
                Some(ActionSymbol::Key(k)) => out.keys.push(k),
                Some(ActionSymbol::Mouse(m)) => out.mouse.push(m),
                None => warn!("unknown symbol '{name}' ignored"),
            }
        }
        out
    }
}
