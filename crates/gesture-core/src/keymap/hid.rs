//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page) and their symbol names.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! # What is a HID Usage ID? (for beginners)
//!
//! The **USB Human Interface Device (HID)** standard assigns a number to every
//! physical key position.  A keyboard report is just a list of up to eight of
//! these numbers, one per key currently held.  The bridge forwards reports to
//! the host unchanged, so the numbers below are exactly what ends up on the
//! wire.
//!
//! | Symbol        | HID Usage ID |
//! |---------------|--------------|
//! | `"a"`         | 0x04         |
//! | `"enter"`     | 0x28         |
//! | `"left_ctrl"` | 0xE0         |
//!
//! Gesture files refer to keys by *symbol name* (the left column).  The table
//! in this module is the single source of truth for both directions.

use serde::{Deserialize, Serialize};

/// USB HID Usage ID for the keys a gesture can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum HidKeyCode {
    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control and punctuation (HID 0x28–0x39)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,

    // Function keys (HID 0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Arrows (HID 0x4F–0x52)
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    // Keypad (HID 0x53–0x63)
    NumLock = 0x53,
    NumpadDivide = 0x54,
    NumpadMultiply = 0x55,
    NumpadSubtract = 0x56,
    NumpadAdd = 0x57,
    NumpadEnter = 0x58,
    Numpad1 = 0x59,
    Numpad2 = 0x5A,
    Numpad3 = 0x5B,
    Numpad4 = 0x5C,
    Numpad5 = 0x5D,
    Numpad6 = 0x5E,
    Numpad7 = 0x5F,
    Numpad8 = 0x60,
    Numpad9 = 0x61,
    Numpad0 = 0x62,
    NumpadDecimal = 0x63,

    // Modifiers (HID 0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,
}

/// Symbol name ↔ key code, one row per key.
const SYMBOLS: &[(&str, HidKeyCode)] = &[
    ("a", HidKeyCode::KeyA),
    ("b", HidKeyCode::KeyB),
    ("c", HidKeyCode::KeyC),
    ("d", HidKeyCode::KeyD),
    ("e", HidKeyCode::KeyE),
    ("f", HidKeyCode::KeyF),
    ("g", HidKeyCode::KeyG),
    ("h", HidKeyCode::KeyH),
    ("i", HidKeyCode::KeyI),
    ("j", HidKeyCode::KeyJ),
    ("k", HidKeyCode::KeyK),
    ("l", HidKeyCode::KeyL),
    ("m", HidKeyCode::KeyM),
    ("n", HidKeyCode::KeyN),
    ("o", HidKeyCode::KeyO),
    ("p", HidKeyCode::KeyP),
    ("q", HidKeyCode::KeyQ),
    ("r", HidKeyCode::KeyR),
    ("s", HidKeyCode::KeyS),
    ("t", HidKeyCode::KeyT),
    ("u", HidKeyCode::KeyU),
    ("v", HidKeyCode::KeyV),
    ("w", HidKeyCode::KeyW),
    ("x", HidKeyCode::KeyX),
    ("y", HidKeyCode::KeyY),
    ("z", HidKeyCode::KeyZ),
    ("1", HidKeyCode::Digit1),
    ("2", HidKeyCode::Digit2),
    ("3", HidKeyCode::Digit3),
    ("4", HidKeyCode::Digit4),
    ("5", HidKeyCode::Digit5),
    ("6", HidKeyCode::Digit6),
    ("7", HidKeyCode::Digit7),
    ("8", HidKeyCode::Digit8),
    ("9", HidKeyCode::Digit9),
    ("0", HidKeyCode::Digit0),
    ("enter", HidKeyCode::Enter),
    ("esc", HidKeyCode::Escape),
    ("backspace", HidKeyCode::Backspace),
    ("tab", HidKeyCode::Tab),
    ("space", HidKeyCode::Space),
    ("-", HidKeyCode::Minus),
    ("=", HidKeyCode::Equal),
    ("[", HidKeyCode::BracketLeft),
    ("]", HidKeyCode::BracketRight),
    ("\\", HidKeyCode::Backslash),
    (";", HidKeyCode::Semicolon),
    ("'", HidKeyCode::Quote),
    ("`", HidKeyCode::Backquote),
    (",", HidKeyCode::Comma),
    (".", HidKeyCode::Period),
    ("/", HidKeyCode::Slash),
    ("caps_lock", HidKeyCode::CapsLock),
    ("f1", HidKeyCode::F1),
    ("f2", HidKeyCode::F2),
    ("f3", HidKeyCode::F3),
    ("f4", HidKeyCode::F4),
    ("f5", HidKeyCode::F5),
    ("f6", HidKeyCode::F6),
    ("f7", HidKeyCode::F7),
    ("f8", HidKeyCode::F8),
    ("f9", HidKeyCode::F9),
    ("f10", HidKeyCode::F10),
    ("f11", HidKeyCode::F11),
    ("f12", HidKeyCode::F12),
    ("right", HidKeyCode::ArrowRight),
    ("left", HidKeyCode::ArrowLeft),
    ("down", HidKeyCode::ArrowDown),
    ("up", HidKeyCode::ArrowUp),
    ("num_lock", HidKeyCode::NumLock),
    ("kp_/", HidKeyCode::NumpadDivide),
    ("kp_*", HidKeyCode::NumpadMultiply),
    ("kp_-", HidKeyCode::NumpadSubtract),
    ("kp_+", HidKeyCode::NumpadAdd),
    ("kp_enter", HidKeyCode::NumpadEnter),
    ("kp_1", HidKeyCode::Numpad1),
    ("kp_2", HidKeyCode::Numpad2),
    ("kp_3", HidKeyCode::Numpad3),
    ("kp_4", HidKeyCode::Numpad4),
    ("kp_5", HidKeyCode::Numpad5),
    ("kp_6", HidKeyCode::Numpad6),
    ("kp_7", HidKeyCode::Numpad7),
    ("kp_8", HidKeyCode::Numpad8),
    ("kp_9", HidKeyCode::Numpad9),
    ("kp_0", HidKeyCode::Numpad0),
    ("kp_.", HidKeyCode::NumpadDecimal),
    ("left_ctrl", HidKeyCode::ControlLeft),
    ("left_shift", HidKeyCode::ShiftLeft),
    ("left_alt", HidKeyCode::AltLeft),
    ("left_gui", HidKeyCode::MetaLeft),
    ("right_ctrl", HidKeyCode::ControlRight),
    ("right_shift", HidKeyCode::ShiftRight),
    ("right_alt", HidKeyCode::AltRight),
    ("right_gui", HidKeyCode::MetaRight),
];

impl HidKeyCode {
    /// Looks up the key for a symbol name such as `"w"` or `"left_shift"`.
    pub fn from_symbol(name: &str) -> Option<Self> {
        SYMBOLS.iter().find(|(s, _)| *s == name).map(|(_, k)| *k)
    }

    /// The symbol name used in gesture files.
    pub fn symbol(self) -> &'static str {
        SYMBOLS
            .iter()
            .find(|(_, k)| *k == self)
            .map(|(s, _)| *s)
            .unwrap_or("?")
    }

    /// Converts a raw Usage ID.  Returns `None` for IDs not in the table.
    pub fn from_u8(value: u8) -> Option<Self> {
        SYMBOLS.iter().map(|(_, k)| *k).find(|k| k.as_u8() == value)
    }

    /// The raw Usage ID placed in the keyboard report.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_modifier(self) -> bool {
        (0xE0..=0xE7).contains(&self.as_u8())
    }

    /// Every known key, in table order.
    pub fn all() -> impl Iterator<Item = HidKeyCode> {
        SYMBOLS.iter().map(|(_, k)| *k)
    }
}

impl std::fmt::Display for HidKeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
