//! # gesture-core
//!
//! Shared library for Gesture-HID containing the pose classifier, the
//! gesture-to-symbol mapper, the HID symbol tables, and the binary packet
//! framing understood by the keyboard/mouse bridge.
//!
//! This crate has zero dependencies on cameras, inference runtimes, OS APIs,
//! or network sockets.  Everything in it is deterministic and can be unit
//! tested on any platform.
//!
//! # Architecture overview (for beginners)
//!
//! Gesture-HID turns body poses seen by a camera into keyboard and mouse
//! input on another machine.  A hardware bridge (a small microcontroller that
//! pretends to be a USB keyboard and mouse) receives short binary packets over
//! TCP and replays them to the computer it is plugged into.
//!
//! This crate (`gesture-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure business logic.  Keypoints (body joints) are compared
//!   against authored gesture templates with cosine similarity, and the
//!   resulting set of active gestures is mapped to symbol names such as `"w"`
//!   or `"mouse_wheel_up"`.
//!
//! - **`keymap`** – Translation from symbol names to USB HID Usage IDs for
//!   keys, and to mouse action tags for the mouse.
//!
//! - **`protocol`** – How bytes travel to the bridge.  Keyboard reports and
//!   relative mouse reports are framed with a fixed header and a one-byte
//!   additive checksum.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `gesture_core::PoseClassifier` instead of the full module path.
pub use domain::classifier::PoseClassifier;
pub use domain::keypoint::{Joint, Keypoint, KeypointSet};
pub use domain::mapper::{GestureMapper, MappingRule};
pub use domain::template::{FovTag, GestureIndex, GestureMatch, GestureTemplate, TemplateError};
pub use keymap::hid::HidKeyCode;
pub use keymap::{ActionSymbol, MouseAction, SplitSymbols, SymbolTable};
pub use protocol::mouse::MouseReport;
pub use protocol::packet::{
    decode_packet, encode_keyboard_packet, encode_mouse_packet, to_hex, BridgePacket, PacketError,
};
