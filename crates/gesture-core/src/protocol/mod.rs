//! Binary framing understood by the keyboard/mouse bridge.

pub mod mouse;
pub mod packet;

pub use mouse::MouseReport;
pub use packet::{
    checksum, decode_packet, encode_keyboard_packet, encode_mouse_packet, to_hex, BridgePacket,
    PacketError,
};
