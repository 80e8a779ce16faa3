//! Keyboard and mouse frames for the bridge.
//!
//! Wire format (every field is one byte):
//! ```text
//! keyboard: [0x57 0xAB][addr=0x00][cmd=0x02][len=0x08][report:8][checksum]
//! mouse:    [0x57 0xAB][addr=0x00][cmd=0x05][len=0x05][0x01][buttons][x][y][wheel][checksum]
//! ```
//! `checksum` is the sum of every preceding byte, header included, modulo 256.
//! Signed mouse fields are sent as their two's-complement byte.

use std::fmt::Write as _;

use thiserror::Error;

use crate::keymap::hid::HidKeyCode;
use crate::protocol::mouse::MouseReport;

pub const HEADER: [u8; 2] = [0x57, 0xAB];
pub const ADDRESS: u8 = 0x00;
pub const CMD_KEYBOARD: u8 = 0x02;
pub const CMD_MOUSE_RELATIVE: u8 = 0x05;

/// Report bytes in a keyboard frame.
pub const KEYBOARD_REPORT_LEN: usize = 8;
/// Data bytes in a mouse frame (mode, buttons, x, y, wheel).
pub const MOUSE_DATA_LEN: usize = 5;
/// First data byte of a relative mouse frame.
pub const MOUSE_MODE_RELATIVE: u8 = 0x01;

/// header + addr + cmd + len
const PREAMBLE_LEN: usize = 5;
pub const KEYBOARD_PACKET_LEN: usize = PREAMBLE_LEN + KEYBOARD_REPORT_LEN + 1;
pub const MOUSE_PACKET_LEN: usize = PREAMBLE_LEN + MOUSE_DATA_LEN + 1;

/// Errors raised while decoding a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("bad frame header: {0:02X} {1:02X}")]
    BadHeader(u8, u8),

    #[error("unknown command: 0x{0:02X}")]
    UnknownCommand(u8),

    #[error("command 0x{command:02X} declares length {declared}, expected {expected}")]
    LengthMismatch {
        command: u8,
        declared: u8,
        expected: u8,
    },

    #[error("checksum mismatch: frame says 0x{found:02X}, computed 0x{computed:02X}")]
    BadChecksum { found: u8, computed: u8 },

    #[error("unsupported mouse mode: 0x{0:02X}")]
    UnsupportedMouseMode(u8),
}

/// A decoded bridge frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePacket {
    Keyboard([u8; KEYBOARD_REPORT_LEN]),
    Mouse(MouseReport),
}

impl BridgePacket {
    /// The all-zero keyboard report: every key released.
    pub fn keyboard_release() -> Self {
        BridgePacket::Keyboard([0; KEYBOARD_REPORT_LEN])
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            BridgePacket::Keyboard(report) => frame(CMD_KEYBOARD, report),
            BridgePacket::Mouse(report) => encode_mouse_packet(report),
        }
    }
}

/// Additive checksum of `bytes`, modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Lays out up to eight key codes right-aligned in an 8-byte report.
///
/// Fewer than eight codes are left-padded with zeros; codes beyond the eighth
/// are dropped.
pub fn keyboard_report(codes: &[HidKeyCode]) -> [u8; KEYBOARD_REPORT_LEN] {
    let mut report = [0u8; KEYBOARD_REPORT_LEN];
    let used = codes.len().min(KEYBOARD_REPORT_LEN);
    let start = KEYBOARD_REPORT_LEN - used;
    for (slot, code) in report[start..].iter_mut().zip(codes) {
        *slot = code.as_u8();
    }
    report
}

/// Encodes a keyboard frame for the given held keys.  An empty slice yields
/// the release-all frame.
///
/// # Examples
///
/// ```rust
/// use gesture_core::{encode_keyboard_packet, HidKeyCode};
///
/// let bytes = encode_keyboard_packet(&[HidKeyCode::KeyA]);
/// assert_eq!(
///     bytes,
///     [0x57, 0xAB, 0x00, 0x02, 0x08, 0, 0, 0, 0, 0, 0, 0, 0x04, 0x10]
/// );
/// ```
pub fn encode_keyboard_packet(codes: &[HidKeyCode]) -> Vec<u8> {
    frame(CMD_KEYBOARD, &keyboard_report(codes))
}

/// Encodes a relative mouse frame.
pub fn encode_mouse_packet(report: &MouseReport) -> Vec<u8> {
    let data = [
        MOUSE_MODE_RELATIVE,
        report.buttons,
        report.x as u8,
        report.y as u8,
        report.wheel as u8,
    ];
    frame(CMD_MOUSE_RELATIVE, &data)
}

fn frame(command: u8, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(PREAMBLE_LEN + data.len() + 1);
    buf.extend_from_slice(&HEADER);
    buf.push(ADDRESS);
    buf.push(command);
    buf.push(data.len() as u8);
    buf.extend_from_slice(data);
    buf.push(checksum(&buf));
    buf
}

/// Decodes one frame from the start of `bytes`.
///
/// Returns the packet and the number of bytes consumed.
///
/// # Errors
///
/// Returns [`PacketError`] if the frame is truncated, has an unknown command
/// or length, or fails the checksum.
pub fn decode_packet(bytes: &[u8]) -> Result<(BridgePacket, usize), PacketError> {
    require_len(bytes, PREAMBLE_LEN)?;
    if bytes[..2] != HEADER {
        return Err(PacketError::BadHeader(bytes[0], bytes[1]));
    }

    let command = bytes[3];
    let declared = bytes[4];
    let expected = match command {
        CMD_KEYBOARD => KEYBOARD_REPORT_LEN,
        CMD_MOUSE_RELATIVE => MOUSE_DATA_LEN,
        other => return Err(PacketError::UnknownCommand(other)),
    };
    if usize::from(declared) != expected {
        return Err(PacketError::LengthMismatch {
            command,
            declared,
            expected: expected as u8,
        });
    }

    let total = PREAMBLE_LEN + expected + 1;
    require_len(bytes, total)?;
    let computed = checksum(&bytes[..total - 1]);
    let found = bytes[total - 1];
    if computed != found {
        return Err(PacketError::BadChecksum { found, computed });
    }

    let data = &bytes[PREAMBLE_LEN..total - 1];
    let packet = if command == CMD_KEYBOARD {
        let mut report = [0u8; KEYBOARD_REPORT_LEN];
        report.copy_from_slice(data);
        BridgePacket::Keyboard(report)
    } else {
        if data[0] != MOUSE_MODE_RELATIVE {
            return Err(PacketError::UnsupportedMouseMode(data[0]));
        }
        BridgePacket::Mouse(MouseReport {
            buttons: data[1],
            x: data[2] as i8,
            y: data[3] as i8,
            wheel: data[4] as i8,
        })
    };
    Ok((packet, total))
}

fn require_len(bytes: &[u8], needed: usize) -> Result<(), PacketError> {
    if bytes.len() < needed {
        return Err(PacketError::InsufficientData {
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

/// Space-separated upper-case hex, as shown in logs and the command history.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02X}");
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_frame_for_single_key() {
        // Arrange / Act
        let bytes = encode_keyboard_packet(&[HidKeyCode::KeyA]);

        // Assert
        assert_eq!(
            bytes,
            vec![0x57, 0xAB, 0x00, 0x02, 0x08, 0, 0, 0, 0, 0, 0, 0, 0x04, 0x10]
        );
        assert_eq!(bytes.len(), KEYBOARD_PACKET_LEN);
    }

    #[test]
    fn test_release_frame_is_all_zero_report() {
        let bytes = encode_keyboard_packet(&[]);
        assert_eq!(&bytes[5..13], &[0u8; 8]);
        // 0x57 + 0xAB + 0x02 + 0x08 = 0x10C
        assert_eq!(bytes[13], 0x0C);
        assert_eq!(bytes, BridgePacket::keyboard_release().encode());
    }

    #[test]
    fn test_report_is_left_padded_and_keeps_order() {
        let report = keyboard_report(&[HidKeyCode::KeyW, HidKeyCode::ShiftLeft]);
        assert_eq!(report, [0, 0, 0, 0, 0, 0, 0x1A, 0xE1]);
    }

    #[test]
    fn test_report_keeps_first_eight_codes() {
        let codes: Vec<HidKeyCode> = ["a", "b", "c", "d", "e", "f", "g", "h", "i"]
            .iter()
            .filter_map(|s| HidKeyCode::from_symbol(s))
            .collect();
        let report = keyboard_report(&codes);
        assert_eq!(report, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B]);
    }

    #[test]
    fn test_mouse_frame_for_move_left_and_wheel_up() {
        // Arrange
        let report = MouseReport {
            buttons: 0,
            x: -10,
            y: 0,
            wheel: 1,
        };

        // Act
        let bytes = encode_mouse_packet(&report);

        // Assert
        assert_eq!(
            bytes,
            vec![0x57, 0xAB, 0x00, 0x05, 0x05, 0x01, 0x00, 0xF6, 0x00, 0x01, 0x04]
        );
        assert_eq!(bytes.len(), MOUSE_PACKET_LEN);
    }

    #[test]
    fn test_checksum_wraps_modulo_256() {
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(checksum(&[]), 0x00);
    }

    #[test]
    fn test_decode_reads_back_both_frame_kinds() {
        let kb = encode_keyboard_packet(&[HidKeyCode::Space]);
        let (packet, used) = decode_packet(&kb).unwrap();
        assert_eq!(packet, BridgePacket::Keyboard([0, 0, 0, 0, 0, 0, 0, 0x2C]));
        assert_eq!(used, KEYBOARD_PACKET_LEN);

        let report = MouseReport {
            buttons: 0x03,
            x: 127,
            y: -127,
            wheel: -1,
        };
        let (packet, used) = decode_packet(&encode_mouse_packet(&report)).unwrap();
        assert_eq!(packet, BridgePacket::Mouse(report));
        assert_eq!(used, MOUSE_PACKET_LEN);
    }

    #[test]
    fn test_decode_rejects_corrupted_checksum() {
        let mut bytes = encode_keyboard_packet(&[HidKeyCode::KeyA]);
        bytes[13] ^= 0xFF;
        assert_eq!(
            decode_packet(&bytes),
            Err(PacketError::BadChecksum {
                found: 0xEF,
                computed: 0x10,
            })
        );
    }

    #[test]
    fn test_decode_rejects_truncated_and_foreign_frames() {
        let bytes = encode_keyboard_packet(&[HidKeyCode::KeyA]);
        assert!(matches!(
            decode_packet(&bytes[..10]),
            Err(PacketError::InsufficientData { needed: 14, available: 10 })
        ));
        assert_eq!(
            decode_packet(&[0x55, 0xAA, 0, 2, 8]),
            Err(PacketError::BadHeader(0x55, 0xAA))
        );
        assert_eq!(
            decode_packet(&[0x57, 0xAB, 0, 0x09, 8]),
            Err(PacketError::UnknownCommand(0x09))
        );
        assert!(matches!(
            decode_packet(&[0x57, 0xAB, 0, 0x02, 6]),
            Err(PacketError::LengthMismatch { declared: 6, expected: 8, .. })
        ));
    }

    #[test]
    fn test_to_hex_formats_uppercase_pairs() {
        assert_eq!(to_hex(&[0x57, 0xAB, 0x00, 0x0F]), "57 AB 00 0F");
        assert_eq!(to_hex(&[]), "");
    }
}
