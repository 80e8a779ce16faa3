//! CommandSynthesizer: turns the symbols of one cycle into bridge packets.
//!
//! # How dedup works (for beginners)
//!
//! The bridge replays every packet it receives.  Sending the same "W is held"
//! report thirty times a second would make the remote machine see key
//! repeat, so the synthesizer remembers what it last delivered in a
//! [`SentState`] and only transmits when something changed:
//!
//! - **Keyboard** – sent when the set of held keys differs from the last
//!   delivered set.  An empty set becomes the all-zero "release" report.
//! - **Mouse** – every mouse action of the cycle is folded into *one* report.
//!   Button changes follow the same change-only rule as the keyboard.  Wheel
//!   and movement actions are *transient*: they only have an effect while
//!   they keep arriving, so a set containing one is sent every cycle.
//!
//! State is only updated after the transport reports success, so a packet
//! lost to a network error is attempted again on the next cycle.

use std::collections::BTreeSet;

use gesture_core::protocol::mouse::MouseReport;
use gesture_core::{encode_keyboard_packet, encode_mouse_packet, HidKeyCode, MouseAction, SymbolTable};
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum number of keys in one keyboard report.
const MAX_KEYS: usize = 8;

// ── Transport seam ────────────────────────────────────────────────────────────

/// Error type for packet delivery.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not resolve bridge address {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bridge address {0} resolved to no socket address")]
    NoAddress(String),

    #[error("connecting to {addr} timed out")]
    Timeout { addr: std::net::SocketAddr },

    #[error("connecting to {addr} failed: {source}")]
    Connect {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("writing to {addr} failed: {source}")]
    Write {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("link failure: {0}")]
    Link(String),
}

/// What the transport did with a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The bytes went out on the wire.
    Sent,
    /// Identical to the last delivered bytes; nothing was sent.
    Suppressed,
}

/// Delivers framed packets to the bridge.
///
/// The infrastructure layer provides the TCP implementation.
pub trait HidTransport: Send {
    /// Sends `bytes` unless they equal the last delivered bytes and
    /// `ignore_cache` is false.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the bridge could not be reached.
    fn send(&mut self, bytes: &[u8], ignore_cache: bool) -> Result<Dispatch, TransportError>;
}

// ── Synthesizer ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Keyboard,
    Mouse,
}

/// A packet that actually reached the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    pub kind: PacketKind,
    pub bytes: Vec<u8>,
}

/// What was last delivered.  `None` means "unknown", which forces the next
/// cycle to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentState {
    pub keyboard: Option<BTreeSet<HidKeyCode>>,
    pub mouse: Option<BTreeSet<MouseAction>>,
    pub last_keyboard_packet: Option<Vec<u8>>,
    pub last_mouse_report: MouseReport,
}

/// Owns the dedup state for one processing loop.
#[derive(Debug, Default)]
pub struct CommandSynthesizer {
    table: SymbolTable,
    state: SentState,
}

impl CommandSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SentState {
        &self.state
    }

    /// Forgets everything delivered so far.
    pub fn reset(&mut self) {
        self.state = SentState::default();
    }

    /// Sends whatever `symbols` requires beyond what was already delivered.
    ///
    /// Returns the packets that went out.  Transport errors are logged and
    /// leave the state untouched.
    pub fn synthesize<S: AsRef<str>>(
        &mut self,
        symbols: &[S],
        transport: &mut dyn HidTransport,
    ) -> Vec<SentPacket> {
        let split = self.table.split(symbols);
        let mut sent = Vec::new();

        // Keyboard
        let mut keys: Vec<HidKeyCode> = Vec::with_capacity(MAX_KEYS);
        for key in split.keys {
            if keys.len() == MAX_KEYS {
                debug!("more than {MAX_KEYS} keys active, dropping {key}");
                continue;
            }
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        let key_set: BTreeSet<HidKeyCode> = keys.iter().copied().collect();
        if self.state.keyboard.as_ref() != Some(&key_set) {
            let bytes = encode_keyboard_packet(&keys);
            if let Some(dispatch) = deliver(transport, &bytes, false) {
                self.state.keyboard = Some(key_set);
                self.state.last_keyboard_packet = Some(bytes.clone());
                if dispatch == Dispatch::Sent {
                    sent.push(SentPacket {
                        kind: PacketKind::Keyboard,
                        bytes,
                    });
                }
            }
        }

        // Mouse
        let mouse_set: BTreeSet<MouseAction> = split.mouse.into_iter().collect();
        let transient = mouse_set.iter().any(|a| a.is_transient());
        let changed = self.state.mouse.as_ref() != Some(&mouse_set);
        if transient || changed {
            if mouse_set.is_empty() && !self.state.last_mouse_report.holds_button() {
                // Nothing held and nothing moving: the bridge is already idle.
                self.state.mouse = Some(mouse_set);
            } else {
                let actions: Vec<MouseAction> = mouse_set.iter().copied().collect();
                let report = MouseReport::combine(&actions);
                let bytes = encode_mouse_packet(&report);
                if let Some(dispatch) = deliver(transport, &bytes, transient) {
                    self.state.mouse = Some(mouse_set);
                    self.state.last_mouse_report = report;
                    if dispatch == Dispatch::Sent {
                        sent.push(SentPacket {
                            kind: PacketKind::Mouse,
                            bytes,
                        });
                    }
                }
            }
        }

        sent
    }

    /// Releases every key, and the mouse buttons if one was held, bypassing
    /// both dedup layers.
    pub fn stop(&mut self, transport: &mut dyn HidTransport) -> Vec<SentPacket> {
        let release_mouse = self.state.last_mouse_report.holds_button();
        self.release(transport, release_mouse)
    }

    /// Like [`CommandSynthesizer::stop`] but always sends the neutral mouse
    /// report, for when the bridge state is unknown.
    pub fn release_all(&mut self, transport: &mut dyn HidTransport) -> Vec<SentPacket> {
        self.release(transport, true)
    }

    fn release(&mut self, transport: &mut dyn HidTransport, release_mouse: bool) -> Vec<SentPacket> {
        let mut sent = Vec::new();

        let bytes = encode_keyboard_packet(&[]);
        match deliver(transport, &bytes, true) {
            Some(_) => {
                self.state.keyboard = Some(BTreeSet::new());
                self.state.last_keyboard_packet = Some(bytes.clone());
                sent.push(SentPacket {
                    kind: PacketKind::Keyboard,
                    bytes,
                });
            }
            None => self.state.keyboard = None,
        }

        if release_mouse {
            let report = MouseReport::neutral();
            let bytes = encode_mouse_packet(&report);
            match deliver(transport, &bytes, true) {
                Some(_) => {
                    self.state.mouse = Some(BTreeSet::new());
                    self.state.last_mouse_report = report;
                    sent.push(SentPacket {
                        kind: PacketKind::Mouse,
                        bytes,
                    });
                }
                None => self.state.mouse = None,
            }
        }

        sent
    }
}

fn deliver(transport: &mut dyn HidTransport, bytes: &[u8], ignore_cache: bool) -> Option<Dispatch> {
    match transport.send(bytes, ignore_cache) {
        Ok(dispatch) => Some(dispatch),
        Err(e) => {
            warn!("packet not delivered: {e}");
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
