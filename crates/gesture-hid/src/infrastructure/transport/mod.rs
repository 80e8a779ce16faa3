//! Transport infrastructure: getting framed packets to the bridge.
//!
//! Architecture:
//! - A [`PacketLink`] moves raw bytes and knows nothing about dedup.
//!   [`tcp::TcpLink`] is the real one; [`mock::RecordingLink`] records
//!   bytes for tests.
//! - [`Transport`] wraps a link and implements the application's
//!   [`HidTransport`]: it remembers the last delivered bytes and skips an
//!   identical packet unless the caller asks to ignore the cache.

pub mod mock;
pub mod tcp;

use tracing::{debug, trace};

use gesture_core::to_hex;

use crate::application::synthesize::{Dispatch, HidTransport, TransportError};

pub use tcp::TcpLink;

/// Delivers one packet, with no memory of earlier ones.
pub trait PacketLink: Send {
    /// # Errors
    ///
    /// Returns [`TransportError`] when the bytes could not be delivered.
    fn deliver(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

/// A [`PacketLink`] plus the last-delivered-bytes cache.
pub struct Transport<L> {
    link: L,
    last_sent: Option<Vec<u8>>,
}

/// The production transport.
pub type TcpTransport = Transport<TcpLink>;

impl<L: PacketLink> Transport<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            last_sent: None,
        }
    }

    /// The bytes of the last successful delivery.
    pub fn last_sent(&self) -> Option<&[u8]> {
        self.last_sent.as_deref()
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

impl<L: PacketLink> HidTransport for Transport<L> {
    fn send(&mut self, bytes: &[u8], ignore_cache: bool) -> Result<Dispatch, TransportError> {
        if !ignore_cache && self.last_sent.as_deref() == Some(bytes) {
            trace!("suppressed duplicate packet {}", to_hex(bytes));
            return Ok(Dispatch::Suppressed);
        }
        self.link.deliver(bytes)?;
        debug!("sent {}", to_hex(bytes));
        self.last_sent = Some(bytes.to_vec());
        Ok(Dispatch::Sent)
    }
}
