//! In-memory [`PacketLink`] for tests and dry runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::PacketLink;
use crate::application::synthesize::TransportError;

/// Records every delivered packet.  Clones share the same record, so a test
/// can keep one handle while the pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingLink {
    delivered: Arc<Mutex<Vec<Vec<u8>>>>,
    should_fail: Arc<AtomicBool>,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent deliveries fail until reset.
    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    pub fn delivered(&self) -> Vec<Vec<u8>> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PacketLink for RecordingLink {
    fn deliver(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(TransportError::Link("injected failure".to_string()));
        }
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(bytes.to_vec());
        Ok(())
    }
}
