//! Single-slot, latest-wins mailbox between the capture thread and the
//! processing loop.
//!
//! A slower consumer never sees a backlog: every [`FrameBuffer::put`]
//! replaces whatever is waiting, and [`FrameBuffer::take`] removes it.  Each
//! put is delivered at most once.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

pub struct FrameBuffer<T> {
    slot: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> Default for FrameBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameBuffer<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Stores `item`, replacing any unconsumed one.
    ///
    /// Returns `true` if an unconsumed item was dropped.
    pub fn put(&self, item: T) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let dropped = slot.replace(item).is_some();
        drop(slot);
        self.ready.notify_one();
        dropped
    }

    /// Waits up to `timeout` for an item and removes it.
    pub fn take(&self, timeout: Duration) -> Option<T> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut slot, _) = self
            .ready
            .wait_timeout_while(slot, timeout, |s| s.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        slot.take()
    }

    /// Removes the waiting item without blocking.
    pub fn try_take(&self) -> Option<T> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_second_put_overwrites_first() {
        // Arrange
        let buffer = FrameBuffer::new();

        // Act
        let first_dropped = buffer.put(1);
        let second_dropped = buffer.put(2);

        // Assert
        assert!(!first_dropped);
        assert!(second_dropped);
        assert_eq!(buffer.take(Duration::from_millis(10)), Some(2));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_each_put_is_taken_once() {
        let buffer = FrameBuffer::new();
        buffer.put("frame");
        assert_eq!(buffer.try_take(), Some("frame"));
        assert_eq!(buffer.try_take(), None);
    }

    #[test]
    fn test_take_times_out_on_empty_buffer() {
        // Arrange
        let buffer: FrameBuffer<u32> = FrameBuffer::new();
        let start = Instant::now();

        // Act
        let item = buffer.take(Duration::from_millis(50));

        // Assert
        assert_eq!(item, None);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_take_wakes_on_put_from_other_thread() {
        // Arrange
        let buffer = Arc::new(FrameBuffer::new());
        let producer = Arc::clone(&buffer);

        // Act
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            producer.put(7u64);
        });
        let item = buffer.take(Duration::from_secs(5));

        // Assert
        assert_eq!(item, Some(7));
        handle.join().expect("producer joins");
    }
}
