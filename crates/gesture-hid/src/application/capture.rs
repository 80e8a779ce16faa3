//! Capture loop for the async pipeline mode.
//!
//! The loop samples the [`FrameSource`] at a bounded rate and publishes each
//! frame into a [`FrameBuffer`].  Capture errors are logged and retried after
//! a backoff; only the running flag ends the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use super::frame_buffer::FrameBuffer;
use super::sources::{next_frame, CaptureError, Frame, FrameSource};

/// Pacing for [`capture_loop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTiming {
    /// Minimum time between two captures.
    pub interval: Duration,
    /// Pause after a failed capture.
    pub backoff: Duration,
}

/// Runs [`capture_loop`] on a dedicated named thread.
///
/// # Errors
///
/// [`CaptureError::Spawn`] if the OS refuses to create the thread.
pub fn spawn_capture_thread(
    mut source: Box<dyn FrameSource>,
    buffer: Arc<FrameBuffer<Frame>>,
    running: Arc<AtomicBool>,
    timing: CaptureTiming,
) -> Result<JoinHandle<()>, CaptureError> {
    std::thread::Builder::new()
        .name("gesture-capture".to_string())
        .spawn(move || capture_loop(source.as_mut(), &buffer, &running, timing))
        .map_err(CaptureError::Spawn)
}

/// Captures into `buffer` until `running` is cleared, then closes `source`.
pub fn capture_loop(
    source: &mut dyn FrameSource,
    buffer: &FrameBuffer<Frame>,
    running: &AtomicBool,
    timing: CaptureTiming,
) {
    info!("capture loop started");
    while running.load(Ordering::Relaxed) {
        let started = Instant::now();
        match next_frame(source) {
            Ok(frame) => {
                let seq = frame.sequence;
                if buffer.put(frame) {
                    trace!("frame {seq} replaced an unconsumed frame");
                }
            }
            Err(e) => {
                warn!("capture failed, retrying in {:?}: {e}", timing.backoff);
                std::thread::sleep(timing.backoff);
                continue;
            }
        }
        if let Some(rest) = timing.interval.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    source.close();
    debug!("capture loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails every other capture.
    struct FlakySource {
        open: bool,
        calls: u64,
        closed: Arc<AtomicBool>,
    }

    impl FrameSource for FlakySource {
        fn open(&mut self) -> Result<(), CaptureError> {
            self.open = true;
            Ok(())
        }

        fn capture(&mut self) -> Result<Frame, CaptureError> {
            self.calls += 1;
            if self.calls % 2 == 0 {
                return Err(CaptureError::Read("injected failure".to_string()));
            }
            Ok(Frame::blank(self.calls, 2, 2))
        }

        fn close(&mut self) {
            self.open = false;
            self.closed.store(true, Ordering::Relaxed);
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    #[test]
    fn test_capture_thread_survives_errors_and_stops_on_flag() {
        // Arrange
        let closed = Arc::new(AtomicBool::new(false));
        let source = FlakySource {
            open: false,
            calls: 0,
            closed: Arc::clone(&closed),
        };
        let buffer = Arc::new(FrameBuffer::new());
        let running = Arc::new(AtomicBool::new(true));
        let timing = CaptureTiming {
            interval: Duration::from_millis(1),
            backoff: Duration::from_millis(1),
        };

        // Act
        let handle =
            spawn_capture_thread(Box::new(source), Arc::clone(&buffer), Arc::clone(&running), timing)
                .expect("spawn");
        let mut seen = Vec::new();
        while seen.len() < 3 {
            if let Some(frame) = buffer.take(Duration::from_secs(5)) {
                seen.push(frame.sequence);
            } else {
                break;
            }
        }
        running.store(false, Ordering::Relaxed);
        handle.join().expect("capture thread joins");

        // Assert
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|s| s % 2 == 1), "only successful captures are published");
        assert!(closed.load(Ordering::Relaxed));
    }

    #[test]
    fn test_capture_loop_returns_immediately_when_not_running() {
        let closed = Arc::new(AtomicBool::new(false));
        let mut source = FlakySource {
            open: false,
            calls: 0,
            closed: Arc::clone(&closed),
        };
        let buffer = FrameBuffer::new();
        let running = AtomicBool::new(false);

        capture_loop(
            &mut source,
            &buffer,
            &running,
            CaptureTiming {
                interval: Duration::from_millis(1),
                backoff: Duration::from_millis(1),
            },
        );

        assert_eq!(source.calls, 0);
        assert!(buffer.is_empty());
        assert!(closed.load(Ordering::Relaxed));
    }
}
