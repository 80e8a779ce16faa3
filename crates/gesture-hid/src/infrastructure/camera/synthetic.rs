//! Blank frames with an increasing sequence number.
//!
//! Pairs with the `replay` estimator, which ignores pixel content.

use tracing::debug;

use crate::application::sources::{CaptureError, Frame, FrameSource};

#[derive(Debug)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    next_sequence: u64,
    open: bool,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_sequence: 0,
            open: false,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::Open(format!(
                "invalid frame size {}x{}",
                self.width, self.height
            )));
        }
        debug!("synthetic source opened at {}x{}", self.width, self.height);
        self.open = true;
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CaptureError> {
        if !self.open {
            return Err(CaptureError::NotOpen);
        }
        let frame = Frame::blank(self.next_sequence, self.width, self.height);
        self.next_sequence += 1;
        Ok(frame)
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
