//! Video4Linux2 capture device (`v4l2` feature).
//!
//! The device is asked for packed YUYV at exactly the configured size and
//! each buffer is converted to BGR, so no codec is involved.  Opening fails
//! when the device offers neither that format nor that size.

use tracing::{debug, info};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

use super::convert::yuyv_to_bgr;
use crate::application::sources::{CaptureError, Frame, FrameSource};

/// Kernel buffers mapped for streaming.
const BUFFER_COUNT: u32 = 4;

/// Open device state.  The stream is declared first so it is torn down
/// before the device handle.
struct Session {
    stream: MmapStream<'static>,
    _device: Device,
}

pub struct V4l2Source {
    device: String,
    width: u32,
    height: u32,
    fps: u32,
    session: Option<Session>,
    next_sequence: u64,
}

impl std::fmt::Debug for V4l2Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Source")
            .field("device", &self.device)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.fps)
            .field("open", &self.session.is_some())
            .finish()
    }
}

impl V4l2Source {
    /// Nothing touches the device until [`FrameSource::open`].
    pub fn new(device: impl Into<String>, width: u32, height: u32, fps: u32) -> Self {
        Self {
            device: device.into(),
            width,
            height,
            fps,
            session: None,
            next_sequence: 0,
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    fn open_err(&self, what: &str, e: impl std::fmt::Display) -> CaptureError {
        CaptureError::Open(format!("{}: {what}: {e}", self.device))
    }
}

impl FrameSource for V4l2Source {
    fn open(&mut self) -> Result<(), CaptureError> {
        let device = Device::with_path(&self.device).map_err(|e| self.open_err("open", e))?;

        let wanted = Format::new(self.width, self.height, FourCC::new(b"YUYV"));
        let granted =
            Capture::set_format(&device, &wanted).map_err(|e| self.open_err("set format", e))?;
        if granted.fourcc != wanted.fourcc {
            return Err(CaptureError::Open(format!(
                "{} does not offer YUYV (got {:?})",
                self.device, granted.fourcc
            )));
        }
        if (granted.width, granted.height) != (self.width, self.height) {
            return Err(CaptureError::Open(format!(
                "{} cannot capture {}x{} (offered {}x{})",
                self.device, self.width, self.height, granted.width, granted.height
            )));
        }

        Capture::set_params(&device, &Parameters::with_fps(self.fps))
            .map_err(|e| self.open_err("set frame rate", e))?;
        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(|e| self.open_err("map buffers", e))?;

        info!(
            "opened {} at {}x{} YUYV, {} fps",
            self.device, self.width, self.height, self.fps
        );
        self.session = Some(Session {
            stream,
            _device: device,
        });
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let session = self.session.as_mut().ok_or(CaptureError::NotOpen)?;
        let (data, _meta) = CaptureStream::next(&mut session.stream)
            .map_err(|e| CaptureError::Read(format!("{}: {e}", self.device)))?;
        let pixels = yuyv_to_bgr(data, self.width, self.height).ok_or_else(|| {
            CaptureError::Read(format!(
                "{}: short YUYV buffer of {} bytes",
                self.device,
                data.len()
            ))
        })?;

        let frame = Frame {
            sequence: self.next_sequence,
            width: self.width,
            height: self.height,
            pixels,
        };
        self.next_sequence += 1;
        Ok(frame)
    }

    fn close(&mut self) {
        if self.session.take().is_some() {
            debug!("closed {}", self.device);
        }
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }
}
