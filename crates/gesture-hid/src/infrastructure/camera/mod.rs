//! Frame source backends, chosen once from `[camera].backend`.
//!
//! - `synthetic`: blank frames, always available.
//! - `v4l2`: a Video4Linux2 device, compiled in with the `v4l2` feature.

pub mod convert;
pub mod synthetic;
#[cfg(feature = "v4l2")]
pub mod v4l2;

use crate::application::sources::{CaptureError, FrameSource};
use crate::infrastructure::storage::config::{CameraBackend, CameraConfig};

pub use synthetic::SyntheticSource;
#[cfg(feature = "v4l2")]
pub use v4l2::V4l2Source;

/// Builds the frame source named in the config.  The device itself is only
/// opened on the first capture.
///
/// # Errors
///
/// [`CaptureError::Open`] when the backend was not compiled in.
pub fn create_frame_source(config: &CameraConfig) -> Result<Box<dyn FrameSource>, CaptureError> {
    match config.backend {
        CameraBackend::Synthetic => Ok(Box::new(SyntheticSource::new(config.width, config.height))),
        #[cfg(feature = "v4l2")]
        CameraBackend::V4l2 => Ok(Box::new(V4l2Source::new(
            config.device.clone(),
            config.width,
            config.height,
            config.fps,
        ))),
        #[cfg(not(feature = "v4l2"))]
        CameraBackend::V4l2 => Err(CaptureError::Open(format!(
            "camera backend \"v4l2\" for {} needs gesture-hid built with `--features v4l2`",
            config.device
        ))),
    }
}
