//! Infrastructure layer for gesture-hid.
//!
//! Contains the concrete adapters: frame sources, pose estimator backends,
//! the TCP link to the bridge, and config/gesture file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `gesture_core`, but MUST NOT be imported by the `application` layer.

pub mod camera;
pub mod estimator;
pub mod storage;
pub mod transport;
