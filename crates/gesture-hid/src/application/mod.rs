//! Application layer for the gesture pipeline.
//!
//! # What is the "application" layer? (for beginners)
//!
//! This layer wires the pure `gesture_core` logic into a running loop.  It
//! talks to cameras, pose models, gesture files and the bridge only through
//! the traits declared in [`sources`] and [`synthesize`]; the concrete
//! adapters live in `infrastructure` and are picked once at startup.
//!
//! # Sub-modules
//!
//! - **`sources`**      – The `FrameSource`, `PoseEstimator` and
//!   `ConfigSource` traits plus the data they hand over.
//! - **`frame_buffer`** – Single-slot latest-wins mailbox between threads.
//! - **`capture`**      – The capture thread used in async mode.
//! - **`synthesize`**   – Symbols to packets, with send dedup.  Declares the
//!   `HidTransport` trait.
//! - **`pipeline`**     – One processing cycle and the serial/async run loops.
//! - **`stats`**        – Counters and the command history ring.

pub mod capture;
pub mod frame_buffer;
pub mod pipeline;
pub mod sources;
pub mod stats;
pub mod synthesize;
