//! Domain entities for Gesture-HID.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code holds the rules that make the
//! system what it is, and never imports camera drivers, inference runtimes,
//! sockets, or file systems.  Here that means:
//!
//! - How a body pose is represented ([`keypoint`]).
//! - How an authored gesture looks ([`template`]).
//! - How a pose is judged against the gestures ([`classifier`]).
//! - How active gestures become symbol names ([`mapper`]).
//!
//! Code in outer layers (application, infrastructure) depends on the domain,
//! but the domain never depends on them.

pub mod classifier;
pub mod keypoint;
pub mod mapper;
pub mod template;
