//! Storage infrastructure: the files the pipeline is configured from.
//!
//! - `config`   – the TOML application config (bridge address, pacing,
//!   backends), with defaults for a first run.
//! - `gestures` – the JSON gesture templates and rules, with a
//!   hot-reloadable `ConfigSource` implementation.

pub mod config;
pub mod gestures;
