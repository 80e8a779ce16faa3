//! Gesture templates and mapping rules, loaded from JSON and hot-reloaded.
//!
//! Two file shapes are accepted:
//!
//! ```json
//! { "templates": [ { "name": "RightHandUp", "index": 5, ... } ],
//!   "rules":     [ { "required": [5, 6], "symbols": ["space"] } ] }
//! ```
//!
//! or a bare array of templates, as written by the pose-recording tool.  In
//! both cases every template's `keys` list becomes a single-index rule after
//! the explicit ones.
//!
//! # Snapshots
//!
//! The processing loop asks a [`ConfigSource`] for the current snapshot once
//! per cycle and keeps that `Arc` for the whole cycle.  A reload swaps the
//! `Arc` behind an `RwLock`, so a cycle never sees a half-updated template
//! list.  A file that fails to parse or validate on reload is logged and the
//! previous snapshot stays in place.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, SystemTime};

use gesture_core::{GestureTemplate, MappingRule, TemplateError};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::sources::{ConfigSource, GestureConfig};

#[derive(Debug, Error)]
pub enum GestureFileError {
    #[error("I/O error reading gestures at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse gestures JSON at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid gestures at {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    #[error("gesture file {0} is gone, keeping previous set until it returns")]
    Missing(PathBuf),
}

#[derive(Deserialize)]
struct GestureBundle {
    #[serde(default)]
    templates: Vec<GestureTemplate>,
    #[serde(default)]
    rules: Vec<MappingRule>,
}

/// Parses gesture JSON.  `origin` is only used in error messages.
///
/// # Errors
///
/// Returns [`GestureFileError::Parse`] or [`GestureFileError::Invalid`].
pub fn parse_gestures(text: &str, origin: &Path) -> Result<GestureConfig, GestureFileError> {
    let parse_err = |source| GestureFileError::Parse {
        path: origin.to_path_buf(),
        source,
    };
    let value: serde_json::Value = serde_json::from_str(text).map_err(parse_err)?;
    let bundle = if value.is_array() {
        GestureBundle {
            templates: serde_json::from_value(value).map_err(parse_err)?,
            rules: Vec::new(),
        }
    } else {
        serde_json::from_value(value).map_err(parse_err)?
    };
    GestureConfig::new(bundle.templates, bundle.rules).map_err(|source| GestureFileError::Invalid {
        path: origin.to_path_buf(),
        source,
    })
}

/// Reads and parses a gesture file.
///
/// # Errors
///
/// Returns [`GestureFileError`] on I/O, parse, or validation failure.
pub fn load_gestures(path: &Path) -> Result<GestureConfig, GestureFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| GestureFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_gestures(&text, path)
}

// ── Config sources ────────────────────────────────────────────────────────────

/// A gesture file that can be reloaded while the pipeline runs.
pub struct FileConfigSource {
    path: PathBuf,
    snapshot: RwLock<Arc<GestureConfig>>,
    modified: Mutex<Option<SystemTime>>,
}

impl FileConfigSource {
    /// Loads `path` for the first time.
    ///
    /// # Errors
    ///
    /// Any [`GestureFileError`]: with no previous snapshot to fall back on, a
    /// bad file at startup is fatal.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, GestureFileError> {
        let path = path.into();
        let modified = modified_time(&path);
        let config = load_gestures(&path)?;
        info!(
            "loaded {} gesture templates and {} rules from {}",
            config.templates.len(),
            config.mapper.rules().len(),
            path.display()
        );
        Ok(Self {
            path,
            snapshot: RwLock::new(Arc::new(config)),
            modified: Mutex::new(modified),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the file unconditionally.
    ///
    /// Returns `Ok(true)` when the snapshot changed.  On error the previous
    /// snapshot is kept.
    ///
    /// # Errors
    ///
    /// The [`GestureFileError`] that prevented the reload.
    pub fn reload(&self) -> Result<bool, GestureFileError> {
        let modified = modified_time(&self.path);
        let fresh = load_gestures(&self.path)?;
        *self.modified.lock().unwrap_or_else(PoisonError::into_inner) = modified;

        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if **guard == fresh {
            return Ok(false);
        }
        *guard = Arc::new(fresh);
        Ok(true)
    }

    /// Reloads only when the file's modification time moved.
    ///
    /// A deleted file is reported once; later calls stay quiet until it
    /// reappears.
    ///
    /// # Errors
    ///
    /// [`GestureFileError::Missing`] the first time the file is found gone,
    /// otherwise see [`FileConfigSource::reload`].
    pub fn reload_if_modified(&self) -> Result<bool, GestureFileError> {
        let now = modified_time(&self.path);
        {
            let mut last = self.modified.lock().unwrap_or_else(PoisonError::into_inner);
            if now == *last {
                return Ok(false);
            }
            if now.is_none() {
                *last = None;
                return Err(GestureFileError::Missing(self.path.clone()));
            }
        }
        self.reload()
    }
}

impl ConfigSource for FileConfigSource {
    fn current(&self) -> Arc<GestureConfig> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Polls `source` every `interval` until `running` is cleared.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_reload_task(
    source: Arc<FileConfigSource>,
    interval: Duration,
    running: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; the file was just loaded.
        ticker.tick().await;

        while running.load(Ordering::Relaxed) {
            ticker.tick().await;
            match source.reload_if_modified() {
                Ok(true) => info!("reloaded gestures from {}", source.path().display()),
                Ok(false) => debug!("gestures unchanged"),
                Err(e) => warn!("gesture reload failed, keeping previous set: {e}"),
            }
        }
        debug!("gesture reload task stopped");
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
