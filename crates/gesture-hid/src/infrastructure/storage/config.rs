//! TOML application configuration.
//!
//! Looked up, in order, at:
//! - the path given with `--config` or `GESTURE_HID_CONFIG`,
//! - Windows:  `%APPDATA%\GestureHid\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/gesture-hid/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/GestureHid/config.toml`
//!
//! A missing file is not an error: every field has a default, so the
//! pipeline starts with a synthetic camera and no estimator.
//!
//! ```toml
//! [bridge]
//! host = "192.168.2.121"
//! port = 80
//!
//! [pipeline]
//! mode = "async"
//! fps_limit = 30
//!
//! [camera]
//! backend = "v4l2"
//! device = "/dev/video0"
//!
//! [estimator]
//! backend = "replay"
//! path = "poses.jsonl"
//!
//! [gestures]
//! path = "gestures.json"
//! ```
//!
//! Relative `path` values are resolved against the directory holding the
//! config file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use gesture_core::FovTag;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::application::capture::CaptureTiming;
use crate::application::pipeline::PipelineSettings;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("config already exists at {0}")]
    AlreadyExists(PathBuf),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub gestures: GesturesConfig,
}

/// Where the keyboard/mouse bridge listens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    #[serde(default = "default_bridge_host")]
    pub host: String,
    #[serde(default = "default_bridge_port")]
    pub port: u16,
    /// Bound on connect and write, per packet.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// How frames are scheduled through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// Capture, infer and send in one loop.
    Serial,
    /// A capture thread feeds the processing loop through a single-slot buffer.
    #[default]
    Async,
}

impl FromStr for PipelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "serial" => Ok(PipelineMode::Serial),
            "async" => Ok(PipelineMode::Async),
            other => Err(format!("unknown pipeline mode '{other}' (expected serial or async)")),
        }
    }
}

/// Processing loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    #[serde(default)]
    pub mode: PipelineMode,
    /// Upper bound on processed frames per second.
    #[serde(default = "default_fps_limit")]
    pub fps_limit: u32,
    /// How long the processing loop waits for a frame before re-checking the
    /// running flag.
    #[serde(default = "default_take_timeout_ms")]
    pub take_timeout_ms: u64,
    /// Pause after a failed capture.
    #[serde(default = "default_capture_backoff_ms")]
    pub capture_backoff_ms: u64,
    /// Whether gestures are turned into packets at startup.
    #[serde(default = "default_true")]
    pub send_commands: bool,
    /// Swap left/right joints before classification.
    #[serde(default = "default_true")]
    pub mirror: bool,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraBackend {
    /// Blank frames with a sequence number.
    #[default]
    Synthetic,
    /// A Video4Linux2 capture device.  Needs the `v4l2` cargo feature.
    V4l2,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraConfig {
    #[serde(default)]
    pub backend: CameraBackend,
    /// Device node for the `v4l2` backend.
    #[serde(default = "default_camera_device")]
    pub device: String,
    /// Frame rate requested from the device.
    #[serde(default = "default_camera_fps")]
    pub fps: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Lens class of the camera in use.
    #[serde(default)]
    pub fov: FovTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorBackend {
    /// Never detects anybody.
    #[default]
    None,
    /// Plays back recorded keypoints from a JSON-lines file.
    Replay,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EstimatorConfig {
    #[serde(default)]
    pub backend: EstimatorBackend,
    /// Model or recording file, depending on the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Joints scored below this are treated as absent.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GesturesConfig {
    /// JSON file with templates and mapping rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// How often the file is checked for changes.  `0` disables reloading.
    #[serde(default = "default_reload_interval_ms")]
    pub reload_interval_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bridge_host() -> String {
    "192.168.2.121".to_string()
}
fn default_bridge_port() -> u16 {
    80
}
fn default_connect_timeout_ms() -> u64 {
    1000
}
fn default_fps_limit() -> u32 {
    30
}
fn default_take_timeout_ms() -> u64 {
    500
}
fn default_capture_backoff_ms() -> u64 {
    100
}
fn default_true() -> bool {
    true
}
fn default_history_capacity() -> usize {
    100
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_camera_device() -> String {
    "/dev/video0".to_string()
}
fn default_camera_fps() -> u32 {
    30
}
fn default_width() -> u32 {
    640
}
fn default_height() -> u32 {
    480
}
fn default_min_confidence() -> f32 {
    0.3
}
fn default_reload_interval_ms() -> u64 {
    2000
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: default_bridge_host(),
            port: default_bridge_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::default(),
            fps_limit: default_fps_limit(),
            take_timeout_ms: default_take_timeout_ms(),
            capture_backoff_ms: default_capture_backoff_ms(),
            send_commands: default_true(),
            mirror: default_true(),
            history_capacity: default_history_capacity(),
            log_level: default_log_level(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            backend: CameraBackend::default(),
            device: default_camera_device(),
            fps: default_camera_fps(),
            width: default_width(),
            height: default_height(),
            fov: FovTag::default(),
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            backend: EstimatorBackend::default(),
            path: None,
            min_confidence: default_min_confidence(),
        }
    }
}

impl Default for GesturesConfig {
    fn default() -> Self {
        Self {
            path: None,
            reload_interval_ms: default_reload_interval_ms(),
        }
    }
}

// ── Derived values ────────────────────────────────────────────────────────────

impl BridgeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl PipelineConfig {
    /// Minimum time between two processed frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps_limit.max(1)
    }

    /// Capture thread period: three samples per processed frame.
    pub fn capture_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps_limit.max(1).saturating_mul(3)
    }

    pub fn take_timeout(&self) -> Duration {
        Duration::from_millis(self.take_timeout_ms)
    }

    pub fn capture_backoff(&self) -> Duration {
        Duration::from_millis(self.capture_backoff_ms)
    }
}

impl GesturesConfig {
    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_ms > 0).then(|| Duration::from_millis(self.reload_interval_ms))
    }
}

impl AppConfig {
    /// Checks ranges serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.fps_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "pipeline.fps_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.pipeline.take_timeout_ms == 0 || self.pipeline.take_timeout_ms > 1000 {
            return Err(ConfigError::Invalid {
                field: "pipeline.take_timeout_ms",
                reason: format!("{} is outside 1..=1000", self.pipeline.take_timeout_ms),
            });
        }
        if self.pipeline.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "pipeline.history_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.estimator.min_confidence) {
            return Err(ConfigError::Invalid {
                field: "estimator.min_confidence",
                reason: format!("{} is outside 0..=1", self.estimator.min_confidence),
            });
        }
        if self.camera.backend == CameraBackend::V4l2 && self.camera.width % 2 != 0 {
            return Err(ConfigError::Invalid {
                field: "camera.width",
                reason: format!("{} must be even for YUYV capture", self.camera.width),
            });
        }
        if self.bridge.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "bridge.connect_timeout_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// The pipeline tunables this config describes.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            mirror: self.pipeline.mirror,
            camera_fov: self.camera.fov,
            min_confidence: self.estimator.min_confidence,
            frame_interval: self.pipeline.frame_interval(),
            take_timeout: self.pipeline.take_timeout(),
            capture: CaptureTiming {
                interval: self.pipeline.capture_interval(),
                backoff: self.pipeline.capture_backoff(),
            },
            history_capacity: self.pipeline.history_capacity,
        }
    }

    /// Makes relative file paths relative to `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        for path in [&mut self.estimator.path, &mut self.gestures.path]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory cannot
/// be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from `explicit`, or from the platform location when
/// `None`.  Returns the config and the path it was looked up at.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, PathBuf), ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    let config = load_config_from(&path)?;
    Ok((config, path))
}

/// Reads and validates `path`, returning defaults if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] for malformed TOML, and [`ConfigError::Invalid`] for
/// out-of-range values.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let mut config = match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("no config at {}, using defaults", path.display());
            AppConfig::default()
        }
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    if let Some(dir) = path.parent() {
        config.resolve_paths(dir);
    }
    config.validate()?;
    Ok(config)
}

/// Writes `config` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the default configuration to `path` for `gesture-hid init`.
///
/// # Errors
///
/// [`ConfigError::AlreadyExists`] when `path` exists and `overwrite` is
/// false, otherwise as [`save_config_to`].
pub fn write_default_config(path: &Path, overwrite: bool) -> Result<(), ConfigError> {
    if !overwrite && path.exists() {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    save_config_to(&AppConfig::default(), path)?;
    info!("wrote default config to {}", path.display());
    Ok(())
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("GestureHid"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("gesture-hid"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("GestureHid")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
