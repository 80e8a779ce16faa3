//! The processing pipeline: frame → keypoints → gestures → symbols → packets.
//!
//! # One cycle (for beginners)
//!
//! [`Pipeline::process_frame`] runs strictly in this order:
//!
//! 1. Take one gesture snapshot from the [`ConfigSource`].  A hot reload that
//!    lands mid-cycle is only seen on the next cycle.
//! 2. Ask the [`PoseEstimator`] for poses.  An inference error counts as
//!    "nobody in view".
//! 3. Convert the first pose to keypoints, dropping low-confidence joints,
//!    and mirror left/right labels when the preview is flipped.
//! 4. Classify against the snapshot's templates and map the matches to
//!    symbols.
//! 5. Hand the symbols to the [`CommandSynthesizer`], which decides what
//!    actually goes out on the [`HidTransport`].
//!
//! # Run loops
//!
//! - [`Pipeline::run_serial`] calls the frame source itself, one frame per
//!   cycle.
//! - [`Pipeline::run_async`] starts a capture thread that feeds a
//!   [`FrameBuffer`]; the calling thread consumes the latest frame.
//!
//! Both loops check [`PipelineControl::is_running`] at every boundary and
//! release all held input on the way out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use gesture_core::{to_hex, FovTag, GestureMatch, PoseClassifier};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::capture::{spawn_capture_thread, CaptureTiming};
use super::frame_buffer::FrameBuffer;
use super::sources::{next_frame, CaptureError, ConfigSource, Estimation, Frame, FrameSource, PoseEstimator};
use super::stats::{CommandHistory, CommandRecord, FpsCounter, PipelineStats};
use super::synthesize::{CommandSynthesizer, HidTransport, SentPacket};

// ── Control ───────────────────────────────────────────────────────────────────

/// Flags shared between the pipeline and whoever drives it.
#[derive(Debug, Clone)]
pub struct PipelineControl {
    running: Arc<AtomicBool>,
    send_commands: Arc<AtomicBool>,
}

impl PipelineControl {
    pub fn new(send_commands: bool) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            send_commands: Arc::new(AtomicBool::new(send_commands)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Asks every loop to finish its current cycle and return.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// The flag checked by the capture thread and the reload task.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn sending_enabled(&self) -> bool {
        self.send_commands.load(Ordering::Relaxed)
    }

    /// Turning sending off releases held input on the next cycle.
    pub fn set_sending(&self, enabled: bool) {
        self.send_commands.store(enabled, Ordering::Relaxed);
    }
}

impl Default for PipelineControl {
    fn default() -> Self {
        Self::new(true)
    }
}

// ── Settings ──────────────────────────────────────────────────────────────────

/// Tunables for one pipeline, usually derived from the application config.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Swap left/right joint labels before classifying.
    pub mirror: bool,
    pub camera_fov: FovTag,
    pub min_confidence: f32,
    /// Minimum duration of one processing cycle.
    pub frame_interval: Duration,
    /// How long [`Pipeline::run_async`] waits for a frame before re-checking
    /// the running flag.
    pub take_timeout: Duration,
    pub capture: CaptureTiming,
    pub history_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let frame_interval = Duration::from_secs(1) / 30;
        Self {
            mirror: true,
            camera_fov: FovTag::Standard,
            min_confidence: 0.3,
            frame_interval,
            take_timeout: Duration::from_millis(500),
            capture: CaptureTiming {
                interval: frame_interval / 3,
                backoff: Duration::from_millis(100),
            },
            history_capacity: CommandHistory::DEFAULT_CAPACITY,
        }
    }
}

/// What one cycle produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub matches: Vec<GestureMatch>,
    pub symbols: Vec<String>,
    pub sent: Vec<SentPacket>,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct Pipeline {
    session: Uuid,
    settings: PipelineSettings,
    control: PipelineControl,
    estimator: Box<dyn PoseEstimator>,
    gestures: Arc<dyn ConfigSource>,
    transport: Box<dyn HidTransport>,
    classifier: PoseClassifier,
    synthesizer: CommandSynthesizer,
    /// Value of the send flag seen by the previous cycle.
    was_sending: bool,
    stats: PipelineStats,
    history: CommandHistory,
    fps: FpsCounter,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        control: PipelineControl,
        estimator: Box<dyn PoseEstimator>,
        gestures: Arc<dyn ConfigSource>,
        transport: Box<dyn HidTransport>,
    ) -> Self {
        let history = CommandHistory::new(settings.history_capacity);
        let was_sending = control.sending_enabled();
        Self {
            session: Uuid::new_v4(),
            settings,
            control,
            estimator,
            gestures,
            transport,
            classifier: PoseClassifier::new(),
            synthesizer: CommandSynthesizer::new(),
            was_sending,
            stats: PipelineStats::default(),
            history,
            fps: FpsCounter::new(Instant::now()),
        }
    }

    /// Replaces the default lean/turn thresholds.
    pub fn with_classifier(mut self, classifier: PoseClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn control(&self) -> &PipelineControl {
        &self.control
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// The newest `count` transmitted packets, oldest first.
    pub fn history(&self, count: usize) -> Vec<CommandRecord> {
        self.history.recent(count)
    }

    /// Runs one full cycle on `frame`.
    pub fn process_frame(&mut self, frame: &Frame) -> CycleReport {
        let snapshot = self.gestures.current();

        let estimation = self.estimator.infer(frame).unwrap_or_else(|e| {
            warn!("inference failed on frame {}: {e}", frame.sequence);
            Estimation::default()
        });

        let matches = match estimation.poses.first() {
            Some(pose) => {
                self.stats.poses_detected += 1;
                let keypoints = self
                    .estimator
                    .pose_to_keypoints(pose, self.settings.min_confidence);
                let keypoints = if self.settings.mirror {
                    keypoints.mirrored()
                } else {
                    keypoints
                };
                self.classifier
                    .classify(&snapshot.templates, &keypoints, self.settings.camera_fov)
            }
            None => Vec::new(),
        };
        let symbols = snapshot.mapper.map(&matches);

        let sending = self.control.sending_enabled();
        let sent = if sending {
            self.synthesizer.synthesize(&symbols, self.transport.as_mut())
        } else if self.was_sending {
            info!("command output disabled, releasing held input");
            self.synthesizer.stop(self.transport.as_mut())
        } else {
            Vec::new()
        };
        self.was_sending = sending;

        if !matches.is_empty() {
            debug!(frame = frame.sequence, ?symbols, "matched {} gestures", matches.len());
        }
        self.record(&matches, &sent);
        self.stats.frames_processed += 1;
        self.stats.current_fps = self.fps.tick(Instant::now());

        CycleReport {
            matches,
            symbols,
            sent,
        }
    }

    /// Captures and processes one frame per cycle until stopped.
    pub fn run_serial(&mut self, source: &mut dyn FrameSource) -> PipelineStats {
        info!(session = %self.session, "pipeline started in serial mode");
        while self.control.is_running() {
            let started = Instant::now();
            match next_frame(source) {
                Ok(frame) => {
                    self.process_frame(&frame);
                }
                Err(e) => {
                    warn!("capture failed, retrying in {:?}: {e}", self.settings.capture.backoff);
                    std::thread::sleep(self.settings.capture.backoff);
                    continue;
                }
            }
            self.throttle(started);
        }
        source.close();
        self.shutdown()
    }

    /// Processes frames published by a capture thread until stopped.
    ///
    /// # Errors
    ///
    /// [`CaptureError::Spawn`] if the capture thread cannot be started.
    pub fn run_async(&mut self, source: Box<dyn FrameSource>) -> Result<PipelineStats, CaptureError> {
        let buffer = Arc::new(FrameBuffer::new());
        let capture = spawn_capture_thread(
            source,
            Arc::clone(&buffer),
            self.control.running_flag(),
            self.settings.capture,
        )?;
        info!(session = %self.session, "pipeline started in async mode");

        while self.control.is_running() {
            let started = Instant::now();
            if let Some(frame) = buffer.take(self.settings.take_timeout) {
                self.process_frame(&frame);
                self.throttle(started);
            }
        }

        if capture.join().is_err() {
            warn!("capture thread panicked");
        }
        Ok(self.shutdown())
    }

    fn throttle(&self, started: Instant) {
        if let Some(rest) = self.settings.frame_interval.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    fn record(&mut self, matches: &[GestureMatch], sent: &[SentPacket]) {
        if sent.is_empty() {
            return;
        }
        let gestures: Vec<String> = matches.iter().map(|m| m.name.clone()).collect();
        for packet in sent {
            self.history
                .push(CommandRecord::now(to_hex(&packet.bytes), gestures.clone()));
        }
        self.stats.commands_sent += sent.len() as u64;
    }

    fn shutdown(&mut self) -> PipelineStats {
        if self.was_sending {
            let released = self.synthesizer.stop(self.transport.as_mut());
            self.record(&[], &released);
        }
        info!(
            session = %self.session,
            frames = self.stats.frames_processed,
            poses = self.stats.poses_detected,
            commands = self.stats.commands_sent,
            "pipeline stopped"
        );
        self.stats
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
