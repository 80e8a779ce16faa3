//! Counters and a bounded log of transmitted packets.

use std::collections::VecDeque;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Running totals for one pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_processed: u64,
    pub poses_detected: u64,
    pub commands_sent: u64,
    /// Frames processed during the last complete one-second window.
    pub current_fps: u32,
}

/// Counts frames per one-second window.
#[derive(Debug)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    current: u32,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            current: 0,
        }
    }

    /// Records one frame at `now` and returns the current rate.
    pub fn tick(&mut self, now: Instant) -> u32 {
        self.frames += 1;
        if now.duration_since(self.window_start) >= Self::WINDOW {
            self.current = self.frames;
            self.frames = 0;
            self.window_start = now;
        }
        self.current
    }

    pub fn current(&self) -> u32 {
        self.current
    }
}

/// One transmitted packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    /// Space-separated uppercase hex, e.g. `"57 AB 00 02 ..."`.
    pub hex: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Names of the gestures active when the packet was produced.
    pub gestures: Vec<String>,
}

impl CommandRecord {
    pub fn now(hex: String, gestures: Vec<String>) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            hex,
            timestamp_ms,
            gestures,
        }
    }
}

/// Ring of the most recent [`CommandRecord`]s.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    capacity: usize,
    records: VecDeque<CommandRecord>,
}

impl CommandHistory {
    pub const DEFAULT_CAPACITY: usize = 100;

    /// A zero `capacity` is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: CommandRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// The newest `count` records, oldest first.
    pub fn recent(&self, count: usize) -> Vec<CommandRecord> {
        let skip = self.records.len().saturating_sub(count);
        self.records.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
