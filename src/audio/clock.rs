use serde::{Deserialize, Serialize};

/// A backward jump larger than this (in seconds) counts as a loop or seek.
pub const LOOP_TOLERANCE_SECONDS: f64 = 1.0;

/// Tempo metadata for the playing track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Beats per minute, 0 when the track has no tempo configured
    pub bpm: f64,
    pub beats_per_bar: u32,
    pub beat_count: u32,
}

impl Default for TrackInfo {
    fn default() -> Self {
        Self {
            bpm: 0.0,
            beats_per_bar: 4, // 4/4 unless told otherwise
            beat_count: 0,
        }
    }
}

impl TrackInfo {
    pub fn with_bpm(bpm: f64) -> Self {
        Self { bpm, ..Self::default() }
    }

    pub fn has_tempo(&self) -> bool {
        self.bpm > 0.0 && self.bpm.is_finite()
    }
}

/// Read-only view of the audio transport.
pub trait PlaybackClock {
    /// Current playback position in seconds.
    fn playback_position(&self) -> f64;

    fn is_playing(&self) -> bool;

    fn track_info(&self) -> TrackInfo;

    fn bpm(&self) -> f64 {
        self.track_info().bpm
    }

    /// Fractional beat count since the start of the track.
    fn current_beat(&self) -> f64 {
        let bpm = self.bpm();
        if bpm <= 0.0 {
            return 0.0;
        }
        self.playback_position() * bpm / 60.0
    }
}

/// True when `current` sits far enough before `previous` to be a loop or seek.
pub fn is_backward_jump(previous: f64, current: f64) -> bool {
    current < previous - LOOP_TOLERANCE_SECONDS
}

/// Clock whose position is set by hand. Used to replay recorded sessions and in tests.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    pub position: f64,
    pub playing: bool,
    pub info: TrackInfo,
}

impl ManualClock {
    pub fn new(bpm: f64) -> Self {
        Self {
            position: 0.0,
            playing: true,
            info: TrackInfo::with_bpm(bpm),
        }
    }

    pub fn at(mut self, position: f64) -> Self {
        self.position = position;
        self
    }

    pub fn set_position(&mut self, position: f64) {
        self.position = position;
    }

    pub fn advance(&mut self, dt: f64) {
        self.position += dt;
    }
}

impl PlaybackClock for ManualClock {
    fn playback_position(&self) -> f64 {
        if self.playing { self.position } else { 0.0 }
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn track_info(&self) -> TrackInfo {
        self.info
    }
}
