use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::clock::{is_backward_jump, PlaybackClock};
use super::BeatSubdivision;

/// Raised once per subdivided beat crossing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatEvent {
    pub beat_index: i64,
    pub exact_beat_phase: f64,
}

/// What one tracker tick observed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BeatTick {
    pub event: Option<BeatEvent>,
    /// Playback jumped backwards this tick
    pub looped: bool,
}

/// Turns a continuously advancing playback position into discrete beat events.
///
/// Detection is edge based: an event fires when the subdivided beat index is
/// greater than the last one seen, so ticks do not need to line up with audio
/// buffers. Several beats crossed in one long tick yield a single event for the
/// newest index; the skipped ones are dropped on purpose.
pub struct BeatTracker {
    subdivision: BeatSubdivision,
    last_integer_beat: i64,
    last_playback_position: f64,
}

impl BeatTracker {
    pub fn new(subdivision: BeatSubdivision) -> Self {
        Self {
            subdivision,
            last_integer_beat: -1,
            last_playback_position: 0.0,
        }
    }

    pub fn subdivision(&self) -> BeatSubdivision {
        self.subdivision
    }

    pub fn last_integer_beat(&self) -> i64 {
        self.last_integer_beat
    }

    pub fn last_playback_position(&self) -> f64 {
        self.last_playback_position
    }

    pub fn tick(&mut self, clock: &dyn PlaybackClock) -> BeatTick {
        let info = clock.track_info();
        if !clock.is_playing() || !info.has_tempo() {
            return BeatTick::default();
        }
        let bpm = info.bpm;

        let position = clock.playback_position();
        let looped = is_backward_jump(self.last_playback_position, position);
        if looped {
            info!("🔁 Detected loop or restart at {:.2}s, resetting beat tracking", position);
            self.last_integer_beat = -1;
        }
        self.last_playback_position = position;

        let beat_phase = (position * bpm / 60.0) * self.subdivision.multiplier() as f64;
        let beat_index = beat_phase.floor() as i64;

        let event = if beat_index > self.last_integer_beat {
            self.last_integer_beat = beat_index;
            if beat_index % 8 == 0 {
                debug!("🥁 Beat {} at {:.2}s ({:?})", beat_index, position, self.subdivision);
            }
            Some(BeatEvent {
                beat_index,
                exact_beat_phase: beat_phase,
            })
        } else {
            None
        };

        BeatTick { event, looped }
    }

    pub fn reset(&mut self) {
        self.last_integer_beat = -1;
        self.last_playback_position = 0.0;
    }
}
