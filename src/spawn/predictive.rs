use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{PositionGenerator, SpawnDecision};
use crate::audio::clock::is_backward_jump;
use crate::audio::BandEnergy;
use crate::config::NoteWindowConfig;
use crate::notes::NoteTimeline;

/// A note whose onset passed before it could be placed. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissedNote {
    pub index: usize,
    pub onset_seconds: f64,
    pub observed_at: f64,
}

/// Result of one scan over the timeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteScan {
    pub spawns: Vec<SpawnDecision>,
    pub missed: Vec<MissedNote>,
}

/// Places pickups so the player reaches each one at its note's onset.
///
/// Every tick the spawner projects where the player will be at each pending
/// onset, assuming the current speed holds, and fires the notes whose projected
/// position is about to enter the camera's spawn window. Fired indices are never
/// fired again until [`reset`](Self::reset).
pub struct PredictiveNoteSpawner {
    timeline: NoteTimeline,
    fired: Vec<bool>,
    fired_count: usize,
    last_time: Option<f64>,
    window_min: f32,
    window_max: f32,
    generator: Box<dyn PositionGenerator>,
}

impl PredictiveNoteSpawner {
    pub fn new(timeline: NoteTimeline, window: &NoteWindowConfig, generator: Box<dyn PositionGenerator>) -> Self {
        info!(
            "Predictive note spawner: {} notes, {:.2}s, window [{}, {}], {} heights",
            timeline.len(),
            timeline.total_duration(),
            window.spawn_window_min,
            window.spawn_window_max,
            generator.generator_type()
        );

        Self {
            fired: vec![false; timeline.len()],
            fired_count: 0,
            last_time: None,
            window_min: window.spawn_window_min,
            window_max: window.spawn_window_max,
            timeline,
            generator,
        }
    }

    pub fn get_spawns(
        &mut self,
        current_time: f64,
        player_speed: f32,
        player_x: f32,
        camera_x: f32,
        audio: &dyn BandEnergy,
    ) -> NoteScan {
        let mut scan = NoteScan::default();
        if player_speed <= 0.0 {
            return scan;
        }

        for (index, note) in self.timeline.notes().iter().enumerate() {
            if self.fired[index] {
                continue;
            }

            let time_until_note = note.onset_seconds - current_time;
            if time_until_note < 0.0 {
                self.fired[index] = true;
                self.fired_count += 1;
                warn!(
                    "Missed note at {:.3}s (already passed, current={:.3}s)",
                    note.onset_seconds, current_time
                );
                scan.missed.push(MissedNote {
                    index,
                    onset_seconds: note.onset_seconds,
                    observed_at: current_time,
                });
                continue;
            }

            // Constant speed projection
            let ideal_x = player_x + player_speed * time_until_note as f32;
            let relative_to_camera = ideal_x - camera_x;
            if relative_to_camera >= self.window_min && relative_to_camera <= self.window_max {
                let y = self.generator.generate_y(ideal_x, audio);
                if !self.generator.is_in_bounds(y) {
                    // Generator declined; try again next tick while still in the window
                    continue;
                }
                self.fired[index] = true;
                self.fired_count += 1;
                scan.spawns.push(SpawnDecision::pickup(ideal_x, y));
            }
        }

        scan
    }

    /// Record the playback time; resets and returns true on a backward jump.
    pub fn observe_time(&mut self, current_time: f64) -> bool {
        let looped = self
            .last_time
            .map_or(false, |previous| is_backward_jump(previous, current_time));
        self.last_time = Some(current_time);

        if looped {
            self.reset();
        }
        looped
    }

    /// Re-arm every note. The timeline itself is untouched.
    pub fn reset(&mut self) {
        if self.fired_count > 0 {
            debug!("Predictive note spawner reset ({} notes re-armed)", self.fired_count);
        }
        self.fired.iter_mut().for_each(|f| *f = false);
        self.fired_count = 0;
    }

    pub fn timeline(&self) -> &NoteTimeline {
        &self.timeline
    }

    pub fn note_count(&self) -> usize {
        self.timeline.len()
    }

    pub fn spawned_count(&self) -> usize {
        self.fired_count
    }

    pub fn pending_count(&self) -> usize {
        self.note_count() - self.fired_count
    }

    pub fn is_fired(&self, index: usize) -> bool {
        self.fired.get(index).copied().unwrap_or(false)
    }
}
