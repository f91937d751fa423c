use log::debug;

use super::{PositionGenerator, SpawnDecision};
use crate::audio::{BandEnergy, BeatEvent, FrequencyBand};
use crate::config::{FftConfig, PickupConfig};

/// Outcome of one beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeatVerdict {
    /// Player is not moving forward
    NoMotion,
    /// Track has no tempo configured
    NoTempo,
    /// Band energy under the threshold, nothing spawns in silent passages
    Silent { energy: f32 },
    /// Generator declined to place anything
    OutOfBounds { y: f32 },
    Spawn {
        decision: SpawnDecision,
        /// Beat the player will be on when reaching `spawn_distance`
        future_beat: f64,
        energy: f32,
    },
}

impl BeatVerdict {
    pub fn decision(&self) -> Option<SpawnDecision> {
        match self {
            BeatVerdict::Spawn { decision, .. } => Some(*decision),
            _ => None,
        }
    }
}

/// Decides, once per beat event, whether a pickup should appear.
pub struct BeatSpawnDecider {
    band: FrequencyBand,
    spawn_distance: f32,
    threshold: f32,
    generator: Box<dyn PositionGenerator>,
}

impl BeatSpawnDecider {
    pub fn new(band: FrequencyBand, pickups: &PickupConfig, fft: &FftConfig, generator: Box<dyn PositionGenerator>) -> Self {
        Self {
            band,
            spawn_distance: pickups.spawn_distance,
            threshold: fft.threshold,
            generator,
        }
    }

    pub fn band(&self) -> FrequencyBand {
        self.band
    }

    pub fn decide(
        &mut self,
        event: &BeatEvent,
        bpm: f64,
        player_speed: f32,
        camera_x: f32,
        audio: &dyn BandEnergy,
    ) -> BeatVerdict {
        if player_speed <= 0.0 {
            return BeatVerdict::NoMotion;
        }
        if bpm <= 0.0 {
            return BeatVerdict::NoTempo;
        }

        let time_to_reach = (self.spawn_distance / player_speed) as f64;
        let beats_ahead = time_to_reach * bpm / 60.0;
        let future_beat = event.beat_index as f64 + beats_ahead;

        let energy = audio.sample_band_energy(self.band.timing_band());
        let log_this_beat = event.beat_index % 8 == 0;

        if energy < self.threshold {
            if log_this_beat {
                debug!(
                    "Beat {} - skipping spawn (energy={:.3} < threshold, silent section)",
                    event.beat_index, energy
                );
            }
            return BeatVerdict::Silent { energy };
        }

        let y = self.generator.generate_y(camera_x, audio);
        if !self.generator.is_in_bounds(y) {
            return BeatVerdict::OutOfBounds { y };
        }

        if log_this_beat {
            debug!(
                "⭐ Beat {} - spawning pickup (energy={:.3}, speed={:.1}, timeToReach={:.2}s, futureBeat={:.1})",
                event.beat_index, energy, player_speed, time_to_reach, future_beat
            );
        }

        BeatVerdict::Spawn {
            decision: SpawnDecision::pickup(camera_x, y),
            future_beat,
            energy,
        }
    }
}
