use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::{BeatSubdivision, FrequencyBand};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

/// Full parameter set for a spawning session.
///
/// Every section falls back to its defaults when missing from the file, so a
/// config only needs to list what it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    #[serde(default)]
    pub pickups: PickupConfig,
    #[serde(default)]
    pub notes: NoteWindowConfig,
    #[serde(default)]
    pub beats: BeatConfig,
    #[serde(default)]
    pub fft: FftConfig,
    #[serde(default)]
    pub hazards: HazardConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    pub min_height: f32,
    pub max_height: f32,
    /// Distance ahead used to project the beat a pickup will be reached on
    pub spawn_distance: f32,
    /// Pickups further than this behind the camera are despawned
    pub despawn_distance: f32,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            min_height: -90.0,
            max_height: 90.0,
            spawn_distance: 800.0,
            despawn_distance: 200.0,
        }
    }
}

/// Camera-relative x range where a pending note may materialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteWindowConfig {
    pub spawn_window_min: f32,
    pub spawn_window_max: f32,
}

impl Default for NoteWindowConfig {
    fn default() -> Self {
        Self {
            spawn_window_min: 130.0, // just before the screen edge
            spawn_window_max: 180.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    pub subdivision: BeatSubdivision,
    pub band: FrequencyBand,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            subdivision: BeatSubdivision::Eighth,
            band: FrequencyBand::MidRange,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FftConfig {
    /// Scales emphasized energy onto the height range
    pub amplitude_scale: f32,
    /// Minimum band energy for anything to spawn
    pub threshold: f32,
    /// Random Y offset (±)
    pub jitter_range: f32,
}

impl Default for FftConfig {
    fn default() -> Self {
        Self {
            amplitude_scale: 90.0,
            threshold: 0.05,
            jitter_range: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    pub spawn_distance: f32,
    pub despawn_distance: f32,
    pub initial_interval: f32,
    pub min_interval: f32,
    pub ramp_interval_seconds: f64,
    pub step_decrease: f32,
    /// Minimum x distance kept between a hazard and any recent pickup
    pub min_pickup_distance: f32,
    /// Spacing jitter as a fraction of the spawn distance
    pub jitter_fraction: f32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            spawn_distance: 1000.0,
            despawn_distance: 200.0,
            initial_interval: 500.0,
            min_interval: 100.0,
            ramp_interval_seconds: 30.0,
            step_decrease: 50.0,
            min_pickup_distance: 250.0,
            jitter_fraction: 0.25,
        }
    }
}

/// Forward motion model used by the simulation driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub initial_speed: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    /// Distance from the player to the camera's leading edge
    pub camera_lead: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_speed: 150.0,
            max_speed: 300.0,
            acceleration: 1.0,
            camera_lead: 800.0,
        }
    }
}

/// Where pickups come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PickupSource {
    /// Beat crossings gated by band energy
    #[default]
    Beats,
    /// Note onsets from a timeline
    Notes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub pickup_source: PickupSource,
    /// Fixed seed for reproducible playthroughs, `None` seeds from entropy
    pub seed: Option<u64>,
    /// Hazards are spawned alongside pickups
    pub hazards_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pickup_source: PickupSource::Beats,
            seed: None,
            hazards_enabled: true,
        }
    }
}

impl SpawnerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(ok: bool, field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
            if ok { Ok(()) } else { Err(ConfigError::Invalid { field, reason }) }
        }

        let p = &self.pickups;
        check(p.min_height.is_finite() && p.max_height.is_finite(), "pickups.height", "must be finite")?;
        check(p.min_height <= p.max_height, "pickups.min_height", "must not exceed max_height")?;
        check(p.spawn_distance.is_finite() && p.spawn_distance > 0.0, "pickups.spawn_distance", "must be finite and positive")?;
        check(p.despawn_distance.is_finite() && p.despawn_distance >= 0.0, "pickups.despawn_distance", "must be finite and not negative")?;

        let n = &self.notes;
        check(n.spawn_window_min.is_finite() && n.spawn_window_max.is_finite(), "notes.spawn_window", "must be finite")?;
        check(n.spawn_window_min <= n.spawn_window_max, "notes.spawn_window_min", "must not exceed spawn_window_max")?;

        let f = &self.fft;
        check(f.threshold >= 0.0 && f.threshold <= 1.0, "fft.threshold", "must lie in [0, 1]")?;
        check(f.jitter_range >= 0.0 && f.jitter_range.is_finite(), "fft.jitter_range", "must be finite and not negative")?;
        check(f.amplitude_scale.is_finite(), "fft.amplitude_scale", "must be finite")?;

        let h = &self.hazards;
        check(h.spawn_distance.is_finite() && h.spawn_distance > 0.0, "hazards.spawn_distance", "must be finite and positive")?;
        check(h.despawn_distance.is_finite() && h.despawn_distance >= 0.0, "hazards.despawn_distance", "must be finite and not negative")?;
        check(h.min_interval.is_finite() && h.min_interval > 0.0, "hazards.min_interval", "must be finite and positive")?;
        check(
            h.initial_interval.is_finite() && h.initial_interval >= h.min_interval,
            "hazards.initial_interval",
            "must be finite and not below min_interval",
        )?;
        check(
            h.ramp_interval_seconds.is_finite() && h.ramp_interval_seconds > 0.0,
            "hazards.ramp_interval_seconds",
            "must be finite and positive",
        )?;
        check(h.step_decrease.is_finite() && h.step_decrease >= 0.0, "hazards.step_decrease", "must be finite and not negative")?;
        check(
            h.min_pickup_distance.is_finite() && h.min_pickup_distance >= 0.0,
            "hazards.min_pickup_distance",
            "must be finite and not negative",
        )?;
        check(h.jitter_fraction.is_finite() && h.jitter_fraction >= 0.0, "hazards.jitter_fraction", "must be finite and not negative")?;

        let pl = &self.player;
        check(pl.max_speed.is_finite() && pl.acceleration.is_finite(), "player", "must be finite")?;
        check(pl.initial_speed >= 0.0 && pl.max_speed >= pl.initial_speed, "player.max_speed", "must be at least initial_speed")?;
        check(pl.camera_lead.is_finite() && pl.camera_lead >= 0.0, "player.camera_lead", "must be finite and not negative")?;

        Ok(())
    }
}
