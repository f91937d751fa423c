pub mod position;
pub mod tracker;
pub mod predictive;
pub mod beat_decider;
pub mod hazard;

pub use position::{FftDrivenGenerator, PositionGenerator, UniformRandomGenerator};
pub use tracker::{EntityTracker, TrackedSpawn};
pub use predictive::{MissedNote, NoteScan, PredictiveNoteSpawner};
pub use beat_decider::{BeatSpawnDecider, BeatVerdict};
pub use hazard::{DifficultyRamp, HazardSpawner, HazardTick};

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpawnKind {
    Pickup,
    Hazard,
}

/// "Spawn an entity of this kind here."
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnDecision {
    pub position: Vec2,
    pub kind: SpawnKind,
}

impl SpawnDecision {
    pub fn pickup(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            kind: SpawnKind::Pickup,
        }
    }

    pub fn hazard(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            kind: SpawnKind::Hazard,
        }
    }
}

/// Handle naming a spawned entity. Serials are unique per kind, so handles are
/// unique across the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub kind: SpawnKind,
    pub serial: u64,
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.kind {
            SpawnKind::Pickup => "pickup",
            SpawnKind::Hazard => "hazard",
        };
        write!(f, "{}#{}", prefix, self.serial)
    }
}

/// Seeded RNG for one consumer. Each consumer passes its own `stream` so two
/// generators built from the same session seed do not mirror each other.
pub fn seeded_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        None => StdRng::from_entropy(),
    }
}
