use log::debug;
use serde::{Deserialize, Serialize};

use super::{EntityId, SpawnDecision, SpawnKind};

/// A spawn decision that has been handed a handle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedSpawn {
    pub id: EntityId,
    pub decision: SpawnDecision,
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    id: EntityId,
    x: f32,
    alive: bool,
}

/// Live entities of one kind, plus the x positions of recent spawns.
///
/// The recent-position list outlives the entities themselves: a pickup that was
/// collected still blocks hazards from being placed on its old spot until the
/// camera has moved past it.
pub struct EntityTracker {
    kind: SpawnKind,
    next_serial: u64,
    despawn_distance: f32,
    entities: Vec<Tracked>,
    recent_x: Vec<f32>,
}

impl EntityTracker {
    pub fn new(kind: SpawnKind, despawn_distance: f32) -> Self {
        Self {
            kind,
            next_serial: 0,
            despawn_distance,
            entities: Vec::new(),
            recent_x: Vec::new(),
        }
    }

    pub fn kind(&self) -> SpawnKind {
        self.kind
    }

    /// Hand out a handle for `decision` and start tracking it.
    pub fn track(&mut self, decision: SpawnDecision) -> TrackedSpawn {
        let id = EntityId {
            kind: self.kind,
            serial: self.next_serial,
        };
        self.next_serial += 1;

        self.entities.push(Tracked {
            id,
            x: decision.position.x,
            alive: true,
        });
        self.recent_x.push(decision.position.x);

        TrackedSpawn { id, decision }
    }

    /// Record that the collaborator destroyed `id` (collected, hit, ...).
    /// Returns false for unknown or already destroyed handles.
    pub fn mark_destroyed(&mut self, id: EntityId) -> bool {
        match self.entities.iter_mut().find(|e| e.id == id && e.alive) {
            Some(entity) => {
                entity.alive = false;
                true
            }
            None => false,
        }
    }

    /// Drop everything more than the despawn distance behind the camera and
    /// return the handles the collaborator should destroy. Destroyed handles
    /// are pruned silently in the same pass.
    pub fn despawn_behind(&mut self, camera_x: f32) -> Vec<EntityId> {
        let cutoff = camera_x - self.despawn_distance;
        let mut despawned = Vec::new();

        self.entities.retain(|entity| {
            if !entity.alive {
                return false;
            }
            if entity.x < cutoff {
                despawned.push(entity.id);
                return false;
            }
            true
        });

        if !despawned.is_empty() {
            debug!("Despawning {} {:?} entities behind x={:.1}", despawned.len(), self.kind, cutoff);
        }
        despawned
    }

    /// Forget recent positions the camera has left behind.
    pub fn cleanup_recent(&mut self, camera_x: f32) {
        let cutoff = camera_x - self.despawn_distance;
        self.recent_x.retain(|&x| x >= cutoff);
    }

    pub fn recent_positions(&self) -> &[f32] {
        &self.recent_x
    }

    /// True when `x` is closer than `min_distance` to any recent spawn.
    pub fn is_near(&self, x: f32, min_distance: f32) -> bool {
        is_near_any(self.recent_positions(), x, min_distance)
    }

    pub fn active_count(&self) -> usize {
        self.entities.iter().filter(|e| e.alive).count()
    }

    pub fn clear(&mut self) -> Vec<EntityId> {
        self.recent_x.clear();
        self.entities
            .drain(..)
            .filter(|e| e.alive)
            .map(|e| e.id)
            .collect()
    }
}

pub fn is_near_any(positions: &[f32], x: f32, min_distance: f32) -> bool {
    positions.iter().any(|&p| (x - p).abs() < min_distance)
}
