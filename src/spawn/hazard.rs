use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;

use super::tracker::{is_near_any, EntityTracker, TrackedSpawn};
use super::{EntityId, PositionGenerator, SpawnDecision, SpawnKind, UniformRandomGenerator};
use crate::audio::StaticBandEnergy;
use crate::config::{HazardConfig, PickupConfig};

/// Staircase schedule for hazard spacing: every `ramp_interval_seconds` the
/// spacing drops by `step_decrease`, never below the floor.
#[derive(Debug, Clone)]
pub struct DifficultyRamp {
    initial_interval: f32,
    floor_interval: f32,
    step_decrease: f32,
    ramp_interval_seconds: f64,
    elapsed_seconds: f64,
    current_interval: f32,
}

impl DifficultyRamp {
    pub fn new(config: &HazardConfig) -> Self {
        let floor_interval = config.min_interval.max(f32::EPSILON);
        let initial_interval = config.initial_interval.max(floor_interval);
        Self {
            initial_interval,
            floor_interval,
            step_decrease: config.step_decrease.max(0.0),
            ramp_interval_seconds: config.ramp_interval_seconds,
            elapsed_seconds: 0.0,
            current_interval: initial_interval,
        }
    }

    /// Interval after `elapsed_seconds` of play.
    pub fn interval_at(&self, elapsed_seconds: f64) -> f32 {
        let level = self.level_at(elapsed_seconds);
        let decreased = self.initial_interval as f64 - level as f64 * self.step_decrease as f64;
        (decreased as f32).max(self.floor_interval)
    }

    pub fn level_at(&self, elapsed_seconds: f64) -> u64 {
        if self.ramp_interval_seconds <= 0.0 || elapsed_seconds <= 0.0 {
            return 0;
        }
        (elapsed_seconds / self.ramp_interval_seconds).floor() as u64
    }

    /// Move time forward and return the interval now in effect.
    pub fn advance(&mut self, dt: f64) -> f32 {
        if dt > 0.0 {
            self.elapsed_seconds += dt;
        }

        let interval = self.interval_at(self.elapsed_seconds);
        if interval < self.current_interval {
            info!(
                "☄️ Difficulty level {} reached: hazard interval {:.0}",
                self.level_at(self.elapsed_seconds),
                interval
            );
        }
        self.current_interval = interval;
        interval
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn current_interval(&self) -> f32 {
        self.current_interval
    }

    pub fn reset(&mut self) {
        self.elapsed_seconds = 0.0;
        self.current_interval = self.initial_interval;
    }
}

/// Hazards spawned and despawned during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HazardTick {
    pub spawns: Vec<TrackedSpawn>,
    pub despawns: Vec<EntityId>,
}

/// Periodic hazard placement ahead of the camera, independent of audio.
pub struct HazardSpawner {
    ramp: DifficultyRamp,
    spawn_distance: f32,
    min_pickup_distance: f32,
    jitter_fraction: f32,
    next_spawn_x: f32,
    generator: UniformRandomGenerator,
    rng: StdRng,
    hazards: EntityTracker,
}

impl HazardSpawner {
    pub fn new(config: &HazardConfig, pickups: &PickupConfig, camera_x: f32, generator_rng: StdRng, rng: StdRng) -> Self {
        Self {
            ramp: DifficultyRamp::new(config),
            spawn_distance: config.spawn_distance,
            min_pickup_distance: config.min_pickup_distance.max(0.0),
            jitter_fraction: config.jitter_fraction.max(0.0),
            next_spawn_x: camera_x + config.spawn_distance,
            generator: UniformRandomGenerator::from_config(pickups, generator_rng),
            rng,
            hazards: EntityTracker::new(SpawnKind::Hazard, config.despawn_distance),
        }
    }

    pub fn tick(&mut self, dt: f64, camera_x: f32, recent_pickups: &[f32]) -> HazardTick {
        let interval = self.ramp.advance(dt);
        let mut tick = HazardTick::default();

        while camera_x + self.spawn_distance >= self.next_spawn_x {
            if is_near_any(recent_pickups, self.next_spawn_x, self.min_pickup_distance) {
                self.next_spawn_x += self.min_pickup_distance * 0.5;
                continue;
            }

            let y = self.generator.generate_y(self.next_spawn_x, &StaticBandEnergy::default());
            tick.spawns.push(self.hazards.track(SpawnDecision::hazard(self.next_spawn_x, y)));

            self.next_spawn_x += self.next_gap(interval);
        }

        self.hazards.cleanup_recent(camera_x);
        tick.despawns = self.hazards.despawn_behind(camera_x);
        if !tick.spawns.is_empty() {
            debug!("Spawned {} hazard(s), next at x={:.1}", tick.spawns.len(), self.next_spawn_x);
        }
        tick
    }

    /// Spacing to the next hazard: the interval plus jitter that scales with the
    /// spawn distance but never exceeds half the interval, so the gap stays
    /// within `[interval / 2, interval * 3 / 2]`.
    fn next_gap(&mut self, interval: f32) -> f32 {
        let jitter_limit = (self.spawn_distance * self.jitter_fraction).min(interval * 0.5);
        interval + self.rng.gen_range(-jitter_limit..=jitter_limit)
    }

    pub fn mark_destroyed(&mut self, id: EntityId) -> bool {
        self.hazards.mark_destroyed(id)
    }

    pub fn next_spawn_x(&self) -> f32 {
        self.next_spawn_x
    }

    pub fn ramp(&self) -> &DifficultyRamp {
        &self.ramp
    }

    pub fn active_count(&self) -> usize {
        self.hazards.active_count()
    }

    /// Positions of hazards that are still ahead of the despawn line.
    pub fn recent_positions(&self) -> &[f32] {
        self.hazards.recent_positions()
    }

    /// Start over from `camera_x`; returns the handles still alive.
    pub fn reset(&mut self, camera_x: f32) -> Vec<EntityId> {
        self.ramp.reset();
        self.next_spawn_x = camera_x + self.spawn_distance;
        self.hazards.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::seeded_rng;

    fn spawner(camera_x: f32) -> HazardSpawner {
        HazardSpawner::new(
            &HazardConfig::default(),
            &PickupConfig::default(),
            camera_x,
            seeded_rng(Some(9), 0),
            seeded_rng(Some(9), 1),
        )
    }

    #[test]
    fn test_ramp_scenario() {
        let ramp = DifficultyRamp::new(&HazardConfig::default());
        assert_eq!(ramp.level_at(65.0), 2);
        assert_eq!(ramp.interval_at(65.0), 400.0);
        assert_eq!(ramp.interval_at(0.0), 500.0);
        assert_eq!(ramp.interval_at(29.9), 500.0);
    }

    #[test]
    fn test_ramp_is_non_increasing_with_floor() {
        let ramp = DifficultyRamp::new(&HazardConfig::default());
        let mut previous = f32::INFINITY;
        for step in 0..10_000 {
            let interval = ramp.interval_at(step as f64 * 0.5);
            assert!(interval <= previous);
            assert!(interval >= 100.0);
            previous = interval;
        }
        assert_eq!(ramp.interval_at(1.0e9), 100.0);
    }

    #[test]
    fn test_ramp_advance_tracks_elapsed() {
        let mut ramp = DifficultyRamp::new(&HazardConfig::default());
        assert_eq!(ramp.advance(31.0), 450.0);
        assert_eq!(ramp.advance(-5.0), 450.0);
        assert_eq!(ramp.elapsed_seconds(), 31.0);
        ramp.reset();
        assert_eq!(ramp.current_interval(), 500.0);
    }

    #[test]
    fn test_first_hazard_at_spawn_distance() {
        let mut spawner = spawner(0.0);
        let tick = spawner.tick(0.016, 0.0, &[]);
        assert_eq!(tick.spawns.len(), 1);
        assert_eq!(tick.spawns[0].decision.position.x, 1000.0);
        assert_eq!(tick.spawns[0].decision.kind, SpawnKind::Hazard);
    }

    #[test]
    fn test_gaps_stay_bounded() {
        let mut spawner = spawner(0.0);
        let mut xs = Vec::new();
        let mut camera = 0.0;
        for _ in 0..2000 {
            camera += 5.0;
            // Short ticks keep the whole run on the first difficulty level
            xs.extend(spawner.tick(0.001, camera, &[]).spawns.iter().map(|s| s.decision.position.x));
        }

        assert!(xs.len() > 10);
        for pair in xs.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= 250.0 - 1e-3 && gap <= 750.0 + 1e-3, "gap {}", gap);
        }
    }

    #[test]
    fn test_never_lands_near_recent_pickup() {
        let mut spawner = spawner(0.0);
        let mut rng = seeded_rng(Some(21), 0);
        let mut pickups: Vec<f32> = Vec::new();
        let mut camera = 0.0f32;

        for _ in 0..3000 {
            camera += 4.0;
            if rng.gen_bool(0.05) {
                pickups.push(camera + rng.gen_range(0.0..1200.0));
            }
            pickups.retain(|&x| x >= camera - 200.0);

            for spawn in spawner.tick(0.016, camera, &pickups).spawns {
                let x = spawn.decision.position.x;
                assert!(
                    pickups.iter().all(|&p| (x - p).abs() >= 250.0),
                    "hazard at {} too close to {:?}",
                    x,
                    pickups
                );
            }
        }
    }

    #[test]
    fn test_despawns_behind_camera() {
        let mut spawner = spawner(0.0);
        let first = spawner.tick(0.016, 0.0, &[]).spawns[0].id;
        let tick = spawner.tick(0.016, 1201.0, &[]);
        assert!(tick.despawns.contains(&first));
    }

    #[test]
    fn test_destroyed_hazard_is_pruned_silently() {
        let mut spawner = spawner(0.0);
        let first = spawner.tick(0.016, 0.0, &[]).spawns[0].id;
        assert!(spawner.mark_destroyed(first));
        let tick = spawner.tick(0.016, 1500.0, &[]);
        assert!(!tick.despawns.contains(&first));
    }

    #[test]
    fn test_recent_positions_stay_bounded() {
        let mut spawner = spawner(0.0);
        let mut camera = 0.0f32;
        let mut longest = 0;
        for _ in 0..100_000 {
            camera += 5.0;
            spawner.tick(0.016, camera, &[]);
            longest = longest.max(spawner.recent_positions().len());
        }

        // Only hazards between the despawn line and the spawn horizon are kept
        assert!(spawner.recent_positions().iter().all(|&x| x >= camera - 200.0));
        assert!(longest <= 32, "recent list grew to {}", longest);
    }

    #[test]
    fn test_reset_restarts_schedule() {
        let mut spawner = spawner(0.0);
        spawner.tick(40.0, 0.0, &[]);
        assert_eq!(spawner.ramp().current_interval(), 450.0);

        let alive = spawner.reset(5000.0);
        assert_eq!(alive.len(), 1);
        assert_eq!(spawner.next_spawn_x(), 6000.0);
        assert_eq!(spawner.ramp().current_interval(), 500.0);
        assert_eq!(spawner.active_count(), 0);
    }
}
