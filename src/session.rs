use std::collections::VecDeque;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::audio::{BandEnergy, BeatEvent, BeatTracker, PlaybackClock};
use crate::config::{ConfigError, PickupSource, SpawnerConfig};
use crate::notes::NoteTimeline;
use crate::spawn::{
    seeded_rng, BeatSpawnDecider, BeatVerdict, EntityId, EntityTracker, FftDrivenGenerator, HazardSpawner,
    MissedNote, PredictiveNoteSpawner, SpawnKind, TrackedSpawn, UniformRandomGenerator,
};

// RNG stream ids, one per consumer
const STREAM_BEAT_HEIGHTS: u64 = 1;
const STREAM_NOTE_HEIGHTS: u64 = 2;
const STREAM_HAZARD_HEIGHTS: u64 = 3;
const STREAM_HAZARD_SPACING: u64 = 4;

/// Player and camera state, captured once at the start of a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInputs {
    pub dt: f64,
    pub player_speed: f32,
    pub player_x: f32,
    /// Leading edge of the camera
    pub camera_x: f32,
}

impl TickInputs {
    /// Inputs for a camera whose leading edge runs `camera_lead` ahead of the player.
    pub fn following(dt: f64, player_speed: f32, player_x: f32, camera_lead: f32) -> Self {
        Self {
            dt,
            player_speed,
            player_x,
            camera_x: player_x + camera_lead,
        }
    }
}

/// Everything the collaborator has to act on after a tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub spawns: Vec<TrackedSpawn>,
    pub despawns: Vec<EntityId>,
    pub missed_notes: Vec<MissedNote>,
    pub beat: Option<BeatEvent>,
    pub looped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub ticks: u64,
    pub beats: u64,
    pub silent_beats: u64,
    pub pickups_spawned: u64,
    pub hazards_spawned: u64,
    pub despawned: u64,
    pub missed_notes: u64,
    pub loops: u64,
}

/// Drives every spawner once per tick.
///
/// The session owns the beat-event queue: the tracker pushes crossings into it
/// and the beat decider drains it in the same tick. Note mode ignores beat
/// events but still drains the queue so it cannot grow.
pub struct RhythmSession {
    config: SpawnerConfig,
    beat_tracker: BeatTracker,
    beat_queue: VecDeque<BeatEvent>,
    beat_decider: BeatSpawnDecider,
    note_spawner: Option<PredictiveNoteSpawner>,
    hazard_spawner: Option<HazardSpawner>,
    pickups: EntityTracker,
    stats: SessionStats,
}

impl RhythmSession {
    pub fn new(config: SpawnerConfig, camera_x: f32) -> Result<Self, ConfigError> {
        config.validate()?;

        let seed = config.session.seed;
        let band = config.beats.band;

        let beat_heights = FftDrivenGenerator::new(band, &config.pickups, &config.fft, seeded_rng(seed, STREAM_BEAT_HEIGHTS));
        let beat_decider = BeatSpawnDecider::new(band, &config.pickups, &config.fft, Box::new(beat_heights));

        let hazard_spawner = config.session.hazards_enabled.then(|| {
            HazardSpawner::new(
                &config.hazards,
                &config.pickups,
                camera_x,
                seeded_rng(seed, STREAM_HAZARD_HEIGHTS),
                seeded_rng(seed, STREAM_HAZARD_SPACING),
            )
        });

        info!(
            "🎵 Rhythm session ready: pickups from {:?}, band {:?}, subdivision {:?}, hazards {}",
            config.session.pickup_source,
            band,
            config.beats.subdivision,
            if hazard_spawner.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            beat_tracker: BeatTracker::new(config.beats.subdivision),
            beat_queue: VecDeque::new(),
            beat_decider,
            note_spawner: None,
            hazard_spawner,
            pickups: EntityTracker::new(SpawnKind::Pickup, config.pickups.despawn_distance),
            stats: SessionStats::default(),
            config,
        })
    }

    /// Attach the note timeline used when pickups come from notes.
    pub fn with_timeline(mut self, timeline: NoteTimeline) -> Self {
        let heights = UniformRandomGenerator::from_config(
            &self.config.pickups,
            seeded_rng(self.config.session.seed, STREAM_NOTE_HEIGHTS),
        );
        self.note_spawner = Some(PredictiveNoteSpawner::new(timeline, &self.config.notes, Box::new(heights)));
        if self.config.session.pickup_source != PickupSource::Notes {
            warn!("Note timeline attached but pickups come from {:?}; it will be ignored", self.config.session.pickup_source);
        }
        self
    }

    pub fn tick(&mut self, inputs: TickInputs, clock: &dyn PlaybackClock, audio: &dyn BandEnergy) -> TickOutput {
        let mut output = TickOutput::default();
        self.stats.ticks += 1;

        let beat_tick = self.beat_tracker.tick(clock);
        if let Some(event) = beat_tick.event {
            self.beat_queue.push_back(event);
            self.stats.beats += 1;
        }
        output.beat = beat_tick.event;

        let mut looped = beat_tick.looped;
        if let Some(notes) = self.note_spawner.as_mut() {
            if clock.is_playing() {
                looped |= notes.observe_time(clock.playback_position());
            }
            if beat_tick.looped {
                notes.reset();
            }
        }
        if looped {
            self.stats.loops += 1;
        }
        output.looped = looped;

        match self.config.session.pickup_source {
            PickupSource::Beats => self.spawn_from_beats(&inputs, clock, audio, &mut output),
            PickupSource::Notes => {
                self.beat_queue.clear();
                self.spawn_from_notes(&inputs, clock, audio, &mut output);
            }
        }

        self.pickups.cleanup_recent(inputs.camera_x);
        output.despawns.extend(self.pickups.despawn_behind(inputs.camera_x));

        if let Some(hazards) = self.hazard_spawner.as_mut() {
            let hazard_tick = hazards.tick(inputs.dt, inputs.camera_x, self.pickups.recent_positions());
            self.stats.hazards_spawned += hazard_tick.spawns.len() as u64;
            output.spawns.extend(hazard_tick.spawns);
            output.despawns.extend(hazard_tick.despawns);
        }

        self.stats.despawned += output.despawns.len() as u64;
        output
    }

    fn spawn_from_beats(
        &mut self,
        inputs: &TickInputs,
        clock: &dyn PlaybackClock,
        audio: &dyn BandEnergy,
        output: &mut TickOutput,
    ) {
        let bpm = clock.bpm();
        while let Some(event) = self.beat_queue.pop_front() {
            match self.beat_decider.decide(&event, bpm, inputs.player_speed, inputs.camera_x, audio) {
                BeatVerdict::Spawn { decision, .. } => {
                    output.spawns.push(self.pickups.track(decision));
                    self.stats.pickups_spawned += 1;
                }
                BeatVerdict::Silent { .. } => self.stats.silent_beats += 1,
                _ => {}
            }
        }
    }

    fn spawn_from_notes(
        &mut self,
        inputs: &TickInputs,
        clock: &dyn PlaybackClock,
        audio: &dyn BandEnergy,
        output: &mut TickOutput,
    ) {
        let Some(notes) = self.note_spawner.as_mut() else {
            return;
        };
        if !clock.is_playing() {
            return;
        }

        let scan = notes.get_spawns(
            clock.playback_position(),
            inputs.player_speed,
            inputs.player_x,
            inputs.camera_x,
            audio,
        );

        self.stats.missed_notes += scan.missed.len() as u64;
        self.stats.pickups_spawned += scan.spawns.len() as u64;
        output.missed_notes = scan.missed;
        for decision in scan.spawns {
            output.spawns.push(self.pickups.track(decision));
        }
    }

    /// Tell the session the collaborator destroyed an entity (collected or hit).
    pub fn mark_destroyed(&mut self, id: EntityId) -> bool {
        match id.kind {
            SpawnKind::Pickup => self.pickups.mark_destroyed(id),
            SpawnKind::Hazard => self
                .hazard_spawner
                .as_mut()
                .map_or(false, |hazards| hazards.mark_destroyed(id)),
        }
    }

    /// Start a fresh playthrough from `camera_x`. Returns the handles that were
    /// still alive so the collaborator can destroy them.
    pub fn restart(&mut self, camera_x: f32) -> Vec<EntityId> {
        info!("🔄 Restarting rhythm session at x={:.1}", camera_x);
        self.beat_tracker.reset();
        self.beat_queue.clear();
        if let Some(notes) = self.note_spawner.as_mut() {
            notes.reset();
        }

        let mut alive = self.pickups.clear();
        if let Some(hazards) = self.hazard_spawner.as_mut() {
            alive.extend(hazards.reset(camera_x));
        }
        alive
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    pub fn note_spawner(&self) -> Option<&PredictiveNoteSpawner> {
        self.note_spawner.as_ref()
    }

    pub fn hazard_spawner(&self) -> Option<&HazardSpawner> {
        self.hazard_spawner.as_ref()
    }

    pub fn recent_pickup_positions(&self) -> &[f32] {
        self.pickups.recent_positions()
    }

    pub fn active_pickups(&self) -> usize {
        self.pickups.active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ManualClock, StaticBandEnergy};
    use crate::notes::Note;

    fn config(source: PickupSource) -> SpawnerConfig {
        let mut config = SpawnerConfig::default();
        config.session.seed = Some(1234);
        config.session.pickup_source = source;
        config
    }

    fn inputs(player_x: f32) -> TickInputs {
        TickInputs {
            dt: 1.0 / 60.0,
            player_speed: 150.0,
            player_x,
            camera_x: player_x,
        }
    }

    #[test]
    fn test_beat_mode_spawns_on_loud_beats() {
        let mut session = RhythmSession::new(config(PickupSource::Beats), 0.0).unwrap();
        let mut clock = ManualClock::new(120.0);
        let loud = StaticBandEnergy::uniform(0.9);

        let mut pickups = 0;
        for frame in 0..120 {
            clock.set_position(frame as f64 / 60.0);
            let out = session.tick(inputs(frame as f32 * 2.5), &clock, &loud);
            pickups += out.spawns.iter().filter(|s| s.id.kind == SpawnKind::Pickup).count();
        }

        // Two seconds of eighth notes at 120 BPM
        assert_eq!(session.stats().beats, 8);
        assert_eq!(pickups, 8);
    }

    #[test]
    fn test_beat_pickups_land_ahead_of_player() {
        let config = config(PickupSource::Beats);
        let lead = config.player.camera_lead;
        let mut session = RhythmSession::new(config, lead).unwrap();
        let mut clock = ManualClock::new(120.0);
        let loud = StaticBandEnergy::uniform(0.9);

        let mut seen = 0;
        for frame in 0..120 {
            clock.set_position(frame as f64 / 60.0);
            let player_x = frame as f32 * 2.5;
            let out = session.tick(TickInputs::following(1.0 / 60.0, 150.0, player_x, lead), &clock, &loud);
            for pickup in out.spawns.iter().filter(|s| s.id.kind == SpawnKind::Pickup) {
                assert_eq!(pickup.decision.position.x, player_x + lead);
                seen += 1;
            }
        }
        assert!(seen > 0);
        assert!(lead > 0.0);
    }

    #[test]
    fn test_beat_mode_silence_spawns_nothing() {
        let mut session = RhythmSession::new(config(PickupSource::Beats), 0.0).unwrap();
        let mut clock = ManualClock::new(120.0);
        let quiet = StaticBandEnergy::uniform(0.0);

        for frame in 0..120 {
            clock.set_position(frame as f64 / 60.0);
            let out = session.tick(inputs(0.0), &clock, &quiet);
            assert!(out.spawns.iter().all(|s| s.id.kind != SpawnKind::Pickup));
        }
        assert_eq!(session.stats().silent_beats, session.stats().beats);
    }

    #[test]
    fn test_note_mode_rearms_after_loop() {
        let notes = vec![Note::new(1.0, 60, 0.1), Note::new(1.5, 62, 0.1)];
        let mut session = RhythmSession::new(config(PickupSource::Notes), 0.0)
            .unwrap()
            .with_timeline(NoteTimeline::from_notes(notes).unwrap());

        let audio = StaticBandEnergy::default();
        let mut clock = ManualClock::new(120.0);
        let pass = |session: &mut RhythmSession, clock: &mut ManualClock| {
            let mut fired = 0;
            for frame in 0..180 {
                clock.set_position(frame as f64 / 60.0);
                // Player stands still relative to the camera; the projection
                // alone moves notes through the window
                let out = session.tick(inputs(0.0), clock, &audio);
                fired += out.spawns.iter().filter(|s| s.id.kind == SpawnKind::Pickup).count();
            }
            fired
        };

        assert_eq!(pass(&mut session, &mut clock), 2);
        // Jump back to a point where neither note is inside the window yet
        clock.set_position(0.2);
        let out = session.tick(inputs(0.0), &clock, &audio);
        assert!(out.looped);
        assert_eq!(session.note_spawner().unwrap().spawned_count(), 0);
        assert_eq!(pass(&mut session, &mut clock), 2);
    }

    #[test]
    fn test_hazards_avoid_session_pickups() {
        let mut session = RhythmSession::new(config(PickupSource::Beats), 0.0).unwrap();
        let mut clock = ManualClock::new(128.0);
        let loud = StaticBandEnergy::uniform(0.9);

        for frame in 0..3600 {
            clock.set_position(frame as f64 / 60.0);
            let x = frame as f32 * 2.5;
            let recent: Vec<f32> = session.recent_pickup_positions().to_vec();
            let out = session.tick(inputs(x), &clock, &loud);

            let pickups_now: Vec<f32> = recent
                .iter()
                .copied()
                .chain(out.spawns.iter().filter(|s| s.id.kind == SpawnKind::Pickup).map(|s| s.decision.position.x))
                .filter(|&p| p >= x - 200.0)
                .collect();
            for hazard in out.spawns.iter().filter(|s| s.id.kind == SpawnKind::Hazard) {
                let hx = hazard.decision.position.x;
                assert!(pickups_now.iter().all(|&p| (hx - p).abs() >= 250.0));
            }
        }
        assert!(session.stats().hazards_spawned > 0);
    }

    #[test]
    fn test_mark_destroyed_and_restart() {
        let mut session = RhythmSession::new(config(PickupSource::Beats), 0.0).unwrap();
        let clock = ManualClock::new(120.0).at(0.1);
        let out = session.tick(inputs(0.0), &clock, &StaticBandEnergy::uniform(1.0));

        let pickup = out.spawns.iter().find(|s| s.id.kind == SpawnKind::Pickup).unwrap().id;
        let hazard = out.spawns.iter().find(|s| s.id.kind == SpawnKind::Hazard).unwrap().id;
        assert!(session.mark_destroyed(pickup));
        assert!(!session.mark_destroyed(pickup));

        let alive = session.restart(0.0);
        assert_eq!(alive, vec![hazard]);
        assert_eq!(session.active_pickups(), 0);
        assert!(session.recent_pickup_positions().is_empty());
    }

    #[test]
    fn test_stopped_audio_spawns_only_hazards() {
        let mut session = RhythmSession::new(config(PickupSource::Beats), 0.0).unwrap();
        let mut clock = ManualClock::new(120.0).at(3.0);
        clock.playing = false;

        let out = session.tick(inputs(0.0), &clock, &StaticBandEnergy::uniform(1.0));
        assert!(out.beat.is_none());
        assert!(out.spawns.iter().all(|s| s.id.kind == SpawnKind::Hazard));
    }
}
