use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use serde::Serialize;

use arrvee_spawner::audio::{FrequencyBandSampler, PlaybackClock, SpectrumAnalyzer, Track, TrackInfo, TrackPlayer};
use arrvee_spawner::{
    JsonNoteSource, NoteTimeline, PickupSource, RhythmSession, SessionStats, SpawnKind, SpawnerConfig, TickInputs,
    TrackedSpawn,
};

const FFT_SIZE: usize = 2048;
const SYNTH_SAMPLE_RATE: u32 = 44100;
const DEFAULT_SYNTH_SECONDS: f64 = 60.0;

#[derive(Parser)]
#[command(name = "arrvee-spawner")]
#[command(about = "Run a headless rhythm spawning session against a track")]
struct Args {
    /// WAV file to play; a click track is synthesized when omitted
    #[arg(long)]
    wav: Option<String>,

    /// Note timeline (JSON array of {onset, pitch, duration}); switches pickups to notes
    #[arg(long)]
    notes: Option<String>,

    /// Tempo of the track
    #[arg(long, default_value = "120")]
    bpm: f64,

    /// Seconds to simulate (defaults to the track length)
    #[arg(long)]
    seconds: Option<f64>,

    /// Simulation ticks per second
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Spawner configuration file (JSON)
    #[arg(long)]
    config: Option<String>,

    /// Seed for reproducible placement
    #[arg(long)]
    seed: Option<u64>,

    /// Loop the track instead of stopping at the end
    #[arg(long = "loop")]
    looping: bool,

    /// Write the spawn log and stats to this JSON file
    #[arg(long)]
    report: Option<String>,
}

#[derive(Serialize)]
struct SpawnRecord {
    time: f64,
    #[serde(flatten)]
    spawn: TrackedSpawn,
}

#[derive(Serialize)]
struct SessionReport {
    track_seconds: f64,
    simulated_seconds: f64,
    bpm: f64,
    pickup_source: PickupSource,
    stats: SessionStats,
    spawns: Vec<SpawnRecord>,
}

/// Forward motion of the simulated player; the camera's leading edge runs
/// `camera_lead` ahead of it.
struct Runner {
    x: f32,
    speed: f32,
    max_speed: f32,
    acceleration: f32,
    camera_lead: f32,
}

impl Runner {
    fn new(config: &SpawnerConfig) -> Self {
        Self {
            x: 0.0,
            speed: config.player.initial_speed,
            max_speed: config.player.max_speed,
            acceleration: config.player.acceleration,
            camera_lead: config.player.camera_lead,
        }
    }

    fn camera_x(&self) -> f32 {
        self.x + self.camera_lead
    }

    fn inputs(&self, dt: f64) -> TickInputs {
        TickInputs::following(dt, self.speed, self.x, self.camera_lead)
    }

    fn step(&mut self, dt: f32) {
        self.speed = (self.speed + self.acceleration * dt).min(self.max_speed);
        self.x += self.speed * dt;
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Arrvee rhythm spawner");

    let mut config = match &args.config {
        Some(path) => SpawnerConfig::load(path).with_context(|| format!("loading config {}", path))?,
        None => SpawnerConfig::default(),
    };
    if args.seed.is_some() {
        config.session.seed = args.seed;
    }

    let timeline = match &args.notes {
        Some(path) => {
            let timeline = NoteTimeline::load(&JsonNoteSource::new(path))?;
            info!("Loaded {} notes ({:.2}s) from {}", timeline.len(), timeline.total_duration(), path);
            config.session.pickup_source = PickupSource::Notes;
            Some(timeline)
        }
        None => None,
    };

    let track = match &args.wav {
        Some(path) => Track::load_wav(path, TrackInfo::with_bpm(args.bpm)).with_context(|| format!("loading {}", path))?,
        None => {
            let seconds = args.seconds.unwrap_or(DEFAULT_SYNTH_SECONDS);
            info!("No WAV given, synthesizing {:.0}s click track at {} BPM", seconds, args.bpm);
            Track::synthesize(args.bpm, seconds, SYNTH_SAMPLE_RATE)?
        }
    };
    let track_seconds = track.duration_seconds();
    let simulated_seconds = args.seconds.unwrap_or(track_seconds);
    let sample_rate = track.sample_rate as f32;
    info!("Track: {:.2}s @ {}Hz, simulating {:.2}s", track_seconds, track.sample_rate, simulated_seconds);

    let mut runner = Runner::new(&config);
    let mut session = RhythmSession::new(config.clone(), runner.camera_x())?;
    if let Some(timeline) = timeline {
        session = session.with_timeline(timeline);
    }

    let mut player = TrackPlayer::new(track, args.looping);
    let mut analyzer = SpectrumAnalyzer::new(sample_rate, FFT_SIZE);
    player.play();

    let fps = args.fps.max(1);
    let dt = 1.0 / fps as f64;
    let total_ticks = (simulated_seconds * fps as f64).ceil() as u64;
    let mut spawns = Vec::new();

    for tick in 0..total_ticks {
        let time = tick as f64 * dt;

        analyzer.analyze(&player.current_window(FFT_SIZE));
        analyzer.set_active(player.is_playing());

        let output = session.tick(runner.inputs(dt), &player, &FrequencyBandSampler::new(&analyzer));

        for spawn in output.spawns {
            debug!(
                "{:>8.3}s spawn {} at ({:.1}, {:.1})",
                time, spawn.id, spawn.decision.position.x, spawn.decision.position.y
            );
            spawns.push(SpawnRecord { time, spawn });
        }
        for id in &output.despawns {
            debug!("{:>8.3}s despawn {}", time, id);
        }
        for missed in &output.missed_notes {
            warn!("Note {} at {:.3}s was missed", missed.index, missed.onset_seconds);
        }

        runner.step(dt as f32);
        player.advance(dt);
        if player.is_finished() {
            info!("Track ended after {:.2}s", time);
            break;
        }
    }

    let stats = session.stats().clone();
    let pickups = spawns.iter().filter(|s| s.spawn.id.kind == SpawnKind::Pickup).count();
    let hazards = spawns.len() - pickups;

    info!("\n=== SESSION SUMMARY ===");
    info!("Ticks: {}", stats.ticks);
    info!("Beats: {} ({} silent)", stats.beats, stats.silent_beats);
    info!("Pickups spawned: {}", pickups);
    info!("Hazards spawned: {}", hazards);
    info!("Despawned: {}", stats.despawned);
    info!("Missed notes: {}", stats.missed_notes);
    info!("Loops: {}", stats.loops);
    info!("Final speed: {:.1}, distance: {:.1}", runner.speed, runner.x);

    if let Some(path) = &args.report {
        let report = SessionReport {
            track_seconds,
            simulated_seconds,
            bpm: args.bpm,
            pickup_source: session.config().session.pickup_source,
            stats,
            spawns,
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("writing report {}", path))?;
        info!("Report written to {}", path);
    }

    Ok(())
}
