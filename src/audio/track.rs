use std::path::Path;

use log::info;
use thiserror::Error;

use super::clock::{PlaybackClock, TrackInfo};

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to read WAV file: {0}")]
    Wav(#[from] hound::Error),
    #[error("track has no audio samples")]
    Empty,
    #[error("invalid tempo: {0} BPM")]
    InvalidTempo(f64),
}

/// Decoded mono audio plus its tempo metadata.
#[derive(Debug, Clone)]
pub struct Track {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub info: TrackInfo,
}

impl Track {
    /// Load a WAV file and mix it down to mono. Tempo comes from the caller,
    /// WAV carries no BPM metadata.
    pub fn load_wav<P: AsRef<Path>>(path: P, info: TrackInfo) -> Result<Self, TrackError> {
        let mut reader = hound::WavReader::open(&path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        // Mix to mono for analysis
        let samples: Vec<f32> = interleaved
            .chunks_exact(channels)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect();

        if samples.is_empty() {
            return Err(TrackError::Empty);
        }

        info!(
            "Loaded audio file: {:?} ({}Hz, {} samples, {:.2}s)",
            path.as_ref(),
            spec.sample_rate,
            samples.len(),
            samples.len() as f32 / spec.sample_rate as f32
        );

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            info,
        })
    }

    /// Build a click track: a decaying low sine burst on every beat with a
    /// quieter mid tone on the off-beats, followed by a silent tail.
    pub fn synthesize(bpm: f64, seconds: f64, sample_rate: u32) -> Result<Self, TrackError> {
        if !(bpm > 0.0 && bpm.is_finite()) {
            return Err(TrackError::InvalidTempo(bpm));
        }

        let total = (seconds.max(0.0) * sample_rate as f64) as usize;
        if total == 0 {
            return Err(TrackError::Empty);
        }

        let beat_len = 60.0 / bpm;
        let silent_from = seconds * 0.9;
        let sr = sample_rate as f64;

        let samples = (0..total)
            .map(|i| {
                let t = i as f64 / sr;
                if t >= silent_from {
                    return 0.0;
                }
                let in_beat = t % beat_len;
                let half = beat_len / 2.0;
                let value = if in_beat < half {
                    let env = (-in_beat * 12.0).exp();
                    env * (2.0 * std::f64::consts::PI * 80.0 * t).sin()
                } else {
                    let env = (-(in_beat - half) * 12.0).exp();
                    0.4 * env * (2.0 * std::f64::consts::PI * 660.0 * t).sin()
                };
                value as f32
            })
            .collect();

        let beat_count = (seconds / beat_len).floor() as u32;
        Ok(Self {
            samples,
            sample_rate,
            info: TrackInfo {
                bpm,
                beats_per_bar: 4,
                beat_count,
            },
        })
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Playback transport over a decoded track, advanced by the simulation loop.
pub struct TrackPlayer {
    track: Track,
    position: f64,
    playing: bool,
    looping: bool,
}

impl TrackPlayer {
    pub fn new(track: Track, looping: bool) -> Self {
        Self {
            track,
            position: 0.0,
            playing: false,
            looping,
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
        info!("Audio playback started");
    }

    pub fn is_finished(&self) -> bool {
        !self.playing && self.position >= self.track.duration_seconds()
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Move the transport forward, wrapping when looping.
    pub fn advance(&mut self, dt: f64) {
        if !self.playing {
            return;
        }

        let duration = self.track.duration_seconds();
        self.position += dt;
        if self.position >= duration {
            if self.looping && duration > 0.0 {
                self.position %= duration;
                info!("🔁 Track looped");
            } else {
                self.position = duration;
                self.playing = false;
                info!("Track finished");
            }
        }
    }

    /// The `len` samples ending at the current position, zero padded at the start.
    pub fn current_window(&self, len: usize) -> Vec<f32> {
        let end = ((self.position * self.track.sample_rate as f64) as usize).min(self.track.samples.len());
        let start = end.saturating_sub(len);

        let mut window = vec![0.0; len - (end - start)];
        window.extend_from_slice(&self.track.samples[start..end]);
        window
    }
}

impl PlaybackClock for TrackPlayer {
    fn playback_position(&self) -> f64 {
        if self.playing { self.position } else { 0.0 }
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn track_info(&self) -> TrackInfo {
        self.track.info
    }
}
