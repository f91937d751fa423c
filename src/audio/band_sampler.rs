use super::FrequencyBand;

/// Lower edge of the normalization window, in decibels.
pub const FLOOR_DB: f32 = -60.0;

/// Anything that can report spectral magnitude over a frequency range.
///
/// Implementations hold a snapshot of the spectrum; keeping that snapshot fresh
/// is the implementor's job, the sampler only reads it.
pub trait SpectrumSource {
    /// Whether the audio behind this source is currently audible.
    fn is_active(&self) -> bool;

    /// Mean linear magnitude between `min_hz` and `max_hz`, or `None` when no
    /// analysis is available.
    fn magnitude_for_range(&self, min_hz: f32, max_hz: f32) -> Option<f32>;
}

/// Normalized per-band loudness, the only audio input the spawners read.
pub trait BandEnergy {
    /// Energy in `[0, 1]` for `band`; 0 when nothing is playing.
    fn sample_band_energy(&self, band: FrequencyBand) -> f32;
}

/// Converts raw range magnitudes into `[0, 1]` band energy.
///
/// The magnitude is converted to decibels and the `[-60 dB, 0 dB]` window is
/// mapped linearly onto `[0, 1]`, clamped at both ends.
pub struct FrequencyBandSampler<'a, S: SpectrumSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: SpectrumSource + ?Sized> FrequencyBandSampler<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    pub fn sample(&self, band: FrequencyBand) -> f32 {
        if !self.source.is_active() {
            return 0.0;
        }

        let (min_hz, max_hz) = band.frequency_range();
        match self.source.magnitude_for_range(min_hz, max_hz) {
            Some(magnitude) => normalize_magnitude(magnitude),
            None => 0.0,
        }
    }
}

impl<S: SpectrumSource + ?Sized> BandEnergy for FrequencyBandSampler<'_, S> {
    fn sample_band_energy(&self, band: FrequencyBand) -> f32 {
        self.sample(band)
    }
}

/// Linear magnitude to decibels. Non-positive input has no finite level.
pub fn linear_to_db(magnitude: f32) -> Option<f32> {
    if magnitude > 0.0 && magnitude.is_finite() {
        Some(20.0 * magnitude.log10())
    } else {
        None
    }
}

/// Map a linear magnitude onto `[0, 1]` through the -60..0 dB window.
pub fn normalize_magnitude(magnitude: f32) -> f32 {
    match linear_to_db(magnitude) {
        Some(db) => ((db - FLOOR_DB) / -FLOOR_DB).clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// Fixed per-band energies, handy for replaying a prescanned track or tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StaticBandEnergy {
    pub bass: f32,
    pub mid: f32,
}

impl StaticBandEnergy {
    pub fn new(bass: f32, mid: f32) -> Self {
        Self { bass, mid }
    }

    pub fn uniform(energy: f32) -> Self {
        Self::new(energy, energy)
    }
}

impl BandEnergy for StaticBandEnergy {
    fn sample_band_energy(&self, band: FrequencyBand) -> f32 {
        match band {
            FrequencyBand::Bass => self.bass,
            FrequencyBand::MidRange | FrequencyBand::MultiBand => self.mid,
        }
        .clamp(0.0, 1.0)
    }
}
