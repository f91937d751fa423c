pub mod fft;
pub mod band_sampler;
pub mod clock;
pub mod beat_tracker;
pub mod track;

pub use fft::SpectrumAnalyzer;
pub use band_sampler::{BandEnergy, FrequencyBandSampler, SpectrumSource, StaticBandEnergy};
pub use clock::{ManualClock, PlaybackClock, TrackInfo};
pub use beat_tracker::{BeatEvent, BeatTick, BeatTracker};
pub use track::{Track, TrackError, TrackPlayer};

use serde::{Deserialize, Serialize};

// Frequency ranges (in Hz)
pub const BASS_MIN_FREQ: f32 = 20.0;
pub const BASS_MAX_FREQ: f32 = 250.0;
pub const MID_MIN_FREQ: f32 = 250.0;
pub const MID_MAX_FREQ: f32 = 2000.0;

/// Named frequency band used to gate and shape spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrequencyBand {
    /// 20-250 Hz, follows kicks and bass lines
    Bass,
    /// 250-2000 Hz, follows melody
    MidRange,
    /// Bass for timing decisions, mid range for vertical placement
    MultiBand,
}

impl FrequencyBand {
    /// Frequency range sampled when this band is read directly.
    pub fn frequency_range(self) -> (f32, f32) {
        match self {
            FrequencyBand::Bass => (BASS_MIN_FREQ, BASS_MAX_FREQ),
            FrequencyBand::MidRange | FrequencyBand::MultiBand => (MID_MIN_FREQ, MID_MAX_FREQ),
        }
    }

    /// Band consulted when deciding whether something should happen now.
    pub fn timing_band(self) -> FrequencyBand {
        match self {
            FrequencyBand::MultiBand => FrequencyBand::Bass,
            other => other,
        }
    }

    /// Band consulted when deciding where something goes.
    pub fn placement_band(self) -> FrequencyBand {
        match self {
            FrequencyBand::MultiBand => FrequencyBand::MidRange,
            other => other,
        }
    }
}

impl Default for FrequencyBand {
    fn default() -> Self {
        FrequencyBand::MidRange
    }
}

/// How many detection edges per beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeatSubdivision {
    Quarter,
    Eighth,
    Sixteenth,
    Triplet,
}

impl BeatSubdivision {
    pub fn multiplier(self) -> u32 {
        match self {
            BeatSubdivision::Quarter => 1,
            BeatSubdivision::Eighth => 2,
            BeatSubdivision::Sixteenth => 4,
            BeatSubdivision::Triplet => 3,
        }
    }
}

impl Default for BeatSubdivision {
    fn default() -> Self {
        BeatSubdivision::Eighth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiband_policy() {
        assert_eq!(FrequencyBand::MultiBand.timing_band(), FrequencyBand::Bass);
        assert_eq!(FrequencyBand::MultiBand.placement_band(), FrequencyBand::MidRange);
        assert_eq!(FrequencyBand::Bass.placement_band(), FrequencyBand::Bass);
        assert_eq!(FrequencyBand::MidRange.timing_band(), FrequencyBand::MidRange);
    }

    #[test]
    fn test_subdivision_multipliers() {
        assert_eq!(BeatSubdivision::Quarter.multiplier(), 1);
        assert_eq!(BeatSubdivision::Eighth.multiplier(), 2);
        assert_eq!(BeatSubdivision::Triplet.multiplier(), 3);
        assert_eq!(BeatSubdivision::Sixteenth.multiplier(), 4);
    }
}
