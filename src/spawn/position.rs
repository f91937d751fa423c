use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use crate::audio::{BandEnergy, FrequencyBand};
use crate::config::{FftConfig, PickupConfig};

/// Given where something will be placed horizontally, decide its height.
///
/// Generators may signal "do not spawn" by returning a height outside
/// [`height_range`](PositionGenerator::height_range); callers must check with
/// [`is_in_bounds`](PositionGenerator::is_in_bounds) before spawning.
pub trait PositionGenerator {
    fn generate_y(&mut self, x: f32, audio: &dyn BandEnergy) -> f32;

    /// Inclusive `(min, max)` of valid heights.
    fn height_range(&self) -> (f32, f32);

    fn is_in_bounds(&self, y: f32) -> bool {
        let (min, max) = self.height_range();
        y >= min && y <= max
    }

    fn generator_type(&self) -> &'static str;
}

/// Heights drawn uniformly from the configured range, independent of x and audio.
pub struct UniformRandomGenerator {
    rng: StdRng,
    min_height: f32,
    max_height: f32,
}

impl UniformRandomGenerator {
    pub fn new(min_height: f32, max_height: f32, rng: StdRng) -> Self {
        let (min_height, max_height) = if min_height <= max_height {
            (min_height, max_height)
        } else {
            (max_height, min_height)
        };
        Self {
            rng,
            min_height,
            max_height,
        }
    }

    pub fn from_config(pickups: &PickupConfig, rng: StdRng) -> Self {
        Self::new(pickups.min_height, pickups.max_height, rng)
    }
}

impl PositionGenerator for UniformRandomGenerator {
    fn generate_y(&mut self, _x: f32, _audio: &dyn BandEnergy) -> f32 {
        self.rng.gen_range(self.min_height..=self.max_height)
    }

    fn height_range(&self) -> (f32, f32) {
        (self.min_height, self.max_height)
    }

    fn generator_type(&self) -> &'static str {
        "uniform"
    }
}

/// Heights follow band energy: quiet passages sit low, loud passages reach the
/// extremes. Energy below the threshold yields an out-of-range height.
pub struct FftDrivenGenerator {
    band: FrequencyBand,
    rng: StdRng,
    min_height: f32,
    max_height: f32,
    amplitude_scale: f32,
    threshold: f32,
    jitter_range: f32,
}

impl FftDrivenGenerator {
    pub fn new(band: FrequencyBand, pickups: &PickupConfig, fft: &FftConfig, rng: StdRng) -> Self {
        debug!("FFT position generator using {:?} band", band.placement_band());
        Self {
            band,
            rng,
            min_height: pickups.min_height.min(pickups.max_height),
            max_height: pickups.max_height.max(pickups.min_height),
            amplitude_scale: fft.amplitude_scale,
            threshold: fft.threshold,
            jitter_range: fft.jitter_range.abs(),
        }
    }

    /// Height returned when energy is too low to spawn.
    pub fn sentinel(&self) -> f32 {
        self.max_height + 100.0
    }

    /// Height for `energy` before jitter, clamped to the valid range.
    pub fn base_height(&self, energy: f32) -> f32 {
        // Power curve emphasizes peaks
        let emphasized = energy.clamp(0.0, 1.0).powf(1.5);
        let normalized = emphasized * 2.0 - 1.0;
        (normalized * self.amplitude_scale).clamp(self.min_height, self.max_height)
    }

    /// Height for a known energy level, jitter included.
    pub fn height_for_energy(&mut self, energy: f32) -> f32 {
        if energy < self.threshold {
            return self.sentinel();
        }

        let jitter = self.rng.gen_range(-self.jitter_range..=self.jitter_range);
        (self.base_height(energy) + jitter).clamp(self.min_height, self.max_height)
    }
}

impl PositionGenerator for FftDrivenGenerator {
    fn generate_y(&mut self, _x: f32, audio: &dyn BandEnergy) -> f32 {
        let energy = audio.sample_band_energy(self.band.placement_band());
        self.height_for_energy(energy)
    }

    fn height_range(&self) -> (f32, f32) {
        (self.min_height, self.max_height)
    }

    fn generator_type(&self) -> &'static str {
        "fft"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::StaticBandEnergy;
    use crate::spawn::seeded_rng;

    fn fft_generator(band: FrequencyBand) -> FftDrivenGenerator {
        FftDrivenGenerator::new(band, &PickupConfig::default(), &FftConfig::default(), seeded_rng(Some(7), 0))
    }

    #[test]
    fn test_uniform_stays_in_range() {
        let mut generator = UniformRandomGenerator::new(-90.0, 90.0, seeded_rng(Some(1), 0));
        let audio = StaticBandEnergy::default();
        for x in 0..500 {
            let y = generator.generate_y(x as f32, &audio);
            assert!(generator.is_in_bounds(y), "y={} out of range", y);
        }
    }

    #[test]
    fn test_uniform_swaps_inverted_range() {
        let generator = UniformRandomGenerator::new(10.0, -10.0, seeded_rng(Some(1), 0));
        assert_eq!(generator.height_range(), (-10.0, 10.0));
    }

    #[test]
    fn test_fft_below_threshold_is_out_of_bounds() {
        let mut generator = fft_generator(FrequencyBand::MidRange);
        for energy in [0.0, 0.01, 0.049] {
            let y = generator.generate_y(0.0, &StaticBandEnergy::uniform(energy));
            assert!(!generator.is_in_bounds(y));
            assert_eq!(y, 190.0);
        }
    }

    #[test]
    fn test_fft_base_height_is_monotonic() {
        let generator = fft_generator(FrequencyBand::MidRange);
        let mut previous = f32::NEG_INFINITY;
        for step in 5..=100 {
            let height = generator.base_height(step as f32 / 100.0);
            assert!(height >= previous);
            previous = height;
        }
        assert_eq!(generator.base_height(1.0), 90.0);
        assert_eq!(generator.base_height(0.0), -90.0);
    }

    #[test]
    fn test_fft_jittered_height_stays_in_range() {
        let mut generator = fft_generator(FrequencyBand::MidRange);
        for step in 5..=100 {
            let y = generator.height_for_energy(step as f32 / 100.0);
            assert!(generator.is_in_bounds(y));
            let base = generator.base_height(step as f32 / 100.0);
            assert!((y - base).abs() <= 20.0 + 1e-4);
        }
    }

    #[test]
    fn test_multiband_places_with_mid_range() {
        let mut generator = fft_generator(FrequencyBand::MultiBand);
        // Loud bass but silent mids: nothing to place
        let y = generator.generate_y(0.0, &StaticBandEnergy::new(1.0, 0.0));
        assert!(!generator.is_in_bounds(y));

        let y = generator.generate_y(0.0, &StaticBandEnergy::new(0.0, 1.0));
        assert!(generator.is_in_bounds(y));
    }
}
