use rustfft::{FftPlanner, num_complex::Complex};
use super::band_sampler::SpectrumSource;

/// CPU FFT analyzer that keeps the most recent magnitude spectrum around so
/// band energy can be queried by frequency range between analysis passes.
pub struct SpectrumAnalyzer {
    sample_rate: f32,
    fft_size: usize,
    fft: std::sync::Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,

    // Latest magnitude snapshot, one bin per sample_rate / fft_size Hz
    spectrum: Vec<f32>,
    has_snapshot: bool,
    active: bool,
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate: f32, fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window = Self::hann_window(fft_size);

        Self {
            sample_rate,
            fft_size,
            fft,
            window,
            spectrum: vec![0.0; fft_size / 2],
            has_snapshot: false,
            active: false,
        }
    }

    fn hann_window(size: usize) -> Vec<f32> {
        if size < 2 {
            return vec![1.0; size];
        }
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect()
    }

    /// Analyze one window of mono samples and replace the current snapshot.
    /// Shorter windows are zero padded.
    pub fn analyze(&mut self, audio_data: &[f32]) {
        let windowed_data = self.apply_window(audio_data);
        self.spectrum = self.compute_fft(&windowed_data);
        self.has_snapshot = true;
    }

    /// Mark whether the audio feeding this analyzer is currently audible.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Drop the snapshot, e.g. when playback stops.
    pub fn clear(&mut self) {
        self.spectrum.iter_mut().for_each(|bin| *bin = 0.0);
        self.has_snapshot = false;
    }

    fn apply_window(&self, audio_data: &[f32]) -> Vec<f32> {
        let len = self.fft_size.min(audio_data.len());
        (0..len)
            .map(|i| audio_data[i] * self.window[i])
            .collect()
    }

    fn compute_fft(&self, windowed_data: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = windowed_data
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .collect();

        if buffer.len() < self.fft_size {
            buffer.resize(self.fft_size, Complex::new(0.0, 0.0));
        }

        self.fft.process(&mut buffer);

        buffer[..self.fft_size / 2]
            .iter()
            .map(|c| c.norm() * 2.0 / self.fft_size as f32)
            .collect()
    }

    fn average_range(data: &[f32], start: usize, end: usize) -> f32 {
        if start >= end || start >= data.len() {
            return 0.0;
        }

        let end = end.min(data.len());
        let sum: f32 = data[start..end].iter().sum();
        sum / (end - start) as f32
    }
}

impl SpectrumSource for SpectrumAnalyzer {
    fn is_active(&self) -> bool {
        self.active
    }

    fn magnitude_for_range(&self, min_hz: f32, max_hz: f32) -> Option<f32> {
        if !self.has_snapshot || self.fft_size == 0 {
            return None;
        }

        let bin_width = self.sample_rate / self.fft_size as f32;
        let start = (min_hz / bin_width).floor().max(0.0) as usize;
        // Always cover at least one bin so narrow bands still read something
        let end = ((max_hz / bin_width).ceil() as usize).max(start + 1);

        Some(Self::average_range(&self.spectrum, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_no_snapshot_reads_none() {
        let analyzer = SpectrumAnalyzer::new(44100.0, 2048);
        assert!(analyzer.magnitude_for_range(20.0, 250.0).is_none());
    }

    #[test]
    fn test_bass_tone_lands_in_bass_range() {
        let mut analyzer = SpectrumAnalyzer::new(44100.0, 2048);
        analyzer.analyze(&sine(100.0, 44100.0, 2048));

        let bass = analyzer.magnitude_for_range(20.0, 250.0).unwrap();
        let mid = analyzer.magnitude_for_range(250.0, 2000.0).unwrap();
        assert!(bass > mid * 10.0, "bass={} mid={}", bass, mid);
    }

    #[test]
    fn test_clear_drops_snapshot() {
        let mut analyzer = SpectrumAnalyzer::new(44100.0, 1024);
        analyzer.analyze(&sine(440.0, 44100.0, 1024));
        analyzer.clear();
        assert!(analyzer.magnitude_for_range(250.0, 2000.0).is_none());
    }
}
