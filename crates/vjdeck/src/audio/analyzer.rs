//! Audio energy analyzer
//!
//! Reduces fixed-size sample blocks to per-frame energy metrics: Hann
//! window, forward FFT, bin magnitudes scaled into the 0..=255 range,
//! exponential smoothing per bin, then sum/mean/max reductions with a
//! dedicated low-frequency ("bass") sub-range.

use std::sync::Arc;
use std::time::Instant;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::config::analysis::{BASS_BINS, BIN_CEILING, BIN_COUNT, BIN_SMOOTHING, FFT_SIZE};

use super::types::FrameMetrics;

/// Converts sample blocks into [`FrameMetrics`]
pub struct EnergyAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_buf: Vec<Complex<f32>>,
    /// Smoothed bin levels carried across frames
    bins: [f32; BIN_COUNT],
}

impl EnergyAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        Self {
            fft,
            fft_buf: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            bins: [0.0; BIN_COUNT],
        }
    }

    /// Analyze one block of `FFT_SIZE` samples.
    ///
    /// Blocks shorter than the window are zero-padded; anything beyond
    /// the window is ignored.
    pub fn process_block(&mut self, samples: &[f32]) -> FrameMetrics {
        for (i, slot) in self.fft_buf.iter_mut().enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * hann(i, FFT_SIZE), 0.0);
        }
        self.fft.process(&mut self.fft_buf);

        // Scale magnitudes to the 0..=255 range of the reference
        // byte-frequency representation and smooth each bin.
        let scale = 2.0 * BIN_CEILING / FFT_SIZE as f32;
        for (bin, out) in self.fft_buf.iter().take(BIN_COUNT).zip(self.bins.iter_mut()) {
            let level = (bin.norm() * scale).min(BIN_CEILING);
            *out = *out * BIN_SMOOTHING + level * (1.0 - BIN_SMOOTHING);
        }

        Self::reduce(&self.bins, Instant::now())
    }

    /// Current smoothed bin levels (for spectrum display)
    pub fn bins(&self) -> &[f32; BIN_COUNT] {
        &self.bins
    }

    /// Reset the smoothing history
    pub fn reset(&mut self) {
        self.bins = [0.0; BIN_COUNT];
    }

    fn reduce(bins: &[f32; BIN_COUNT], timestamp: Instant) -> FrameMetrics {
        let total: f32 = bins.iter().sum();
        let max = bins.iter().fold(0.0_f32, |acc, &v| acc.max(v));
        let bass: f32 = bins[..BASS_BINS].iter().sum();

        FrameMetrics {
            total_energy: total.round(),
            average_energy: (total / BIN_COUNT as f32).round(),
            max_energy: max.round(),
            bass_energy: bass.round(),
            bass_average: (bass / BASS_BINS as f32).round(),
            timestamp,
        }
    }
}

impl Default for EnergyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn hann(index: usize, len: usize) -> f32 {
    0.5 * (1.0 - (2.0 * std::f32::consts::PI * index as f32 / len as f32).cos())
}
