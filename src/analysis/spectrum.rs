use rustfft::num_complex::Complex;

use super::params::{FftLayout, FrequencyRange};

/// Per-session arrays, all `fft_size` long and reused frame after frame.
pub struct SessionBuffers {
    pub magnitude: Vec<f32>,
    pub noise: NoiseProfile,
    pub spectrum: Vec<f32>,
    pub hps: Vec<f32>,
}

impl SessionBuffers {
    pub fn allocate(layout: &FftLayout) -> Self {
        Self {
            magnitude: vec![0.0; layout.fft_size],
            noise: NoiseProfile::new(layout.fft_size),
            spectrum: vec![0.0; layout.fft_size],
            hps: vec![0.0; layout.fft_size],
        }
    }
}

/// Magnitudes summed over frames flagged as noise-only.
#[derive(Clone, Debug)]
pub struct NoiseProfile {
    sum: Vec<f32>,
    frames: usize,
}

impl NoiseProfile {
    pub fn new(len: usize) -> Self {
        Self {
            sum: vec![0.0; len],
            frames: 0,
        }
    }

    pub fn accumulate(&mut self, magnitude: &[f32]) {
        for (acc, &m) in self.sum.iter_mut().zip(magnitude) {
            *acc += m;
        }
        self.frames += 1;
    }

    pub fn reset(&mut self) {
        self.sum.iter_mut().for_each(|v| *v = 0.0);
        self.frames = 0;
    }

    /// Accumulated magnitudes.
    pub fn sum(&self) -> &[f32] {
        &self.sum
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Mean noise magnitude of `bin`, 0 when nothing was accumulated.
    pub fn mean(&self, bin: usize) -> f32 {
        if self.frames == 0 {
            return 0.0;
        }
        self.sum.get(bin).copied().unwrap_or(0.0) / self.frames as f32
    }
}

/// `out[b] = |bins[b]|` for every one-sided bin.
pub fn compute_magnitude(bins: &[Complex<f32>], out: &mut [f32]) {
    for (m, c) in out.iter_mut().zip(bins) {
        *m = (c.re * c.re + c.im * c.im).sqrt();
    }
}

/// Copies `magnitude` into `spectrum`, zeroing bins outside `range`.
///
/// With a noise profile the mean noise magnitude is subtracted from each
/// kept bin and negative results clamp to zero.
pub fn compute_spectrum(
    magnitude: &[f32],
    noise: Option<&NoiseProfile>,
    range: &FrequencyRange,
    rate: u32,
    spectrum: &mut [f32],
) {
    let fft_size = spectrum.len();
    if fft_size < 2 {
        spectrum.iter_mut().for_each(|v| *v = 0.0);
        return;
    }
    let bin_width = rate as f32 / (2 * (fft_size - 1)) as f32;

    for (b, out) in spectrum.iter_mut().enumerate() {
        let freq = b as f32 * bin_width;
        if freq < range.low || freq > range.high {
            *out = 0.0;
            continue;
        }
        let value = magnitude[b];
        *out = match noise {
            Some(profile) => (value - profile.mean(b)).max(0.0),
            None => value,
        };
    }
}

/// Harmonic product spectrum of order `harmonics`.
///
/// `hps[b]` is the product of `spectrum[b * k]` for `k` in `1..=harmonics`;
/// bins whose highest harmonic falls past the end are zero.
pub fn compute_hps(spectrum: &[f32], harmonics: usize, hps: &mut [f32]) {
    let len = spectrum.len();
    let harmonics = harmonics.max(1);
    for (b, out) in hps.iter_mut().enumerate() {
        if b * harmonics >= len {
            *out = 0.0;
            continue;
        }
        let mut product = spectrum[b];
        for k in 2..=harmonics {
            product *= spectrum[b * k];
        }
        *out = product;
    }
}
