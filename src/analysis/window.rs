use clap::ValueEnum;
use serde::Deserialize;
use std::f32::consts::PI;

/// Smoothing curve applied to a frame before the transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WindowFunction {
    Hamming,
    #[default]
    BlackmanHarris,
}

impl WindowFunction {
    /// Multiplies `buffer` in place by the window's coefficients.
    /// Buffers of length 0 or 1 are left untouched.
    pub fn apply(self, buffer: &mut [f32]) {
        match self {
            WindowFunction::Hamming => hamming(buffer),
            WindowFunction::BlackmanHarris => blackman_harris(buffer),
        }
    }

    pub fn coefficient(self, i: usize, len: usize) -> f32 {
        if len <= 1 {
            return 1.0;
        }
        let angle = 2.0 * PI * i as f32 / (len - 1) as f32;
        match self {
            WindowFunction::Hamming => 0.54 - 0.46 * angle.cos(),
            WindowFunction::BlackmanHarris => {
                0.35875 - 0.48829 * angle.cos() + 0.14128 * (2.0 * angle).cos()
                    - 0.01168 * (3.0 * angle).cos()
            }
        }
    }
}

pub fn hamming(buffer: &mut [f32]) {
    let len = buffer.len();
    if len <= 1 {
        return;
    }
    for (i, value) in buffer.iter_mut().enumerate() {
        *value *= WindowFunction::Hamming.coefficient(i, len);
    }
}

pub fn blackman_harris(buffer: &mut [f32]) {
    let len = buffer.len();
    if len <= 1 {
        return;
    }
    for (i, value) in buffer.iter_mut().enumerate() {
        *value *= WindowFunction::BlackmanHarris.coefficient(i, len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(len: usize) -> Vec<f32> {
        vec![1.0; len]
    }

    #[test]
    fn hamming_endpoints_and_center() {
        let mut buffer = ones(9);
        hamming(&mut buffer);
        assert!((buffer[0] - 0.08).abs() < 1e-6);
        assert!((buffer[4] - 1.0).abs() < 1e-6);
        assert!((buffer[8] - 0.08).abs() < 1e-6);
    }

    #[test]
    fn blackman_harris_endpoints_and_center() {
        let mut buffer = ones(9);
        blackman_harris(&mut buffer);
        // a0 - a1 + a2 - a3
        assert!((buffer[0] - 0.00006).abs() < 1e-5);
        assert!((buffer[4] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn windows_are_symmetric() {
        for window in [WindowFunction::Hamming, WindowFunction::BlackmanHarris] {
            for len in [2usize, 3, 16, 255, 2048] {
                let mut buffer = ones(len);
                window.apply(&mut buffer);
                for i in 0..len {
                    let mirrored = buffer[len - 1 - i];
                    assert!(
                        (buffer[i] - mirrored).abs() < 1e-5,
                        "{:?} len={} i={}: {} vs {}",
                        window,
                        len,
                        i,
                        buffer[i],
                        mirrored
                    );
                }
            }
        }
    }

    #[test]
    fn degenerate_lengths_are_noops() {
        let mut empty: Vec<f32> = Vec::new();
        hamming(&mut empty);
        blackman_harris(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![0.7];
        hamming(&mut single);
        assert_eq!(single, vec![0.7]);
        blackman_harris(&mut single);
        assert_eq!(single, vec![0.7]);
    }

    #[test]
    fn scales_input_rather_than_replacing_it() {
        let mut buffer = vec![2.0; 5];
        WindowFunction::Hamming.apply(&mut buffer);
        assert!((buffer[2] - 2.0).abs() < 1e-6);
        assert!((buffer[0] - 0.16).abs() < 1e-6);
    }
}
