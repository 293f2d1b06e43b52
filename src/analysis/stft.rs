use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::params::{ChannelSelect, FftLayout};
use super::window::WindowFunction;

/// Transform state for one channel.
struct ChannelTransform {
    windowed: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl ChannelTransform {
    fn new(layout: &FftLayout, scratch_len: usize) -> Self {
        Self {
            windowed: vec![0.0; layout.window_size],
            buffer: vec![Complex::new(0.0, 0.0); layout.fft_buffer_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Windows `samples` (zero-filling past their end) and runs the forward
    /// transform over the zero-padded buffer.
    fn run(&mut self, fft: &dyn Fft<f32>, samples: &[f32], window: WindowFunction) {
        let n = self.windowed.len().min(samples.len());
        self.windowed[..n].copy_from_slice(&samples[..n]);
        self.windowed[n..].iter_mut().for_each(|v| *v = 0.0);
        window.apply(&mut self.windowed);

        for (slot, &s) in self.buffer.iter_mut().zip(self.windowed.iter()) {
            *slot = Complex::new(s, 0.0);
        }
        for slot in self.buffer.iter_mut().skip(self.windowed.len()) {
            *slot = Complex::new(0.0, 0.0);
        }
        fft.process_with_scratch(&mut self.buffer, &mut self.scratch);
    }
}

/// Windowing plus forward FFT of a left/right frame pair.
pub struct StereoTransform {
    fft: Arc<dyn Fft<f32>>,
    window: WindowFunction,
    fft_size: usize,
    left: ChannelTransform,
    right: ChannelTransform,
}

impl StereoTransform {
    pub fn new(layout: &FftLayout, window: WindowFunction) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(layout.fft_buffer_size);
        let scratch_len = fft.get_inplace_scratch_len();
        Self {
            left: ChannelTransform::new(layout, scratch_len),
            right: ChannelTransform::new(layout, scratch_len),
            fft,
            window,
            fft_size: layout.fft_size,
        }
    }

    /// Transforms both channels. They share no mutable state, so they run
    /// on the rayon pool side by side.
    pub fn process(&mut self, left: &[f32], right: &[f32]) {
        let fft = &*self.fft;
        let window = self.window;
        let (left_state, right_state) = (&mut self.left, &mut self.right);
        rayon::join(
            || left_state.run(fft, left, window),
            || right_state.run(fft, right, window),
        );
    }

    /// One-sided spectrum of the left channel from the last `process` call.
    pub fn left(&self) -> &[Complex<f32>] {
        &self.left.buffer[..self.fft_size]
    }

    pub fn right(&self) -> &[Complex<f32>] {
        &self.right.buffer[..self.fft_size]
    }

    /// Writes the selected channel's one-sided spectrum into `out`.
    pub fn select(&self, channel: ChannelSelect, out: &mut Vec<Complex<f32>>) {
        out.clear();
        match channel {
            ChannelSelect::Left => out.extend_from_slice(self.left()),
            ChannelSelect::Right => out.extend_from_slice(self.right()),
            ChannelSelect::Mix => out.extend(
                self.left()
                    .iter()
                    .zip(self.right())
                    .map(|(l, r)| (l + r) * 0.5),
            ),
        }
    }
}
