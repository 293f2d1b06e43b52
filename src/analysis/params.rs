use clap::ValueEnum;
use serde::Deserialize;

use super::error::ProcessorError;
use super::onset::OnsetParams;
use super::window::WindowFunction;

/// Which channel's spectrum feeds the magnitude stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelSelect {
    Left,
    Right,
    /// Average of the left and right complex spectra.
    #[default]
    Mix,
}

/// How the fundamental of each frame is estimated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Detector {
    #[default]
    Hps,
    ZeroCrossing,
}

/// Immutable analysis parameters for one session.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Sample rate in Hz.
    pub rate: u32,
    /// Largest accepted distance (Hz) between a detected frequency and a MIDI note.
    pub max_freq_error: f32,
    pub window_ms: f32,
    pub shift_ms: f32,
    /// Number of samples per channel to analyse; 0 means the whole input.
    pub signal_length: usize,
    /// Transform input length. Must be at least the window size.
    pub fft_buffer_size: Option<usize>,
    /// Harmonic product spectrum order.
    pub harmonics: usize,
    pub window_function: WindowFunction,
    pub channel: ChannelSelect,
    /// Zero-pad and analyse the trailing partial frame instead of dropping it.
    pub pad_tail: bool,
    pub subtract_noise: bool,
    pub detector: Detector,
    pub onset: OnsetParams,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            rate: 44100,
            max_freq_error: 10.0,
            window_ms: 46.44,
            shift_ms: 23.22,
            signal_length: 0,
            fft_buffer_size: None,
            harmonics: 3,
            window_function: WindowFunction::default(),
            channel: ChannelSelect::default(),
            pad_tail: false,
            subtract_noise: false,
            detector: Detector::default(),
            onset: OnsetParams::default(),
        }
    }
}

impl ProcessorConfig {
    /// The Nyquist frequency for this configuration.
    pub fn nyquist(&self) -> f32 {
        self.rate as f32 / 2.0
    }
}

/// Active analysis band in Hz. Bins outside it are zeroed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrequencyRange {
    pub low: f32,
    pub high: f32,
}

impl FrequencyRange {
    pub fn new(low: f32, high: f32) -> Result<Self, ProcessorError> {
        if !(low >= 0.0) || !(low <= high) {
            return Err(ProcessorError::Configuration(format!(
                "frequency range lowbound {} must be non-negative and not above highbound {}",
                low, high
            )));
        }
        Ok(Self { low, high })
    }

    /// Full band for the given sample rate, starting at 20 Hz.
    pub fn audible(rate: u32) -> Self {
        let nyquist = rate as f32 / 2.0;
        Self {
            low: 20.0_f32.min(nyquist),
            high: nyquist,
        }
    }

    pub fn contains(&self, freq: f32) -> bool {
        freq >= self.low && freq <= self.high
    }

    /// Checks ordering and that the band lies below the Nyquist frequency of `rate`.
    pub(crate) fn validate_for(&self, rate: u32) -> Result<(), ProcessorError> {
        Self::new(self.low, self.high)?;
        let nyquist = rate as f32 / 2.0;
        if self.high > nyquist {
            return Err(ProcessorError::Configuration(format!(
                "frequency range highbound {} Hz exceeds Nyquist frequency {} Hz",
                self.high, nyquist
            )));
        }
        Ok(())
    }
}

/// Sample and bin counts derived from a [`ProcessorConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FftLayout {
    pub rate: u32,
    pub window_size: usize,
    pub shift_size: usize,
    pub fft_buffer_size: usize,
    /// One-sided bin count, `fft_buffer_size / 2 + 1`.
    pub fft_size: usize,
}

impl FftLayout {
    pub fn compute(config: &ProcessorConfig) -> Result<Self, ProcessorError> {
        let fft_buffer_size = config.fft_buffer_size.ok_or_else(|| {
            ProcessorError::Configuration("transform buffer size was never set".into())
        })?;
        if fft_buffer_size < 2 {
            return Err(ProcessorError::Configuration(format!(
                "transform buffer size {} is too small",
                fft_buffer_size
            )));
        }
        if config.harmonics == 0 {
            return Err(ProcessorError::Configuration(
                "harmonic product spectrum order must be at least 1".into(),
            ));
        }

        let window_size = ms_to_samples(config.window_ms, config.rate);
        let shift_size = ms_to_samples(config.shift_ms, config.rate);

        if window_size > fft_buffer_size {
            return Err(ProcessorError::Configuration(format!(
                "window of {} samples does not fit a transform buffer of {}",
                window_size, fft_buffer_size
            )));
        }
        if window_size > 0 && shift_size == 0 {
            return Err(ProcessorError::Configuration(
                "shift between windows must be at least one sample".into(),
            ));
        }

        Ok(Self {
            rate: config.rate,
            window_size,
            shift_size,
            fft_buffer_size,
            fft_size: fft_buffer_size / 2 + 1,
        })
    }

    /// Width of one bin in Hz.
    pub fn bin_width(&self) -> f32 {
        self.rate as f32 / (2 * (self.fft_size - 1)) as f32
    }

    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_width()
    }

    /// Inclusive bin bounds covered by `range`, or `None` when no bin falls inside.
    pub fn bin_bounds(&self, range: &FrequencyRange) -> Option<(usize, usize)> {
        let width = self.bin_width();
        if !(width > 0.0) {
            return None;
        }
        let low = (range.low / width).ceil().max(0.0) as usize;
        let high = ((range.high / width).floor() as usize).min(self.fft_size - 1);
        if low > high {
            None
        } else {
            Some((low, high))
        }
    }
}

fn ms_to_samples(ms: f32, rate: u32) -> usize {
    if !(ms > 0.0) {
        return 0;
    }
    (ms as f64 * rate as f64 / 1000.0).round() as usize
}
