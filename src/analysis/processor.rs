use rustfft::num_complex::Complex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::ProcessorError;
use super::fundamental::{find_fundamental, Fundamental};
use super::midi::{MidiNote, MidiTable};
use super::onset::{OnsetDetector, OnsetState};
use super::params::{ChannelSelect, Detector, FftLayout, FrequencyRange, ProcessorConfig};
use super::period::zero_crossing_pitch;
use super::registry::{NoteEvent, NoteRegistry};
use super::spectrum::{compute_hps, compute_magnitude, compute_spectrum, SessionBuffers};
use super::stft::StereoTransform;

/// What one analysis window produced.
#[derive(Clone, Debug, Serialize)]
pub struct FrameOutcome {
    pub index: usize,
    /// Offset of the first sample of the frame, per channel.
    pub offset: usize,
    pub fundamental: Option<Fundamental>,
    pub note: Option<MidiNote>,
    pub onset: bool,
    pub state: OnsetState,
}

/// Summary of a `process_signal` or `learn_noise` run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub frames: usize,
    /// True when the stop flag ended the run before the input was exhausted.
    pub stopped: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FrameMode {
    Detect,
    Noise,
}

/// Pitch and onset analysis of a stereo signal.
///
/// Owns every piece of frame-sequential state (amplitude history, noise
/// profile, note registry), so one instance serves one session on one
/// thread.
pub struct SignalProcessor {
    config: ProcessorConfig,
    range: FrequencyRange,
    layout: FftLayout,
    transform: StereoTransform,
    selected: Vec<Complex<f32>>,
    mono: Vec<f32>,
    buffers: SessionBuffers,
    midi: MidiTable,
    onset: OnsetDetector,
    registry: NoteRegistry,
    frame_index: usize,
}

impl SignalProcessor {
    /// Validates the configuration, derives the frame and bin sizes, and
    /// allocates the session buffers.
    pub fn new(config: ProcessorConfig, range: FrequencyRange) -> Result<Self, ProcessorError> {
        let layout = FftLayout::compute(&config)?;
        range.validate_for(config.rate)?;

        if layout.window_size == 0 {
            log::warn!(
                "window of {} ms at {} Hz holds no samples, nothing will be detected",
                config.window_ms,
                config.rate
            );
        }
        log::debug!(
            "window={} shift={} fft_buffer={} bins={} range={}..{} Hz",
            layout.window_size,
            layout.shift_size,
            layout.fft_buffer_size,
            layout.fft_size,
            range.low,
            range.high
        );

        Ok(Self {
            transform: StereoTransform::new(&layout, config.window_function),
            selected: Vec::with_capacity(layout.fft_size),
            mono: vec![0.0; layout.window_size],
            buffers: SessionBuffers::allocate(&layout),
            midi: MidiTable::new(),
            onset: OnsetDetector::new(config.onset),
            registry: NoteRegistry::new(),
            frame_index: 0,
            config,
            range,
            layout,
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn layout(&self) -> &FftLayout {
        &self.layout
    }

    pub fn frequency_range(&self) -> FrequencyRange {
        self.range
    }

    /// Re-scopes analysis without reallocating any buffer.
    pub fn set_frequency_range(&mut self, range: FrequencyRange) -> Result<(), ProcessorError> {
        range.validate_for(self.config.rate)?;
        self.range = range;
        Ok(())
    }

    pub fn magnitude(&self) -> &[f32] {
        &self.buffers.magnitude
    }

    pub fn spectrum(&self) -> &[f32] {
        &self.buffers.spectrum
    }

    pub fn hps(&self) -> &[f32] {
        &self.buffers.hps
    }

    pub fn noise_profile(&self) -> &[f32] {
        self.buffers.noise.sum()
    }

    pub fn reset_noise_profile(&mut self) {
        self.buffers.noise.reset();
    }

    pub fn onset_state(&self) -> OnsetState {
        self.onset.state()
    }

    pub fn registry(&self) -> &NoteRegistry {
        &self.registry
    }

    /// Notes of the most recent window.
    pub fn notes(&self) -> &[NoteEvent] {
        self.registry.notes()
    }

    pub fn notes_history(&self) -> &[NoteEvent] {
        self.registry.notes_history()
    }

    pub fn onset_notes(&self) -> &[String] {
        self.registry.onset_notes()
    }

    pub fn freq_to_midi(&self, freq: f32) -> Option<MidiNote> {
        self.midi.freq_to_midi(freq, self.config.max_freq_error)
    }

    /// Overwrites the magnitude array from one-sided transform output.
    pub fn compute_magnitude(&mut self, bins: &[Complex<f32>]) {
        compute_magnitude(bins, &mut self.buffers.magnitude);
    }

    /// Adds the magnitudes of a noise-only frame to the noise profile.
    pub fn accumulate_noise_profile(&mut self, bins: &[Complex<f32>]) {
        compute_magnitude(bins, &mut self.buffers.magnitude);
        self.buffers.noise.accumulate(&self.buffers.magnitude);
    }

    pub fn compute_spectrum(&mut self) {
        let noise = (self.config.subtract_noise && self.buffers.noise.frames() > 0)
            .then_some(&self.buffers.noise);
        compute_spectrum(
            &self.buffers.magnitude,
            noise,
            &self.range,
            self.config.rate,
            &mut self.buffers.spectrum,
        );
    }

    pub fn compute_hps(&mut self) {
        compute_hps(&self.buffers.spectrum, self.config.harmonics, &mut self.buffers.hps);
    }

    /// Peak of the HPS array within the active frequency range, taken among
    /// the bins that stand out as peaks of the spectrum.
    pub fn find_fundamental(&self) -> Option<Fundamental> {
        let bounds = self.layout.bin_bounds(&self.range)?;
        find_fundamental(
            &self.buffers.hps,
            &self.buffers.spectrum,
            bounds,
            self.layout.bin_width(),
        )
    }

    /// Runs the full pipeline over `left`/`right`, one window at a time.
    ///
    /// `stop` is polled between frames; a frame in flight always completes.
    /// `on_frame` sees each outcome while that window's notes are current.
    pub fn process_signal<F>(
        &mut self,
        left: &[f32],
        right: &[f32],
        stop: &AtomicBool,
        mut on_frame: F,
    ) -> SessionSummary
    where
        F: FnMut(&FrameOutcome, &NoteRegistry),
    {
        let summary = self.drive(left, right, stop, FrameMode::Detect, |outcome, registry| {
            if let Some(outcome) = outcome {
                on_frame(outcome, registry);
            }
        });
        log::info!(
            "Analysed {} frames: {} notes, {} onsets",
            summary.frames,
            self.registry.notes_history().len(),
            self.registry.onset_notes().len()
        );
        summary
    }

    /// Accumulates the noise profile from a noise-only recording.
    pub fn learn_noise(&mut self, left: &[f32], right: &[f32], stop: &AtomicBool) -> SessionSummary {
        let summary = self.drive(left, right, stop, FrameMode::Noise, |_, _| {});
        log::info!("Noise profile built from {} frames", self.buffers.noise.frames());
        summary
    }

    /// Analyses a single frame pair of `window_size` samples per channel.
    ///
    /// Frames are assumed to follow each other one shift apart.
    pub fn process_frame(&mut self, left: &[f32], right: &[f32]) -> FrameOutcome {
        let offset = self.frame_index * self.layout.shift_size;
        self.process_frame_at(left, right, offset)
    }

    fn process_frame_at(&mut self, left: &[f32], right: &[f32], offset: usize) -> FrameOutcome {
        self.registry.begin_window();
        let index = self.frame_index;
        self.frame_index += 1;

        let fundamental = match self.config.detector {
            Detector::Hps => {
                self.transform_frame(left, right);
                let bins = std::mem::take(&mut self.selected);
                self.compute_magnitude(&bins);
                self.selected = bins;
                self.compute_spectrum();
                self.compute_hps();
                self.find_fundamental()
            }
            Detector::ZeroCrossing => self.zero_crossing_fundamental(left, right),
        };

        let note = fundamental.and_then(|f| self.freq_to_midi(f.frequency));
        let amplitude = fundamental.map_or(0.0, |f| f.amplitude);
        let onset = self.onset.update(amplitude, note.map(|n| n.number));

        if let (Some(found), Some(midi)) = (fundamental, note) {
            let name = midi.name();
            log::debug!(
                "frame {}: {:.1} Hz -> {} (amp {:.3e}){}",
                index,
                found.frequency,
                name,
                found.amplitude,
                if onset { " onset" } else { "" }
            );
            if onset {
                self.registry.record_onset(name.clone());
            }
            self.registry.add_note(name, found.amplitude);
        } else if let Some(found) = fundamental {
            log::trace!("frame {}: {:.1} Hz has no MIDI match", index, found.frequency);
        }

        FrameOutcome {
            index,
            offset,
            fundamental,
            note,
            onset,
            state: self.onset.state(),
        }
    }

    fn transform_frame(&mut self, left: &[f32], right: &[f32]) {
        self.transform.process(left, right);
        self.transform.select(self.config.channel, &mut self.selected);
    }

    fn noise_frame(&mut self, left: &[f32], right: &[f32]) {
        self.transform_frame(left, right);
        let bins = std::mem::take(&mut self.selected);
        self.accumulate_noise_profile(&bins);
        self.selected = bins;
    }

    fn zero_crossing_fundamental(&mut self, left: &[f32], right: &[f32]) -> Option<Fundamental> {
        let n = self.mono.len().min(left.len()).min(right.len());
        for i in 0..n {
            self.mono[i] = match self.config.channel {
                ChannelSelect::Left => left[i],
                ChannelSelect::Right => right[i],
                ChannelSelect::Mix => 0.5 * (left[i] + right[i]),
            };
        }
        let (frequency, rms) = zero_crossing_pitch(&self.mono[..n], self.config.rate)?;
        if !self.range.contains(frequency) || !(rms > 0.0) {
            return None;
        }
        Some(Fundamental {
            bin: (frequency / self.layout.bin_width()).round() as usize,
            frequency,
            amplitude: rms,
        })
    }

    fn drive<F>(
        &mut self,
        left: &[f32],
        right: &[f32],
        stop: &AtomicBool,
        mode: FrameMode,
        mut on_frame: F,
    ) -> SessionSummary
    where
        F: FnMut(Option<&FrameOutcome>, &NoteRegistry),
    {
        let window = self.layout.window_size;
        let shift = self.layout.shift_size;
        let mut summary = SessionSummary::default();
        if window == 0 {
            return summary;
        }

        let mut available = left.len().min(right.len());
        if self.config.signal_length > 0 {
            available = available.min(self.config.signal_length);
        }
        let (left, right) = (&left[..available], &right[..available]);

        let mut position = 0;
        while position < available {
            if stop.load(Ordering::Relaxed) {
                log::info!("Stop requested after {} frames", summary.frames);
                summary.stopped = true;
                break;
            }

            let end = position + window;
            if end > available && !self.config.pad_tail {
                log::debug!("Dropping {} trailing samples", available - position);
                break;
            }
            let end = end.min(available);
            let (l, r) = (&left[position..end], &right[position..end]);

            match mode {
                FrameMode::Detect => {
                    let outcome = self.process_frame_at(l, r, position);
                    on_frame(Some(&outcome), &self.registry);
                }
                FrameMode::Noise => {
                    self.noise_frame(l, r);
                    on_frame(None, &self.registry);
                }
            }
            summary.frames += 1;
            position += shift;
        }
        summary
    }
}
