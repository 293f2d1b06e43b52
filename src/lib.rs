//! Note detection for stereo audio: finds the fundamental of each analysis
//! window with a harmonic product spectrum, maps it to a MIDI note, and
//! separates freshly struck notes from the decay of earlier ones.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod report;

pub use analysis::{FrequencyRange, ProcessorConfig, ProcessorError, SignalProcessor};
