//! Spectral pitch analysis: windowing, STFT framing, magnitude/spectrum/HPS
//! stages, fundamental picking, MIDI mapping and onset tracking.

pub mod error;
pub mod fundamental;
pub mod midi;
pub mod onset;
pub mod params;
pub mod period;
pub mod processor;
pub mod registry;
pub mod spectrum;
pub mod stft;
pub mod window;

pub use error::ProcessorError;
pub use fundamental::Fundamental;
pub use midi::{MidiNote, MidiTable};
pub use onset::{OnsetParams, OnsetState};
pub use params::{ChannelSelect, Detector, FftLayout, FrequencyRange, ProcessorConfig};
pub use processor::{FrameOutcome, SessionSummary, SignalProcessor};
pub use registry::{NoteEvent, NoteRegistry};
pub use window::WindowFunction;
