use thiserror::Error;

/// Errors surfaced to the caller before any frame is processed.
///
/// Degenerate numeric input (silent frames, empty windows, frequencies with
/// no MIDI counterpart) is not an error: it produces a frame without a
/// detection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessorError {
    #[error("configuration error: {0}")]
    Configuration(String),
}
