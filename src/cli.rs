use clap::Parser;
use std::path::PathBuf;

use notescribe::analysis::{ChannelSelect, Detector, WindowFunction};

#[derive(Parser, Debug)]
#[command(name = "notescribe", about = "Detects played notes and their onsets in an audio file")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Configuration file (TOML). Defaults to notescribe.toml or the user config dir.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Analysis window length in milliseconds
    #[arg(long)]
    pub window_ms: Option<f32>,

    /// Shift between windows in milliseconds
    #[arg(long)]
    pub shift_ms: Option<f32>,

    /// FFT buffer size in samples (defaults to the window size rounded up to a power of two)
    #[arg(long)]
    pub fft_size: Option<usize>,

    /// Harmonic product spectrum order
    #[arg(long)]
    pub harmonics: Option<usize>,

    /// Lowest analysed frequency in Hz
    #[arg(long)]
    pub low: Option<f32>,

    /// Highest analysed frequency in Hz
    #[arg(long)]
    pub high: Option<f32>,

    /// Largest accepted distance in Hz between a detected pitch and a note
    #[arg(long)]
    pub max_freq_error: Option<f32>,

    /// Window function applied before the transform
    #[arg(long, value_enum)]
    pub window: Option<WindowFunction>,

    /// Channel used for detection
    #[arg(long, value_enum)]
    pub channel: Option<ChannelSelect>,

    /// Pitch detector
    #[arg(long, value_enum)]
    pub detector: Option<Detector>,

    /// Noise-only recording used to build a noise profile that is subtracted from every frame
    #[arg(long)]
    pub noise: Option<PathBuf>,

    /// Minimum amplitude rise for an onset
    #[arg(long)]
    pub onset_threshold: Option<f32>,

    /// Consecutive rising frames required for an onset
    #[arg(long)]
    pub onset_depth: Option<usize>,

    /// Analyse the trailing partial window, zero-padded
    #[arg(long)]
    pub pad_tail: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}
