use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded audio split into left and right channels, normalised to [-1, 1].
pub struct StereoAudio {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count of the source before splitting.
    pub channels: usize,
}

impl StereoAudio {
    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Splits interleaved samples. Mono input is copied to both channels and
    /// channels past the second are ignored.
    pub fn from_interleaved(samples: &[f32], channels: usize, sample_rate: u32) -> Self {
        let mut audio = StereoAudio {
            left: Vec::with_capacity(samples.len() / channels.max(1)),
            right: Vec::with_capacity(samples.len() / channels.max(1)),
            sample_rate,
            channels,
        };
        audio.push_interleaved(samples);
        audio
    }

    fn push_interleaved(&mut self, samples: &[f32]) {
        match self.channels {
            0 => {}
            1 => {
                self.left.extend_from_slice(samples);
                self.right.extend_from_slice(samples);
            }
            n => {
                for frame in samples.chunks_exact(n) {
                    self.left.push(frame[0]);
                    self.right.push(frame[1]);
                }
            }
        }
    }
}

pub fn decode_audio(path: &Path) -> Result<StereoAudio> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("No audio tracks found")?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut audio = StereoAudio::from_interleaved(&[], channels, sample_rate);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(err)) => {
                log::warn!("Skipping undecodable packet: {}", err);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        audio.push_interleaved(sample_buf.samples());
    }

    log::info!(
        "Decoded audio: {} frames x {} channels, {}Hz, {:.1}s",
        audio.frames(),
        channels,
        sample_rate,
        audio.duration()
    );

    Ok(audio)
}
