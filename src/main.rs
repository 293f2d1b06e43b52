mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::AtomicBool;

use cli::Cli;
use notescribe::analysis::{FrequencyRange, ProcessorConfig, SignalProcessor};
use notescribe::audio::decode::decode_audio;
use notescribe::config::{self, Config};
use notescribe::report::Report;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let file_config = match config::find_config(cli.config.as_deref()) {
        Some(path) => match config::load_config(&path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("notescribe - note onset detection");
    log::info!("Input: {}", cli.input.display());

    log::info!("Decoding audio...");
    let audio = decode_audio(&cli.input)?;

    let analysis = merge_analysis(&cli, file_config.analysis, audio.sample_rate, audio.frames());
    let range = FrequencyRange::new(
        cli.low.or(file_config.range.low).unwrap_or(20.0),
        cli.high
            .or(file_config.range.high)
            .unwrap_or(audio.sample_rate as f32 / 2.0),
    )
    .context("Invalid frequency range")?;

    let mut processor =
        SignalProcessor::new(analysis, range).context("Invalid analysis configuration")?;
    let layout = *processor.layout();
    log::info!(
        "Window {} samples, shift {}, FFT {} ({} bins, {:.2} Hz each), range {}..{} Hz",
        layout.window_size,
        layout.shift_size,
        layout.fft_buffer_size,
        layout.fft_size,
        layout.bin_width(),
        range.low,
        range.high
    );

    let stop = AtomicBool::new(false);

    if let Some(ref noise_path) = cli.noise {
        log::info!("Learning noise profile from {}", noise_path.display());
        let noise = decode_audio(noise_path)?;
        if noise.sample_rate != audio.sample_rate {
            anyhow::bail!(
                "Noise recording is {} Hz but input is {} Hz",
                noise.sample_rate,
                audio.sample_rate
            );
        }
        processor.learn_noise(&noise.left, &noise.right, &stop);
    }

    let total_frames = expected_frames(audio.frames(), layout.window_size, layout.shift_size);
    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} windows ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let summary = processor.process_signal(&audio.left, &audio.right, &stop, |outcome, registry| {
        if outcome.onset {
            let time = outcome.offset as f32 / audio.sample_rate as f32;
            for note in registry.notes() {
                pb.println(format!("{:8.3}s  {}", time, note.name));
            }
        }
        pb.set_position(outcome.index as u64 + 1);
    });
    pb.finish_and_clear();

    let report = Report::new(summary, processor.registry());
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text());
    }

    Ok(())
}

/// File values, overridden by any flag given on the command line.
fn merge_analysis(cli: &Cli, mut cfg: ProcessorConfig, rate: u32, frames: usize) -> ProcessorConfig {
    cfg.rate = rate;
    if cfg.signal_length == 0 {
        cfg.signal_length = frames;
    }
    if let Some(v) = cli.window_ms {
        cfg.window_ms = v;
    }
    if let Some(v) = cli.shift_ms {
        cfg.shift_ms = v;
    }
    if let Some(v) = cli.harmonics {
        cfg.harmonics = v;
    }
    if let Some(v) = cli.max_freq_error {
        cfg.max_freq_error = v;
    }
    if let Some(v) = cli.window {
        cfg.window_function = v;
    }
    if let Some(v) = cli.channel {
        cfg.channel = v;
    }
    if let Some(v) = cli.detector {
        cfg.detector = v;
    }
    if let Some(v) = cli.onset_threshold {
        cfg.onset.threshold = v;
    }
    if let Some(v) = cli.onset_depth {
        cfg.onset.depth = v;
    }
    if cli.pad_tail {
        cfg.pad_tail = true;
    }
    if cli.noise.is_some() {
        cfg.subtract_noise = true;
    }
    cfg.fft_buffer_size = cli.fft_size.or(cfg.fft_buffer_size).or_else(|| {
        let window = (cfg.window_ms as f64 * rate as f64 / 1000.0).round() as usize;
        Some(window.max(2).next_power_of_two())
    });
    cfg
}

fn expected_frames(samples: usize, window: usize, shift: usize) -> usize {
    if window == 0 || shift == 0 || samples < window {
        return 0;
    }
    (samples - window) / shift + 1
}
