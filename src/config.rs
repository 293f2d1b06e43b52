use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analysis::ProcessorConfig;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: ProcessorConfig,
    #[serde(default)]
    pub range: RangeConfig,
}

/// Analysis band; missing bounds fall back to 20 Hz and the Nyquist frequency.
#[derive(Debug, Default, Deserialize)]
pub struct RangeConfig {
    #[serde(default)]
    pub low: Option<f32>,
    #[serde(default)]
    pub high: Option<f32>,
}

/// Explicit path first, then `notescribe.toml` in the working directory,
/// then the user's config directories.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("notescribe.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("notescribe").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("notescribe").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Option<Config> {
    match toml::from_str(content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ChannelSelect, Detector, WindowFunction};

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.analysis.harmonics, 3);
        assert_eq!(config.analysis.window_function, WindowFunction::BlackmanHarris);
        assert_eq!(config.analysis.channel, ChannelSelect::Mix);
        assert!(config.analysis.fft_buffer_size.is_none());
        assert!(config.range.low.is_none());
    }

    #[test]
    fn parses_analysis_and_range_sections() {
        let config = parse_config(
            r#"
            [analysis]
            window_ms = 92.88
            fft_buffer_size = 8192
            harmonics = 4
            window_function = "hamming"
            channel = "left"
            detector = "zero-crossing"
            subtract_noise = true

            [analysis.onset]
            threshold = 2.0
            depth = 2
            relative = false

            [range]
            low = 60.0
            high = 1200.0
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.fft_buffer_size, Some(8192));
        assert_eq!(config.analysis.harmonics, 4);
        assert_eq!(config.analysis.window_function, WindowFunction::Hamming);
        assert_eq!(config.analysis.channel, ChannelSelect::Left);
        assert_eq!(config.analysis.detector, Detector::ZeroCrossing);
        assert!(config.analysis.subtract_noise);
        assert_eq!(config.analysis.onset.depth, 2);
        assert!(!config.analysis.onset.relative);
        // untouched fields keep their defaults
        assert_eq!(config.analysis.shift_ms, 23.22);
        assert_eq!(config.range.low, Some(60.0));
        assert_eq!(config.range.high, Some(1200.0));
    }

    #[test]
    fn malformed_config_is_rejected() {
        assert!(parse_config("[analysis]\nharmonics = \"many\"").is_none());
    }

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/tmp/custom.toml");
        assert_eq!(find_config(Some(path)), Some(path.to_path_buf()));
    }
}
