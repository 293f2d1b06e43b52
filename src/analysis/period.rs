/// Number of rising zero crossings in `buffer`, i.e. whole periods seen.
pub fn count_periods(buffer: &[f32]) -> usize {
    rising_crossings(buffer).count()
}

/// Frequency estimate from the spacing of rising zero crossings, together
/// with the RMS level of the buffer.
///
/// Needs at least two crossings; anything less (silence, DC, a window too
/// short for one full period) yields `None`.
pub fn zero_crossing_pitch(buffer: &[f32], rate: u32) -> Option<(f32, f32)> {
    if rate == 0 {
        return None;
    }
    let crossings = count_periods(buffer);
    if crossings < 2 {
        return None;
    }

    let mut positions = rising_crossings(buffer);
    let first = positions.next()?;
    let span = positions.last().unwrap_or(first) - first;
    if !(span > 0.0) {
        return None;
    }

    let periods = (crossings - 1) as f32;
    let frequency = periods * rate as f32 / span;
    let rms = (buffer.iter().map(|s| s * s).sum::<f32>() / buffer.len() as f32).sqrt();
    Some((frequency, rms))
}

/// Fractional sample positions of rising zero crossings, interpolated
/// within each sample pair.
fn rising_crossings(buffer: &[f32]) -> impl Iterator<Item = f32> + '_ {
    buffer
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0] < 0.0 && pair[1] >= 0.0)
        .map(|(i, pair)| i as f32 - pair[0] / (pair[1] - pair[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn counts_whole_periods() {
        // 100 Hz over 0.1 s = 10 periods, first crossing at sample 0 is not counted
        let buffer = sine(100.0, 8000, 800);
        let periods = count_periods(&buffer);
        assert!((9..=10).contains(&periods), "periods = {}", periods);
    }

    #[test]
    fn estimates_sine_frequency() {
        let buffer = sine(440.0, 44100, 4096);
        let (freq, rms) = zero_crossing_pitch(&buffer, 44100).unwrap();
        assert!((freq - 440.0).abs() < 1.0, "freq = {}", freq);
        assert!((rms - 0.7071).abs() < 0.01);
    }

    #[test]
    fn pitch_uses_the_counted_periods() {
        // two periods of a 4-sample square wave: three rising crossings
        let buffer = [-1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0];
        assert_eq!(count_periods(&buffer), 3);
        let (freq, rms) = zero_crossing_pitch(&buffer, 400).unwrap();
        assert!((freq - 100.0).abs() < 1e-3, "freq = {}", freq);
        assert_eq!(rms, 1.0);
        // a single crossing is not a period
        assert!(zero_crossing_pitch(&buffer[..4], 400).is_none());
    }

    #[test]
    fn silence_and_dc_have_no_pitch() {
        assert!(zero_crossing_pitch(&[0.0; 1024], 44100).is_none());
        assert!(zero_crossing_pitch(&[0.3; 1024], 44100).is_none());
        assert!(zero_crossing_pitch(&sine(440.0, 44100, 1024), 0).is_none());
    }
}
