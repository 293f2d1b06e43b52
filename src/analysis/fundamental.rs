use serde::Serialize;

/// Fraction of the strongest in-range spectrum bin a candidate must reach.
///
/// Bins below it only hold window leakage, and at harmonic orders above 1
/// their product can otherwise outweigh the true fundamental.
pub const PEAK_FLOOR: f32 = 0.05;

/// Peak of a harmonic product spectrum.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Fundamental {
    pub bin: usize,
    pub frequency: f32,
    pub amplitude: f32,
}

/// Picks the largest value of `hps` within the inclusive `bounds`.
///
/// Only bins that are local maxima of `spectrum` and reach [`PEAK_FLOOR`] of
/// its in-range peak are candidates. Ties go to the lowest bin. Returns
/// `None` when the peak is zero (or not finite), so silence never reads as a
/// 0 Hz fundamental.
pub fn find_fundamental(
    hps: &[f32],
    spectrum: &[f32],
    bounds: (usize, usize),
    bin_width: f32,
) -> Option<Fundamental> {
    let (low, high) = bounds;
    let len = hps.len().min(spectrum.len());
    if len == 0 || low > high || low >= len {
        return None;
    }
    let high = high.min(len - 1);

    let loudest = spectrum[low..=high].iter().copied().fold(0.0f32, f32::max);
    if !(loudest > 0.0) {
        return None;
    }
    let floor = loudest * PEAK_FLOOR;

    let mut best: Option<(usize, f32)> = None;
    for bin in low..=high {
        if !is_spectral_peak(spectrum, bin, floor) {
            continue;
        }
        let value = hps[bin];
        if best.map_or(true, |(_, top)| value > top) {
            best = Some((bin, value));
        }
    }

    let (bin, amplitude) = best?;
    if !(amplitude > 0.0) || !amplitude.is_finite() {
        return None;
    }

    Some(Fundamental {
        bin,
        frequency: bin as f32 * bin_width,
        amplitude,
    })
}

fn is_spectral_peak(spectrum: &[f32], bin: usize, floor: f32) -> bool {
    let value = spectrum[bin];
    let below = bin.checked_sub(1).map_or(0.0, |b| spectrum[b]);
    let above = spectrum.get(bin + 1).copied().unwrap_or(0.0);
    value >= floor && value >= below && value >= above
}
