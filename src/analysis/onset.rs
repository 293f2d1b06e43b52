use serde::{Deserialize, Serialize};

/// Tuning of the onset rule.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OnsetParams {
    /// Minimum amplitude rise between consecutive frames.
    pub threshold: f32,
    /// Number of consecutive rising frames required before an onset fires.
    pub depth: usize,
    /// Measure the rise as a fraction of the previous amplitude instead of
    /// in absolute units.
    pub relative: bool,
}

impl Default for OnsetParams {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            depth: 1,
            relative: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnsetState {
    NoFundamental,
    Sustaining,
    OnsetCandidate,
    ConfirmedOnset,
}

/// Fundamental amplitude over the last three frames, oldest first.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AmplitudeHistory {
    slots: [f32; 3],
    filled: usize,
}

impl AmplitudeHistory {
    pub fn push(&mut self, amplitude: f32) {
        self.slots[0] = self.slots[1];
        self.slots[1] = self.slots[2];
        self.slots[2] = amplitude;
        self.filled = (self.filled + 1).min(3);
    }

    pub fn is_full(&self) -> bool {
        self.filled == 3
    }

    /// Number of populated slots, at most 3.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn first(&self) -> f32 {
        self.slots[0]
    }

    pub fn last(&self) -> f32 {
        self.slots[1]
    }

    pub fn current(&self) -> f32 {
        self.slots[2]
    }

    /// Rise over the most recent frame.
    pub fn slope(&self) -> f32 {
        self.current() - self.last()
    }

    /// Rise across the whole history, two frames deep.
    pub fn trend(&self) -> f32 {
        self.current() - self.first()
    }

    /// Larger of the one-step and two-step rises.
    pub fn biggest_slope(&self) -> f32 {
        self.slope().max(self.trend())
    }
}

/// Decides whether the fundamental of each frame is a new note or the tail
/// of the previous one.
pub struct OnsetDetector {
    params: OnsetParams,
    history: AmplitudeHistory,
    state: OnsetState,
    rising_run: usize,
    last_onset: Option<u8>,
}

impl OnsetDetector {
    pub fn new(params: OnsetParams) -> Self {
        Self {
            params,
            history: AmplitudeHistory::default(),
            state: OnsetState::NoFundamental,
            rising_run: 0,
            last_onset: None,
        }
    }

    pub fn state(&self) -> OnsetState {
        self.state
    }

    pub fn history(&self) -> &AmplitudeHistory {
        &self.history
    }

    /// Feeds one frame. `amplitude` is the fundamental's peak (0 when none
    /// was found) and `note` the MIDI note it maps to, if any.
    ///
    /// Returns true when this frame is a confirmed onset of `note`.
    pub fn update(&mut self, amplitude: f32, note: Option<u8>) -> bool {
        let amplitude = if amplitude.is_finite() { amplitude.max(0.0) } else { 0.0 };
        self.history.push(amplitude);

        if amplitude == 0.0 {
            self.state = OnsetState::NoFundamental;
            self.rising_run = 0;
            self.last_onset = None;
            return false;
        }

        if !self.history.is_full() {
            self.state = OnsetState::Sustaining;
            return false;
        }

        if self.is_rising() {
            self.rising_run += 1;
        } else {
            self.rising_run = 0;
        }

        if self.rising_run == 0 {
            self.state = OnsetState::Sustaining;
            return false;
        }
        if self.rising_run < self.params.depth {
            self.state = OnsetState::OnsetCandidate;
            return false;
        }

        match note {
            Some(number) if self.last_onset != Some(number) => {
                self.last_onset = Some(number);
                self.state = OnsetState::ConfirmedOnset;
                true
            }
            _ => {
                self.state = OnsetState::Sustaining;
                false
            }
        }
    }

    /// True when either the one-step or the two-step rise clears the threshold.
    fn is_rising(&self) -> bool {
        let history = &self.history;
        if !self.params.relative {
            return history.biggest_slope() > self.params.threshold;
        }
        self.rise_exceeds(history.slope(), history.last())
            || self.rise_exceeds(history.trend(), history.first())
    }

    /// `rise` measured against `base`; any rise from nothing counts.
    fn rise_exceeds(&self, rise: f32, base: f32) -> bool {
        if base <= 0.0 {
            return rise > 0.0;
        }
        rise / base > self.params.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absolute(threshold: f32, depth: usize) -> OnsetDetector {
        OnsetDetector::new(OnsetParams {
            threshold,
            depth,
            relative: false,
        })
    }

    #[test]
    fn history_shifts_oldest_out() {
        let mut history = AmplitudeHistory::default();
        assert!(history.is_empty());
        history.push(1.0);
        history.push(2.0);
        assert_eq!(history.len(), 2);
        assert!(!history.is_full());
        history.push(4.0);
        history.push(7.0);
        assert!(history.is_full());
        assert_eq!(history.len(), 3);
        assert_eq!((history.first(), history.last(), history.current()), (2.0, 4.0, 7.0));
        assert_eq!(history.slope(), 3.0);
        assert_eq!(history.trend(), 5.0);
        assert_eq!(history.biggest_slope(), 5.0);
    }

    #[test]
    fn step_from_silence_emits_exactly_one_onset() {
        let mut detector = absolute(0.5, 1);
        let mut onsets = 0;
        for _ in 0..4 {
            onsets += detector.update(0.0, None) as usize;
        }
        for _ in 0..20 {
            onsets += detector.update(10.0, Some(69)) as usize;
        }
        assert_eq!(onsets, 1);
        assert_eq!(detector.state(), OnsetState::Sustaining);
    }

    #[test]
    fn decaying_tail_emits_nothing_after_onset() {
        let mut detector = absolute(0.5, 1);
        let mut onsets = Vec::new();
        let mut amplitudes = vec![0.0, 0.0, 0.0, 10.0];
        let mut amp = 10.0;
        for _ in 0..30 {
            amp *= 0.9;
            amplitudes.push(amp);
        }
        for (i, &a) in amplitudes.iter().enumerate() {
            if detector.update(a, Some(69)) {
                onsets.push(i);
            }
        }
        assert_eq!(onsets, vec![3]);
    }

    #[test]
    fn no_decision_before_history_is_full() {
        let mut detector = absolute(0.5, 1);
        assert!(!detector.update(5.0, Some(60)));
        assert!(!detector.update(50.0, Some(60)));
        assert_eq!(detector.history().len(), 2);
        // rises again once the history holds three frames
        assert!(detector.update(500.0, Some(60)));
    }

    #[test]
    fn depth_requires_consecutive_rises() {
        let mut detector = absolute(1.0, 2);
        detector.update(0.0, None);
        detector.update(0.0, None);
        detector.update(0.0, None);
        assert!(!detector.update(5.0, Some(64)));
        assert_eq!(detector.state(), OnsetState::OnsetCandidate);
        assert!(detector.update(10.0, Some(64)));
        assert_eq!(detector.state(), OnsetState::ConfirmedOnset);
    }

    #[test]
    fn same_note_rising_again_is_not_a_new_onset() {
        let mut detector = absolute(1.0, 1);
        for a in [0.0, 0.0, 0.0] {
            detector.update(a, None);
        }
        assert!(detector.update(5.0, Some(60)));
        assert!(!detector.update(4.0, Some(60)));
        assert!(!detector.update(9.0, Some(60)));
        // a different note striking while the first still sounds
        assert!(detector.update(20.0, Some(62)));
    }

    #[test]
    fn same_note_after_silence_is_a_new_onset() {
        let mut detector = absolute(1.0, 1);
        let mut onsets = 0;
        for a in [0.0, 0.0, 0.0, 5.0, 4.0, 0.0, 0.0, 6.0, 5.0] {
            let note = if a > 0.0 { Some(60) } else { None };
            onsets += detector.update(a, note) as usize;
        }
        assert_eq!(onsets, 2);
    }

    #[test]
    fn relative_threshold_scales_with_level() {
        let mut detector = OnsetDetector::new(OnsetParams::default());
        for a in [100.0, 100.0, 100.0] {
            detector.update(a, Some(57));
        }
        // +30% is below the 50% default
        assert!(!detector.update(130.0, Some(57)));
        // +100%
        assert!(detector.update(260.0, Some(57)));
    }

    #[test]
    fn gradual_strike_fires_on_two_step_rise() {
        // each step is below the threshold, two steps together clear it
        let mut detector = absolute(1.0, 1);
        let mut fired = Vec::new();
        for (i, a) in [0.0, 0.0, 0.0, 0.9, 1.8, 2.7, 3.6].into_iter().enumerate() {
            let note = if a > 0.0 { Some(60) } else { None };
            if detector.update(a, note) {
                fired.push(i);
            }
        }
        assert_eq!(fired, vec![4]);
        assert_eq!(detector.history().biggest_slope(), 1.8);
    }

    #[test]
    fn relative_two_step_rise_counts() {
        let mut detector = OnsetDetector::new(OnsetParams::default());
        for a in [100.0, 100.0, 100.0] {
            detector.update(a, Some(57));
        }
        // +30% is below the 50% default, +30% again is 69% over two frames
        assert!(!detector.update(130.0, Some(57)));
        assert!(detector.update(169.0, Some(57)));
        assert_eq!(detector.state(), OnsetState::ConfirmedOnset);
    }

    #[test]
    fn unmapped_fundamental_never_fires() {
        let mut detector = absolute(0.5, 1);
        for a in [0.0, 0.0, 0.0, 10.0] {
            assert!(!detector.update(a, None));
        }
        assert_eq!(detector.state(), OnsetState::Sustaining);
    }
}
