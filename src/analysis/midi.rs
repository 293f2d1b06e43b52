use serde::Serialize;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// A MIDI note number with its equal-temperament frequency.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MidiNote {
    pub number: u8,
    pub frequency: f32,
}

impl MidiNote {
    /// Pitch class and octave, e.g. `"A4"` for note 69.
    pub fn name(&self) -> String {
        note_name(self.number)
    }
}

pub fn note_name(number: u8) -> String {
    let octave = (number / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(number % 12) as usize], octave)
}

/// Frequencies of MIDI notes 0..=127, A4 = 440 Hz.
pub struct MidiTable {
    freqs: [f32; 128],
}

impl Default for MidiTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiTable {
    pub fn new() -> Self {
        let mut freqs = [0.0f32; 128];
        for (n, freq) in freqs.iter_mut().enumerate() {
            *freq = 440.0 * 2.0f32.powf((n as f32 - 69.0) / 12.0);
        }
        Self { freqs }
    }

    pub fn frequency(&self, number: u8) -> Option<f32> {
        self.freqs.get(number as usize).copied()
    }

    /// Nearest note to `freq`, or `None` if it is further than `max_freq_error` Hz away.
    pub fn freq_to_midi(&self, freq: f32, max_freq_error: f32) -> Option<MidiNote> {
        if !(freq > 0.0) || !freq.is_finite() {
            return None;
        }
        let number = self.nearest(freq)?;
        let table_freq = self.frequency(number)?;

        if (table_freq - freq).abs() > max_freq_error {
            log::trace!(
                "{:.2} Hz is {:.2} Hz from {}, outside tolerance",
                freq,
                (table_freq - freq).abs(),
                note_name(number)
            );
            return None;
        }
        Some(MidiNote {
            number,
            frequency: table_freq,
        })
    }

    fn nearest(&self, freq: f32) -> Option<u8> {
        let (number, _) = self
            .freqs
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - freq).abs().total_cmp(&(*b - freq).abs()))?;
        u8::try_from(number).ok()
    }
}
