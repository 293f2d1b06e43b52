use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::analysis::{NoteRegistry, SessionSummary};

/// End-of-session view of the note registry.
#[derive(Debug, Serialize)]
pub struct Report {
    pub frames: usize,
    pub stopped: bool,
    pub onsets: Vec<String>,
    /// Number of windows each note was heard in, over the whole session.
    pub tally: BTreeMap<String, usize>,
}

impl Report {
    pub fn new(summary: SessionSummary, registry: &NoteRegistry) -> Self {
        let mut tally = BTreeMap::new();
        for event in registry.notes_history() {
            *tally.entry(event.name.clone()).or_insert(0) += 1;
        }
        Self {
            frames: summary.frames,
            stopped: summary.stopped,
            onsets: registry.onset_notes().to_vec(),
            tally,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Frames analysed: {}", self.frames);
        if self.onsets.is_empty() {
            let _ = writeln!(out, "No note onsets detected");
        } else {
            let _ = writeln!(out, "Onsets ({}): {}", self.onsets.len(), self.onsets.join(" "));
        }
        if !self.tally.is_empty() {
            let _ = writeln!(out, "Windows per note:");
            let mut notes: Vec<_> = self.tally.iter().collect();
            notes.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (name, count) in notes {
                let _ = writeln!(out, "  {:<4} {}", name, count);
            }
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NoteRegistry {
        let mut registry = NoteRegistry::new();
        registry.add_note("A4", 2.0);
        registry.add_note("A4", 1.5);
        registry.add_note("E5", 3.0);
        registry
    }

    #[test]
    fn tallies_history() {
        let summary = SessionSummary { frames: 3, stopped: false };
        let report = Report::new(summary, &registry());
        assert_eq!(report.tally.get("A4"), Some(&2));
        assert_eq!(report.tally.get("E5"), Some(&1));
        assert!(report.onsets.is_empty());
    }

    #[test]
    fn text_lists_most_heard_first() {
        let report = Report::new(SessionSummary { frames: 3, stopped: false }, &registry());
        let text = report.to_text();
        assert!(text.contains("No note onsets detected"));
        let a4 = text.find("A4").unwrap();
        let e5 = text.find("E5").unwrap();
        assert!(a4 < e5);
    }

    #[test]
    fn json_has_onsets_and_tally() {
        let report = Report::new(SessionSummary { frames: 3, stopped: true }, &registry());
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["frames"], 3);
        assert_eq!(value["stopped"], true);
        assert_eq!(value["tally"]["A4"], 2);
        assert!(value["onsets"].as_array().unwrap().is_empty());
    }
}
