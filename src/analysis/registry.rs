use serde::Serialize;

/// One detected note occurrence.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NoteEvent {
    pub name: String,
    pub amplitude: f32,
}

/// Notes of the current window, of the whole session, and of confirmed onsets.
#[derive(Debug, Default)]
pub struct NoteRegistry {
    notes: Vec<NoteEvent>,
    history: Vec<NoteEvent>,
    onsets: Vec<String>,
}

impl NoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new processing window, dropping the previous window's notes.
    pub fn begin_window(&mut self) {
        self.notes.clear();
    }

    pub fn add_note(&mut self, name: impl Into<String>, amplitude: f32) {
        let event = NoteEvent {
            name: name.into(),
            amplitude,
        };
        self.history.push(event.clone());
        self.notes.push(event);
    }

    pub(crate) fn record_onset(&mut self, name: impl Into<String>) {
        self.onsets.push(name.into());
    }

    /// Notes detected in the current window.
    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    /// Every note detected this session.
    pub fn notes_history(&self) -> &[NoteEvent] {
        &self.history
    }

    /// Names of confirmed onsets in detection order.
    pub fn onset_notes(&self) -> &[String] {
        &self.onsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_note_feeds_window_and_history_only() {
        let mut registry = NoteRegistry::new();
        registry.begin_window();
        registry.add_note("A4", 3.0);
        registry.add_note("E5", 1.0);
        assert_eq!(registry.notes().len(), 2);
        assert_eq!(registry.notes_history().len(), 2);
        assert!(registry.onset_notes().is_empty());
    }

    #[test]
    fn begin_window_clears_only_the_window() {
        let mut registry = NoteRegistry::new();
        registry.add_note("A4", 3.0);
        registry.record_onset("A4");
        registry.begin_window();
        assert!(registry.notes().is_empty());
        registry.add_note("B4", 2.0);
        assert_eq!(registry.notes()[0].name, "B4");
        let names: Vec<&str> = registry.notes_history().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["A4", "B4"]);
        assert_eq!(registry.onset_notes(), &["A4".to_string()]);
    }
}
