use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One note onset from a decoded note source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "onset")]
    pub onset_seconds: f64,
    pub pitch: i32,
    #[serde(rename = "duration", default)]
    pub duration_seconds: f64,
}

impl Note {
    pub fn new(onset_seconds: f64, pitch: i32, duration_seconds: f64) -> Self {
        Self {
            onset_seconds,
            pitch,
            duration_seconds,
        }
    }
}

#[derive(Debug, Error)]
pub enum NoteSourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed note data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("note {index} is invalid: {reason}")]
    InvalidNote { index: usize, reason: &'static str },
}

/// Timeline construction failed; carries which source and why.
#[derive(Debug, Error)]
#[error("failed to load note timeline from {source_id}: {cause}")]
pub struct TimelineLoadError {
    pub source_id: String,
    #[source]
    pub cause: NoteSourceError,
}

/// Anything that yields already-decoded notes.
pub trait NoteSource {
    /// Identifier used in error messages (usually a path).
    fn source_id(&self) -> String;

    fn read_notes(&self) -> Result<Vec<Note>, NoteSourceError>;
}

impl NoteSource for Vec<Note> {
    fn source_id(&self) -> String {
        "<memory>".to_string()
    }

    fn read_notes(&self) -> Result<Vec<Note>, NoteSourceError> {
        Ok(self.clone())
    }
}

/// JSON file holding an array of `{ "onset", "pitch", "duration" }` objects.
pub struct JsonNoteSource {
    path: PathBuf,
}

impl JsonNoteSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl NoteSource for JsonNoteSource {
    fn source_id(&self) -> String {
        self.path.display().to_string()
    }

    fn read_notes(&self) -> Result<Vec<Note>, NoteSourceError> {
        let json = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Immutable, onset-ordered note sequence.
#[derive(Debug, Clone, Default)]
pub struct NoteTimeline {
    notes: Vec<Note>,
}

impl NoteTimeline {
    /// Read, validate and order the notes of `source`.
    pub fn load<S: NoteSource + ?Sized>(source: &S) -> Result<Self, TimelineLoadError> {
        let source_id = source.source_id();
        let notes = source
            .read_notes()
            .and_then(Self::validate)
            .map_err(|cause| TimelineLoadError {
                source_id: source_id.clone(),
                cause,
            })?;

        let timeline = Self::from_sorted(notes);
        info!(
            "Loaded note timeline from {}: {} notes, {:.2}s",
            source_id,
            timeline.len(),
            timeline.total_duration()
        );
        Ok(timeline)
    }

    /// Build from in-memory notes.
    pub fn from_notes(notes: Vec<Note>) -> Result<Self, TimelineLoadError> {
        Self::load(&notes)
    }

    fn validate(notes: Vec<Note>) -> Result<Vec<Note>, NoteSourceError> {
        for (index, note) in notes.iter().enumerate() {
            let reason = if !note.onset_seconds.is_finite() {
                "onset is not a finite number"
            } else if note.onset_seconds < 0.0 {
                "onset is negative"
            } else if !note.duration_seconds.is_finite() {
                "duration is not a finite number"
            } else if note.duration_seconds < 0.0 {
                "duration is negative"
            } else {
                continue;
            };
            return Err(NoteSourceError::InvalidNote { index, reason });
        }
        Ok(notes)
    }

    fn from_sorted(mut notes: Vec<Note>) -> Self {
        // Stable: equal onsets keep source order
        notes.sort_by(|a, b| a.onset_seconds.total_cmp(&b.onset_seconds));
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// End of the last note, 0 for an empty timeline.
    pub fn total_duration(&self) -> f64 {
        self.notes
            .last()
            .map_or(0.0, |last| last.onset_seconds + last.duration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_orders_by_onset_and_keeps_ties_stable() {
        let timeline = NoteTimeline::from_notes(vec![
            Note::new(2.0, 60, 0.5),
            Note::new(1.0, 62, 0.25),
            Note::new(2.0, 64, 0.5),
            Note::new(0.5, 65, 0.1),
        ])
        .unwrap();

        let pitches: Vec<i32> = timeline.notes().iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![65, 62, 60, 64]);
        assert!(timeline
            .notes()
            .windows(2)
            .all(|w| w[0].onset_seconds <= w[1].onset_seconds));
    }

    #[test]
    fn test_total_duration_uses_last_note() {
        let timeline = NoteTimeline::from_notes(vec![Note::new(3.0, 60, 0.75), Note::new(1.0, 60, 5.0)]).unwrap();
        assert_eq!(timeline.total_duration(), 3.75);
        assert_eq!(timeline.len(), 2);

        assert_eq!(NoteTimeline::default().total_duration(), 0.0);
    }

    #[test]
    fn test_rejects_invalid_notes() {
        let err = NoteTimeline::from_notes(vec![Note::new(1.0, 60, 0.1), Note::new(-1.0, 60, 0.1)]).unwrap_err();
        assert_eq!(err.source_id, "<memory>");
        assert!(matches!(err.cause, NoteSourceError::InvalidNote { index: 1, .. }));

        let err = NoteTimeline::from_notes(vec![Note::new(f64::NAN, 60, 0.1)]).unwrap_err();
        assert!(matches!(err.cause, NoteSourceError::InvalidNote { index: 0, .. }));
    }

    #[test]
    fn test_json_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"onset": 1.5, "pitch": 60, "duration": 0.25}}, {{"onset": 0.5, "pitch": 67}}]"#
        )
        .unwrap();

        let timeline = NoteTimeline::load(&JsonNoteSource::new(file.path())).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.get(0).unwrap().pitch, 67);
        assert_eq!(timeline.get(0).unwrap().duration_seconds, 0.0);
    }

    #[test]
    fn test_unreadable_and_malformed_sources_fail() {
        let missing = JsonNoteSource::new("/definitely/not/here.json");
        let err = NoteTimeline::load(&missing).unwrap_err();
        assert!(err.source_id.ends_with("here.json"));
        assert!(matches!(err.cause, NoteSourceError::Io(_)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = NoteTimeline::load(&JsonNoteSource::new(file.path())).unwrap_err();
        assert!(matches!(err.cause, NoteSourceError::Parse(_)));
        assert!(err.to_string().contains("failed to load note timeline"));
    }
}
