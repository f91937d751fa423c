pub mod timeline;

pub use timeline::{JsonNoteSource, Note, NoteSource, NoteSourceError, NoteTimeline, TimelineLoadError};
