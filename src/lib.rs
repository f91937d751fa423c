//! Rhythm-synchronized procedural spawning.
//!
//! A [`RhythmSession`] is ticked once per frame with a playback clock, band
//! energy from the playing track and the player/camera state. It answers with
//! the pickups and hazards to create and the entities to destroy.

pub mod audio;
pub mod config;
pub mod notes;
pub mod session;
pub mod spawn;

pub use config::{ConfigError, PickupSource, SpawnerConfig};
pub use notes::{JsonNoteSource, Note, NoteTimeline};
pub use session::{RhythmSession, SessionStats, TickInputs, TickOutput};
pub use spawn::{EntityId, SpawnDecision, SpawnKind, TrackedSpawn};
