//! Game Sound Effects
//!
//! The sound engine the minigame talks to, with its sample library,
//! background loading, background-loop state and cue mapping.

pub mod background;
mod cues;
mod engine;
mod library;
pub mod loader;

pub use background::BackgroundLoop;
pub use cues::{CueMap, GameCue};
pub use engine::SoundEngine;
pub use library::SampleLibrary;
pub use loader::{FileSource, MemorySource, SampleSource};
