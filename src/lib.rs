//! Hairgame Sound - audio for the "give the bald man hair" minigame
//!
//! The game layer drives a single [`SoundEngine`](sfx::SoundEngine):
//! one-shot sample playback, a procedurally synthesized background loop and
//! a synthesized win fanfare. Audio is decorative, so no engine operation
//! ever fails from the caller's point of view.
//!
//! # Architecture
//!
//! - `synth`: waveforms, automation, voice requests, fixed gestures, mixer
//! - `engine`: buffers, the device seam, timers, decode/export
//! - `sfx`: the sound engine and its sample handling

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod sfx;
pub mod synth;

pub use config::EngineConfig;
pub use error::{Diagnostic, ErrorCategory, Result, SoundError};
pub use sfx::{GameCue, SoundEngine};
