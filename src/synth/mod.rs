//! Synthesis
//!
//! Oscillator waveforms, parameter automation, voice requests, the fixed
//! game gestures and the mixer that renders them.

mod automation;
mod mixer;
pub mod patterns;
mod voice;
mod waveform;

pub use automation::{Automation, AutomationEvent, Ramp};
pub use mixer::{BusState, Mixer};
pub use voice::{BusId, Output, SampleVoice, ToneVoice, Voice};
pub use waveform::{Phase, Waveform};
