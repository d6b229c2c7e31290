//! Audio Engine Module
//!
//! Output-side plumbing for the sound layer:
//! - Audio buffer management
//! - Device abstraction, offline rendering device and (with the
//!   `playback` feature) real-time output
//! - Repeating timers on the device clock
//! - Sample decoding and WAV export

pub mod buffer;
pub mod device;
pub mod io;
pub mod offline;
#[cfg(feature = "playback")]
pub mod realtime;
pub mod scheduler;

pub use buffer::{AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE};
pub use device::{AudioBackend, AudioDevice, DeviceSettings, DeviceState, RenderClock};
pub use io::{decode_sample, encode_wav_bytes, export_wav, ExportFormat};
pub use offline::{OfflineBackend, OfflineDevice};
#[cfg(feature = "playback")]
pub use realtime::{CpalBackend, CpalDevice};
pub use scheduler::{Firing, TimerId, TimerQueue};
