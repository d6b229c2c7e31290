//! Audio device abstraction
//!
//! The sound engine talks to its output through [`AudioDevice`]; devices are
//! opened through an [`AudioBackend`] so opening can fail (no audio support)
//! without the engine knowing which platform it runs on.

use std::fmt;

use crate::error::Result;
use crate::synth::{BusId, Voice};

/// Playback state of an opened device
///
/// Platforms may hand out devices suspended until a user gesture; resuming
/// a running device does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Suspended,
    Running,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::Suspended => write!(f, "Suspended"),
            DeviceState::Running => write!(f, "Running"),
        }
    }
}

/// Parameters a backend uses to open a device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSettings {
    pub sample_rate: u32,
    pub channels: usize,
    /// Open in the suspended state (autoplay policy)
    pub start_suspended: bool,
}

/// Output context owned by the sound engine
pub trait AudioDevice {
    fn state(&self) -> DeviceState;

    /// Transition Suspended -> Running; no-op when already running
    fn resume(&mut self) -> Result<()>;

    /// Device clock in seconds
    fn current_time(&self) -> f64;

    fn sample_rate(&self) -> u32;

    /// Create a shared gain bus routed to the final output
    fn create_bus(&mut self, gain: f32) -> BusId;

    /// Stop routing through `bus`; the device frees it once its voices end
    fn release_bus(&mut self, bus: BusId) -> Result<()>;

    /// Schedule a self-terminating voice
    fn submit(&mut self, voice: Voice);
}

/// Opens devices for the engine
pub trait AudioBackend {
    type Device: AudioDevice;

    fn open(&mut self, settings: &DeviceSettings) -> Result<Self::Device>;
}

/// Devices whose clock is driven by the caller instead of by hardware
pub trait RenderClock {
    /// Render (or skip) up to absolute device time `time`
    fn advance_to(&mut self, time: f64);
}
