//! Offline rendering device
//!
//! Renders the mix into an in-memory [`AudioBuffer`] as its clock is
//! advanced. Every voice and bus handed to the device is recorded, so the
//! output graph can be inspected after the fact.

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::engine::device::{AudioBackend, AudioDevice, DeviceSettings, DeviceState, RenderClock};
use crate::error::{Result, SoundError};
use crate::synth::{BusId, Mixer, Voice};

/// Frames rendered per mixer call
const RENDER_BLOCK_FRAMES: usize = 1024;

/// Caller-clocked device that records its output
#[derive(Debug)]
pub struct OfflineDevice {
    mixer: Mixer,
    state: DeviceState,
    output: AudioBuffer,
    submitted: Vec<Voice>,
    buses: Vec<(BusId, f32)>,
    resume_count: usize,
}

impl OfflineDevice {
    pub fn new(settings: &DeviceSettings) -> Result<Self> {
        let layout = ChannelLayout::from_count(settings.channels).ok_or_else(|| {
            SoundError::UnsupportedFormat {
                format: format!("{}-channel output", settings.channels),
            }
        })?;
        if settings.sample_rate == 0 {
            return Err(SoundError::DeviceUnavailable {
                reason: "sample rate must be positive".to_string(),
            });
        }

        Ok(Self {
            mixer: Mixer::new(settings.sample_rate, layout.num_channels()),
            state: if settings.start_suspended {
                DeviceState::Suspended
            } else {
                DeviceState::Running
            },
            output: AudioBuffer::new(0, layout, settings.sample_rate),
            submitted: Vec::new(),
            buses: Vec::new(),
            resume_count: 0,
        })
    }

    /// Everything rendered so far (silence while suspended)
    pub fn output(&self) -> &AudioBuffer {
        &self.output
    }

    /// Hand over the rendered output, leaving an empty buffer behind
    pub fn take_output(&mut self) -> AudioBuffer {
        let layout = ChannelLayout::from_count(self.mixer.channels()).unwrap_or_default();
        let empty = AudioBuffer::new(0, layout, self.mixer.sample_rate());
        std::mem::replace(&mut self.output, empty)
    }

    /// Every voice ever submitted, in submission order
    pub fn submitted(&self) -> &[Voice] {
        &self.submitted
    }

    /// Every bus ever created with its gain, in creation order
    pub fn buses_created(&self) -> &[(BusId, f32)] {
        &self.buses
    }

    /// Buses the mixer still holds
    pub fn live_bus_count(&self) -> usize {
        self.mixer.live_bus_count()
    }

    pub fn is_bus_released(&self, bus: BusId) -> bool {
        self.mixer.bus(bus).map(|b| b.released).unwrap_or(true)
    }

    pub fn active_voice_count(&self) -> usize {
        self.mixer.active_voice_count()
    }

    /// Number of Suspended -> Running transitions
    pub fn resume_count(&self) -> usize {
        self.resume_count
    }
}

impl AudioDevice for OfflineDevice {
    fn state(&self) -> DeviceState {
        self.state
    }

    fn resume(&mut self) -> Result<()> {
        if self.state == DeviceState::Suspended {
            self.state = DeviceState::Running;
            self.resume_count += 1;
            log::debug!("Offline device resumed at {:.3}s", self.current_time());
        }
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.mixer.current_time()
    }

    fn sample_rate(&self) -> u32 {
        self.mixer.sample_rate()
    }

    fn create_bus(&mut self, gain: f32) -> BusId {
        let bus = self.mixer.create_bus(gain);
        self.buses.push((bus, gain));
        bus
    }

    fn release_bus(&mut self, bus: BusId) -> Result<()> {
        self.mixer.release_bus(bus)
    }

    fn submit(&mut self, voice: Voice) {
        self.submitted.push(voice.clone());
        self.mixer.submit(voice);
    }
}

impl RenderClock for OfflineDevice {
    fn advance_to(&mut self, time: f64) {
        let target = (time.max(0.0) * self.mixer.sample_rate() as f64).round() as u64;
        let channels = self.mixer.channels();
        let mut remaining = target.saturating_sub(self.mixer.frame()) as usize;
        let mut block = vec![0.0_f32; RENDER_BLOCK_FRAMES * channels];

        while remaining > 0 {
            let frames = remaining.min(RENDER_BLOCK_FRAMES);
            let chunk = &mut block[..frames * channels];
            match self.state {
                DeviceState::Running => self.mixer.render(chunk),
                DeviceState::Suspended => {
                    chunk.fill(0.0);
                    self.mixer.skip(frames as u64);
                }
            }
            self.output.append_interleaved(chunk, channels);
            remaining -= frames;
        }
    }
}

/// Backend producing [`OfflineDevice`]s
#[derive(Debug, Default)]
pub struct OfflineBackend {
    opened: usize,
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many devices this backend has opened
    pub fn opened(&self) -> usize {
        self.opened
    }
}

impl AudioBackend for OfflineBackend {
    type Device = OfflineDevice;

    fn open(&mut self, settings: &DeviceSettings) -> Result<OfflineDevice> {
        let device = OfflineDevice::new(settings)?;
        self.opened += 1;
        log::info!(
            "Opened offline device: {} Hz, {} channels, {}",
            settings.sample_rate,
            settings.channels,
            device.state()
        );
        Ok(device)
    }
}
