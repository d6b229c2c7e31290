//! Real-time output through cpal
//!
//! The mixer is shared with the audio callback; the engine thread submits
//! voices and reads the clock through the same lock. Suspend/resume map to
//! pausing and playing the output stream.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;

use crate::engine::device::{AudioBackend, AudioDevice, DeviceSettings, DeviceState};
use crate::error::{Result, SoundError};
use crate::synth::{BusId, Mixer, Voice};

/// Device playing through the default system output
pub struct CpalDevice {
    stream: cpal::Stream,
    mixer: Arc<Mutex<Mixer>>,
    state: DeviceState,
}

impl AudioDevice for CpalDevice {
    fn state(&self) -> DeviceState {
        self.state
    }

    fn resume(&mut self) -> Result<()> {
        if self.state == DeviceState::Running {
            return Ok(());
        }
        self.stream.play().map_err(|e| SoundError::DeviceError {
            reason: format!("failed to resume output stream: {}", e),
        })?;
        self.state = DeviceState::Running;
        log::info!("Output stream resumed");
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.mixer.lock().current_time()
    }

    fn sample_rate(&self) -> u32 {
        self.mixer.lock().sample_rate()
    }

    fn create_bus(&mut self, gain: f32) -> BusId {
        self.mixer.lock().create_bus(gain)
    }

    fn release_bus(&mut self, bus: BusId) -> Result<()> {
        self.mixer.lock().release_bus(bus)
    }

    fn submit(&mut self, voice: Voice) {
        self.mixer.lock().submit(voice);
    }
}

/// Backend opening the host's default output device
#[derive(Debug, Default)]
pub struct CpalBackend;

impl AudioBackend for CpalBackend {
    type Device = CpalDevice;

    fn open(&mut self, settings: &DeviceSettings) -> Result<CpalDevice> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| SoundError::DeviceUnavailable {
                reason: "no default output device found".to_string(),
            })?;

        let supported = device
            .default_output_config()
            .map_err(|e| SoundError::DeviceUnavailable {
                reason: format!("failed to get default config: {}", e),
            })?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(SoundError::UnsupportedFormat {
                format: format!("{:?} output samples", supported.sample_format()),
            });
        }

        let config: cpal::StreamConfig = supported.into();
        let channels = config.channels as usize;
        let sample_rate = config.sample_rate.0;
        if sample_rate != settings.sample_rate {
            log::info!(
                "Output device runs at {} Hz instead of configured {} Hz",
                sample_rate,
                settings.sample_rate
            );
        }

        let mixer = Arc::new(Mutex::new(Mixer::new(sample_rate, channels)));
        let render_mixer = Arc::clone(&mixer);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    render_mixer.lock().render(data);
                },
                |err| log::error!("Output stream error: {}", err),
                None,
            )
            .map_err(|e| SoundError::DeviceUnavailable {
                reason: format!("failed to build output stream: {}", e),
            })?;

        let state = if settings.start_suspended {
            // Some hosts start streams immediately
            if let Err(e) = stream.pause() {
                log::debug!("Could not pause fresh output stream: {}", e);
            }
            DeviceState::Suspended
        } else {
            stream.play().map_err(|e| SoundError::DeviceError {
                reason: format!("failed to start output stream: {}", e),
            })?;
            DeviceState::Running
        };

        log::info!(
            "Opened output device: {} Hz, {} channels, {}",
            sample_rate,
            channels,
            state
        );

        Ok(CpalDevice {
            stream,
            mixer,
            state,
        })
    }
}
