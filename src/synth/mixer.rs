//! Voice mixer
//!
//! Renders submitted voices frame by frame, summing them through their gain
//! buses into an interleaved output block. The mixer clock is the device
//! clock: it advances only as frames are rendered (or skipped).

use std::collections::BTreeMap;

use crate::error::{Result, SoundError};
use crate::synth::{BusId, Output, Phase, Voice};

/// State of one gain bus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusState {
    pub gain: f32,
    /// Released buses accept no new routing and are freed once idle
    pub released: bool,
}

#[derive(Debug, Clone)]
struct ActiveVoice {
    voice: Voice,
    phase: Phase,
    start_frame: u64,
    stop_frame: u64,
}

/// Sums voices into interleaved frames
#[derive(Debug, Clone)]
pub struct Mixer {
    sample_rate: u32,
    channels: usize,
    frame: u64,
    voices: Vec<ActiveVoice>,
    buses: BTreeMap<BusId, BusState>,
    next_bus: u64,
}

impl Mixer {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        Self {
            sample_rate,
            channels: channels.max(1),
            frame: 0,
            voices: Vec::new(),
            buses: BTreeMap::new(),
            next_bus: 1,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Frames rendered so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Mixer clock in seconds
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    fn to_frame(&self, time: f64) -> u64 {
        (time.max(0.0) * self.sample_rate as f64).round() as u64
    }

    pub fn create_bus(&mut self, gain: f32) -> BusId {
        let id = BusId(self.next_bus);
        self.next_bus += 1;
        self.buses.insert(
            id,
            BusState {
                gain,
                released: false,
            },
        );
        id
    }

    /// Mark a bus released; it is dropped once no voice plays through it
    pub fn release_bus(&mut self, bus: BusId) -> Result<()> {
        match self.buses.get_mut(&bus) {
            Some(state) if !state.released => {
                state.released = true;
                self.collect_buses();
                Ok(())
            }
            _ => Err(SoundError::UnknownBus { bus: bus.0 }),
        }
    }

    pub fn bus(&self, bus: BusId) -> Option<&BusState> {
        self.buses.get(&bus)
    }

    /// Buses not yet freed (released ones with voices still count)
    pub fn live_bus_count(&self) -> usize {
        self.buses.len()
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Queue a voice. Voices routed to an unknown bus are dropped.
    pub fn submit(&mut self, voice: Voice) {
        if let Output::Bus(bus) = voice.output() {
            if !self.buses.contains_key(&bus) {
                log::warn!("Dropping voice routed to unknown {}", bus);
                return;
            }
        }

        let start_frame = self.to_frame(voice.start());
        let stop_frame = self.to_frame(voice.stop());
        if stop_frame <= self.frame || stop_frame <= start_frame {
            return;
        }

        self.voices.push(ActiveVoice {
            voice,
            phase: Phase::default(),
            start_frame,
            stop_frame,
        });
    }

    /// Render interleaved frames into `out` and advance the clock
    pub fn render(&mut self, out: &mut [f32]) {
        let sample_rate = self.sample_rate as f64;

        for frame_out in out.chunks_mut(self.channels) {
            frame_out.fill(0.0);
            let frame = self.frame;
            let t = frame as f64 / sample_rate;

            for active in &mut self.voices {
                if frame < active.start_frame || frame >= active.stop_frame {
                    continue;
                }

                let bus_gain = match active.voice.output() {
                    Output::Destination => 1.0,
                    Output::Bus(bus) => self.buses.get(&bus).map(|b| b.gain).unwrap_or(0.0),
                };

                match &active.voice {
                    Voice::Tone(tone) => {
                        let phase = active.phase.advance(tone.frequency.value_at(t), sample_rate);
                        let value =
                            tone.waveform.sample(phase) * tone.gain.value_at(t) as f32 * bus_gain;
                        for sample in frame_out.iter_mut() {
                            *sample += value;
                        }
                    }
                    Voice::Sample(sample_voice) => {
                        let index = (frame - active.start_frame) as usize;
                        for (ch, sample) in frame_out.iter_mut().enumerate() {
                            *sample += sample_voice.buffer.frame_value(ch, index) * bus_gain;
                        }
                    }
                }
            }

            self.frame += 1;
        }

        self.retire_finished();
    }

    /// Advance the clock without producing output
    pub fn skip(&mut self, frames: u64) {
        self.frame += frames;
        self.retire_finished();
    }

    fn retire_finished(&mut self) {
        let now = self.frame;
        self.voices.retain(|active| active.stop_frame > now);
        self.collect_buses();
    }

    fn collect_buses(&mut self) {
        let voices = &self.voices;
        self.buses.retain(|id, state| {
            !state.released
                || voices
                    .iter()
                    .any(|active| active.voice.output() == Output::Bus(*id))
        });
    }
}
