//! Voice requests
//!
//! A voice is a self-contained scheduling request: once submitted to a
//! device it is never referenced again and stops itself at its stop time.

use std::fmt;
use std::sync::Arc;

use crate::engine::AudioBuffer;
use crate::synth::{Automation, Waveform};

/// Handle of a shared gain bus on a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusId(pub u64);

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus#{}", self.0)
    }
}

/// Where a voice (or bus) sends its signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Output {
    /// Straight to the device's final output
    #[default]
    Destination,
    /// Through a shared gain bus
    Bus(BusId),
}

/// Oscillator voice
#[derive(Debug, Clone, PartialEq)]
pub struct ToneVoice {
    pub waveform: Waveform,
    pub frequency: Automation,
    pub gain: Automation,
    /// Absolute device time the oscillator starts
    pub start: f64,
    /// Absolute device time the oscillator stops
    pub stop: f64,
    pub output: Output,
}

impl ToneVoice {
    /// Fixed-pitch oscillator with a unity gain envelope
    pub fn new(waveform: Waveform, frequency: f64, start: f64, stop: f64) -> Self {
        Self {
            waveform,
            frequency: Automation::constant(frequency),
            gain: Automation::constant(1.0),
            start,
            stop,
            output: Output::Destination,
        }
    }

    pub fn with_frequency(mut self, frequency: Automation) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_gain(mut self, gain: Automation) -> Self {
        self.gain = gain;
        self
    }

    pub fn routed_to(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn duration(&self) -> f64 {
        (self.stop - self.start).max(0.0)
    }
}

/// Playback of a decoded sample, start to end
#[derive(Debug, Clone)]
pub struct SampleVoice {
    /// Library name the buffer was bound under
    pub name: String,
    pub buffer: Arc<AudioBuffer>,
    pub start: f64,
    pub output: Output,
}

impl SampleVoice {
    /// Absolute device time the sample runs out
    pub fn stop(&self) -> f64 {
        self.start + self.buffer.duration_secs()
    }
}

/// Anything a device can play
#[derive(Debug, Clone)]
pub enum Voice {
    Tone(ToneVoice),
    Sample(SampleVoice),
}

impl Voice {
    pub fn start(&self) -> f64 {
        match self {
            Voice::Tone(tone) => tone.start,
            Voice::Sample(sample) => sample.start,
        }
    }

    pub fn stop(&self) -> f64 {
        match self {
            Voice::Tone(tone) => tone.stop,
            Voice::Sample(sample) => sample.stop(),
        }
    }

    pub fn output(&self) -> Output {
        match self {
            Voice::Tone(tone) => tone.output,
            Voice::Sample(sample) => sample.output,
        }
    }

    pub fn as_tone(&self) -> Option<&ToneVoice> {
        match self {
            Voice::Tone(tone) => Some(tone),
            Voice::Sample(_) => None,
        }
    }

    pub fn as_sample(&self) -> Option<&SampleVoice> {
        match self {
            Voice::Sample(sample) => Some(sample),
            Voice::Tone(_) => None,
        }
    }
}

impl From<ToneVoice> for Voice {
    fn from(tone: ToneVoice) -> Self {
        Voice::Tone(tone)
    }
}

impl From<SampleVoice> for Voice {
    fn from(sample: SampleVoice) -> Self {
        Voice::Sample(sample)
    }
}
