//! Fixed oscillator waveforms

use std::f64::consts::TAU;
use std::fmt;

/// Oscillator timbre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Value of the waveform at `phase` (in cycles, wrapped to [0, 1))
    pub fn sample(&self, phase: f64) -> f32 {
        let p = phase.rem_euclid(1.0);
        let value = match self {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * p - 1.0,
            Waveform::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
        };
        value as f32
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Waveform::Sine => write!(f, "sine"),
            Waveform::Square => write!(f, "square"),
            Waveform::Sawtooth => write!(f, "sawtooth"),
            Waveform::Triangle => write!(f, "triangle"),
        }
    }
}

/// Phase accumulator for one oscillator voice
#[derive(Debug, Clone, Copy, Default)]
pub struct Phase {
    cycles: f64,
}

impl Phase {
    /// Return the current phase, then advance by one sample at `frequency`
    #[inline]
    pub fn advance(&mut self, frequency: f64, sample_rate: f64) -> f64 {
        let current = self.cycles;
        self.cycles = (self.cycles + frequency / sample_rate).fract();
        current
    }
}
