//! Background loop state

use crate::engine::TimerId;
use crate::synth::BusId;

/// The single running background loop
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundLoop {
    /// Repeating timer driving the pattern
    pub timer: TimerId,
    /// Shared bus every pattern voice plays through
    pub bus: BusId,
    pub bpm: f64,
    /// Device times at which the pattern fired
    pub fired_at: Vec<f64>,
}

impl BackgroundLoop {
    pub fn new(timer: TimerId, bus: BusId, bpm: f64) -> Self {
        Self {
            timer,
            bus,
            bpm,
            fired_at: Vec::new(),
        }
    }

    /// Beat period in milliseconds
    pub fn beat_period_ms(&self) -> f64 {
        beat_period_ms(self.bpm)
    }

    pub fn repetitions(&self) -> usize {
        self.fired_at.len()
    }
}

/// `60000 / bpm`
pub fn beat_period_ms(bpm: f64) -> f64 {
    60_000.0 / bpm
}
