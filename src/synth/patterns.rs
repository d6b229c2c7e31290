//! Fixed musical gestures
//!
//! Each function builds the voices of one gesture relative to a single
//! reference time `t0`, so the relative timing inside a gesture does not
//! depend on when the caller runs.

use crate::synth::{Automation, Output, ToneVoice, Waveform};

/// Near-silence used as the floor of every envelope
pub const SILENT: f64 = 0.0001;

/// Metronome tick pitch
pub const CLICK_FREQUENCY: f64 = 800.0;

/// A4, C5, E5
pub const ARPEGGIO_FREQUENCIES: [f64; 3] = [440.0, 523.25, 659.25];

/// Seconds between arpeggio note onsets
pub const ARPEGGIO_STAGGER: f64 = 0.04;

pub const SWEEP_START_FREQUENCY: f64 = 440.0;

pub const SPARKLE_FREQUENCIES: [f64; 3] = [880.0, 1320.0, 1760.0];

/// Offset of the first sparkle onset from `t0`
pub const SPARKLE_OFFSET: f64 = 0.08;

pub const SPARKLE_STAGGER: f64 = 0.06;

/// Length of the whole fanfare
pub const FANFARE_LENGTH: f64 = 1.0;

/// Square-wave tick: 10 ms attack, exponential decay by 180 ms
pub fn click(t0: f64, output: Output) -> ToneVoice {
    let gain = Automation::constant(1.0)
        .set_at(SILENT, t0)
        .exponential_to(0.3, t0 + 0.01)
        .exponential_to(SILENT, t0 + 0.18);

    ToneVoice::new(Waveform::Square, CLICK_FREQUENCY, t0, t0 + 0.2)
        .with_gain(gain)
        .routed_to(output)
}

/// Three staggered sine notes, each swelling over 60 ms and fading by 500 ms
pub fn arpeggio(t0: f64, output: Output) -> Vec<ToneVoice> {
    ARPEGGIO_FREQUENCIES
        .iter()
        .enumerate()
        .map(|(i, &frequency)| {
            let t = t0 + i as f64 * ARPEGGIO_STAGGER;
            let gain = Automation::constant(0.0)
                .set_at(SILENT, t)
                .linear_to(0.08, t + 0.06)
                .linear_to(SILENT, t + 0.5);

            ToneVoice::new(Waveform::Sine, frequency, t, t + 0.6)
                .with_gain(gain)
                .routed_to(output)
        })
        .collect()
}

/// One repetition of the background loop: click plus arpeggio
pub fn background_pattern(t0: f64, output: Output) -> Vec<ToneVoice> {
    let mut voices = arpeggio(t0, output);
    voices.push(click(t0, output));
    voices
}

/// Sawtooth glide from 440 Hz to four times that over 0.6 s
pub fn rising_sweep(t0: f64, output: Output) -> ToneVoice {
    let frequency = Automation::constant(SWEEP_START_FREQUENCY)
        .set_at(SWEEP_START_FREQUENCY, t0)
        .exponential_to(SWEEP_START_FREQUENCY * 4.0, t0 + 0.6);
    let gain = Automation::constant(1.0)
        .set_at(SILENT, t0)
        .exponential_to(0.5, t0 + 0.08)
        .exponential_to(SILENT, t0 + 0.9);

    ToneVoice::new(Waveform::Sawtooth, SWEEP_START_FREQUENCY, t0, t0 + FANFARE_LENGTH)
        .with_frequency(frequency)
        .with_gain(gain)
        .routed_to(output)
}

/// Triangle chimes with staggered onsets that all end together
pub fn sparkle(t0: f64, output: Output) -> Vec<ToneVoice> {
    SPARKLE_FREQUENCIES
        .iter()
        .enumerate()
        .map(|(i, &frequency)| {
            let onset = t0 + SPARKLE_OFFSET + i as f64 * SPARKLE_STAGGER;
            let pitch = Automation::constant(frequency).set_at(frequency, onset);
            let gain = Automation::constant(1.0)
                .set_at(SILENT, t0)
                .linear_to(0.25, t0 + 0.12 + i as f64 * SPARKLE_STAGGER)
                .exponential_to(SILENT, t0 + FANFARE_LENGTH);

            ToneVoice::new(Waveform::Triangle, frequency, onset, t0 + FANFARE_LENGTH)
                .with_frequency(pitch)
                .with_gain(gain)
                .routed_to(output)
        })
        .collect()
}

/// The whole win fanfare: sweep first, then the sparkle layer
pub fn win_fanfare(t0: f64, output: Output) -> Vec<ToneVoice> {
    let mut voices = vec![rising_sweep(t0, output)];
    voices.extend(sparkle(t0, output));
    voices
}
