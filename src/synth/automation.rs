//! Parameter automation
//!
//! Breakpoint timelines for a voice's gain (envelope) and frequency (pitch
//! glide). Semantics follow the usual audio-parameter model: a `Set` event
//! jumps to its value at its time; a ramp event interpolates from the
//! previous event's (time, value) to its own (time, value).

/// Curve shape of one automation event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ramp {
    /// Jump to the value at the event time
    Set,
    /// Linear interpolation from the previous event
    Linear,
    /// Exponential interpolation from the previous event
    Exponential,
}

/// One breakpoint on an automation timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutomationEvent {
    pub ramp: Ramp,
    pub value: f64,
    /// Absolute device time in seconds
    pub time: f64,
}

/// Time-varying parameter value
#[derive(Debug, Clone, PartialEq)]
pub struct Automation {
    default_value: f64,
    events: Vec<AutomationEvent>,
}

impl Automation {
    /// A constant parameter
    pub fn constant(value: f64) -> Self {
        Self {
            default_value: value,
            events: Vec::new(),
        }
    }

    pub fn set_at(mut self, value: f64, time: f64) -> Self {
        self.push(Ramp::Set, value, time);
        self
    }

    pub fn linear_to(mut self, value: f64, time: f64) -> Self {
        self.push(Ramp::Linear, value, time);
        self
    }

    pub fn exponential_to(mut self, value: f64, time: f64) -> Self {
        self.push(Ramp::Exponential, value, time);
        self
    }

    fn push(&mut self, ramp: Ramp, value: f64, time: f64) {
        // Equal times keep insertion order
        let index = self.events.partition_point(|e| e.time <= time);
        self.events.insert(index, AutomationEvent { ramp, value, time });
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Time of the last breakpoint, if any
    pub fn end_time(&self) -> Option<f64> {
        self.events.last().map(|e| e.time)
    }

    /// Largest value the parameter ever takes
    pub fn peak(&self) -> f64 {
        self.events
            .iter()
            .map(|e| e.value)
            .fold(self.default_value, f64::max)
    }

    /// Parameter value at absolute time `t`
    pub fn value_at(&self, t: f64) -> f64 {
        let next_index = self.events.partition_point(|e| e.time <= t);

        let (prev_time, prev_value) = match next_index.checked_sub(1) {
            Some(i) => (self.events[i].time, self.events[i].value),
            None => (0.0, self.default_value),
        };

        match self.events.get(next_index) {
            Some(next) if next.ramp != Ramp::Set => {
                interpolate(next.ramp, prev_time, prev_value, next.time, next.value, t)
            }
            _ => prev_value,
        }
    }
}

fn interpolate(ramp: Ramp, t0: f64, v0: f64, t1: f64, v1: f64, t: f64) -> f64 {
    let span = t1 - t0;
    if span <= 0.0 {
        return v1;
    }
    let frac = ((t - t0) / span).clamp(0.0, 1.0);
    match ramp {
        Ramp::Set => v0,
        Ramp::Linear => v0 + (v1 - v0) * frac,
        Ramp::Exponential => {
            // Undefined across zero or a sign change: hold the start value
            if v0 == 0.0 || v1 == 0.0 || (v0 < 0.0) != (v1 < 0.0) {
                v0
            } else {
                v0 * (v1 / v0).powf(frac)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn envelope() -> Automation {
        Automation::constant(0.0)
            .set_at(0.0001, 1.0)
            .linear_to(0.08, 1.06)
            .linear_to(0.0001, 1.5)
    }

    #[test_case(0.5, 0.0 ; "before first event uses default")]
    #[test_case(1.0, 0.0001 ; "at set event")]
    #[test_case(1.06, 0.08 ; "at linear peak")]
    #[test_case(1.5, 0.0001 ; "at release end")]
    #[test_case(3.0, 0.0001 ; "holds after last event")]
    fn test_linear_envelope(t: f64, expected: f64) {
        assert_relative_eq!(envelope().value_at(t), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_linear_midpoint() {
        let value = envelope().value_at(1.03);
        assert_relative_eq!(value, (0.0001 + 0.08) / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_exponential_glide_doubles_per_step() {
        let pitch = Automation::constant(440.0)
            .set_at(440.0, 0.0)
            .exponential_to(1760.0, 0.6);
        assert_relative_eq!(pitch.value_at(0.3), 880.0, epsilon = 1e-6);
        assert_relative_eq!(pitch.value_at(0.6), 1760.0, epsilon = 1e-6);
        assert_relative_eq!(pitch.value_at(5.0), 1760.0, epsilon = 1e-6);
    }

    #[test]
    fn test_exponential_from_zero_holds() {
        let gain = Automation::constant(0.0)
            .set_at(0.0, 0.0)
            .exponential_to(1.0, 1.0);
        assert_eq!(gain.value_at(0.5), 0.0);
    }

    #[test]
    fn test_events_sorted_by_time() {
        let gain = Automation::constant(0.0)
            .exponential_to(0.0001, 1.0)
            .set_at(0.0001, 0.0)
            .linear_to(0.25, 0.12);
        let times: Vec<f64> = gain.events().iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0.0, 0.12, 1.0]);
        assert_eq!(gain.end_time(), Some(1.0));
        assert_relative_eq!(gain.peak(), 0.25);
    }
}
