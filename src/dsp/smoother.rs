//! Parameter automation on the audio clock.
//!
//! [`ParamSmoother`] chases a target exponentially with a fixed time
//! constant. [`GainRamp`] is a scheduled linear ramp between two absolute
//! clock positions, used for crossfade lanes.

/// One-pole follower: each sample moves `1 - exp(-1 / (tau * sr))` of the
/// way toward the target.
#[derive(Debug, Clone)]
pub struct ParamSmoother {
    value: f64,
    target: f64,
    coef: f64,
}

impl ParamSmoother {
    pub fn new(initial: f64, time_constant: f64, sample_rate: f64) -> Self {
        let coef = if time_constant <= 0.0 {
            1.0
        } else {
            1.0 - (-1.0 / (time_constant * sample_rate)).exp()
        };
        Self {
            value: initial,
            target: initial,
            coef,
        }
    }

    pub fn set_target(&mut self, target: f64) {
        if target.is_finite() {
            self.target = target;
        }
    }

    /// Jump to a value without smoothing.
    pub fn reset(&mut self, value: f64) {
        self.value = value;
        self.target = value;
    }

    #[inline]
    pub fn next(&mut self) -> f64 {
        self.value += (self.target - self.value) * self.coef;
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn target(&self) -> f64 {
        self.target
    }
}

/// Linear gain automation between clock positions `start` and `end`.
///
/// Before `start` the gain is `from`; after `end` it holds `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRamp {
    from: f64,
    to: f64,
    start: u64,
    end: u64,
}

impl GainRamp {
    /// A constant gain.
    pub fn hold(value: f64) -> Self {
        Self {
            from: value,
            to: value,
            start: 0,
            end: 0,
        }
    }

    /// Ramp from the current value at `now` to `to` over `duration` samples.
    pub fn ramp_from(current: &GainRamp, now: u64, to: f64, duration: u64) -> Self {
        Self {
            from: current.value_at(now),
            to,
            start: now,
            end: now + duration,
        }
    }

    #[inline]
    pub fn value_at(&self, clock: u64) -> f64 {
        if clock >= self.end {
            self.to
        } else if clock <= self.start {
            self.from
        } else {
            let t = (clock - self.start) as f64 / (self.end - self.start) as f64;
            self.from + (self.to - self.from) * t
        }
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    /// Clock position at which the ramp reaches its target.
    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn is_settled(&self, clock: u64) -> bool {
        clock >= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoother_reaches_63_percent_after_one_time_constant() {
        let sr = 48000.0;
        let mut s = ParamSmoother::new(0.0, 0.010, sr);
        s.set_target(1.0);
        for _ in 0..480 {
            s.next();
        }
        assert!((s.value() - 0.632).abs() < 0.01, "got {}", s.value());
    }

    #[test]
    fn zero_time_constant_jumps() {
        let mut s = ParamSmoother::new(0.0, 0.0, 48000.0);
        s.set_target(0.7);
        assert_eq!(s.next(), 0.7);
    }

    #[test]
    fn non_finite_target_ignored() {
        let mut s = ParamSmoother::new(0.2, 0.01, 48000.0);
        s.set_target(f64::NAN);
        assert_eq!(s.target(), 0.2);
    }

    #[test]
    fn ramp_is_monotonic_and_ends_on_target() {
        let hold = GainRamp::hold(1.0);
        let ramp = GainRamp::ramp_from(&hold, 100, 0.0, 50);
        assert_eq!(ramp.value_at(90), 1.0);
        let mut prev = ramp.value_at(100);
        for clock in 101..=150 {
            let v = ramp.value_at(clock);
            assert!(v <= prev);
            prev = v;
        }
        assert_eq!(ramp.value_at(150), 0.0);
        assert!(ramp.is_settled(150));
        assert_eq!(ramp.end(), 150);
    }

    #[test]
    fn ramp_restarts_from_current_value() {
        let up = GainRamp::ramp_from(&GainRamp::hold(0.0), 0, 1.0, 100);
        let down = GainRamp::ramp_from(&up, 40, 0.0, 100);
        assert!((down.value_at(40) - 0.4).abs() < 1e-12);
        assert_eq!(down.target(), 0.0);
    }
}
