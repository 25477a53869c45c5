//! Feedback delay stage.
//!
//! Sits in the hand's effects chain with its wet level at zero; the delay
//! time and feedback still track the hand so the stage can be opened up
//! without re-plumbing the graph.

/// Shortest delay time in seconds (normalized 0.0).
const MIN_DELAY: f64 = 0.05;

/// A mono delay line with feedback and dry/wet mix.
#[derive(Debug, Clone)]
pub struct Delay {
    buffer: Vec<f32>,
    write_pos: usize,
    sample_rate: f64,
    max_delay: f64,

    /// Delay time in seconds.
    pub delay_time: f64,
    /// Feedback amount, kept below 1.0.
    pub feedback: f64,
    /// Dry/wet mix (0.0 = fully dry).
    pub mix: f64,
}

impl Delay {
    pub fn new(sample_rate: f64, max_delay_seconds: f64) -> Self {
        let buffer_size = (sample_rate * max_delay_seconds) as usize + 1;
        Self {
            buffer: vec![0.0; buffer_size],
            write_pos: 0,
            sample_rate,
            max_delay: max_delay_seconds,
            delay_time: MIN_DELAY,
            feedback: 0.0,
            mix: 0.0,
        }
    }

    /// Apply normalized hand parameters: time and feedback in [0, 1].
    pub fn set_normalized(&mut self, time: f64, feedback: f64) {
        let time = time.clamp(0.0, 1.0);
        self.delay_time = MIN_DELAY + time * (self.max_delay - MIN_DELAY);
        self.feedback = feedback.clamp(0.0, 0.95);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let buffer_len = self.buffer.len();
        let delay_samples = ((self.delay_time * self.sample_rate) as usize).clamp(1, buffer_len - 1);
        let read_pos = (self.write_pos + buffer_len - delay_samples) % buffer_len;

        let delayed = self.buffer[read_pos];
        self.buffer[self.write_pos] = input + delayed * self.feedback as f32;
        self.write_pos = (self.write_pos + 1) % buffer_len;

        let mix = self.mix as f32;
        input * (1.0 - mix) + delayed * mix
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bypassed_by_default() {
        let mut delay = Delay::new(44100.0, 1.0);
        delay.set_normalized(1.0, 0.9);
        for i in 0..5000 {
            let x = if i % 300 == 0 { 1.0 } else { 0.0 };
            assert_eq!(delay.process(x), x);
        }
    }

    #[test]
    fn wet_output_is_delayed_with_feedback() {
        let mut delay = Delay::new(1000.0, 1.0);
        delay.delay_time = 0.01;
        delay.feedback = 0.5;
        delay.mix = 1.0;

        assert_eq!(delay.process(1.0), 0.0);
        for _ in 1..10 {
            assert_eq!(delay.process(0.0), 0.0);
        }
        assert!((delay.process(0.0) - 1.0).abs() < 1e-6);
        for _ in 1..10 {
            delay.process(0.0);
        }
        assert!((delay.process(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn normalized_mapping() {
        let mut delay = Delay::new(44100.0, 0.8);
        delay.set_normalized(0.0, 2.0);
        assert!((delay.delay_time - MIN_DELAY).abs() < 1e-12);
        assert_eq!(delay.feedback, 0.95);
        delay.set_normalized(1.0, 0.3);
        assert!((delay.delay_time - 0.8).abs() < 1e-12);
    }
}
