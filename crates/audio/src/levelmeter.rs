//! Running level meter.

/// RMS level over a sliding window, reported in dB SPL.
#[derive(Debug, Clone)]
pub struct LevelMeter {
    ring: Vec<f32>,
    pos: usize,
    filled: usize,
}

impl LevelMeter {
    /// Meter with a window of `tc` seconds at sample rate `fs`.
    pub fn new(fs: f64, tc: f64) -> Self {
        let n = (fs * tc).round().max(1.0) as usize;
        Self {
            ring: vec![0.0; n],
            pos: 0,
            filled: 0,
        }
    }

    /// Feed samples.
    pub fn update(&mut self, x: &[f32]) {
        for v in x {
            self.ring[self.pos] = *v;
            self.pos = (self.pos + 1) % self.ring.len();
        }
        self.filled = (self.filled + x.len()).min(self.ring.len());
    }

    /// RMS over the samples seen so far, at most one window.
    pub fn rms(&self) -> f32 {
        if self.filled == 0 {
            return 0.0;
        }
        let sum: f32 = self.ring.iter().map(|v| v * v).sum();
        (sum / self.filled as f32).sqrt()
    }

    /// RMS level in dB SPL.
    pub fn spldb(&self) -> f32 {
        20.0 * (self.rms() / 2e-5).log10()
    }

    /// Peak absolute value in the window.
    pub fn peak(&self) -> f32 {
        self.ring.iter().fold(0.0, |m, v| m.max(v.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_forgets_old_samples() {
        let mut m = LevelMeter::new(4.0, 1.0);
        m.update(&[10.0; 4]);
        m.update(&[1.0; 4]);
        assert_eq!(m.rms(), 1.0);
        assert_eq!(m.peak(), 1.0);
    }

    #[test]
    fn partial_window_averages_seen_samples() {
        let mut m = LevelMeter::new(100.0, 1.0);
        m.update(&[2.0, 2.0]);
        assert_eq!(m.rms(), 2.0);
        assert!(LevelMeter::new(10.0, 1.0).spldb().is_infinite());
    }
}
