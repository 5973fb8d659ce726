//! Audio block configuration and transport state.

use serde::{Deserialize, Serialize};

/// Sample rate, fragment size and channel count of an audio block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Samples per fragment.
    pub fragment_size: usize,
    /// Number of channels.
    pub channels: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::new(48_000.0, 1024, 1)
    }
}

impl ChunkConfig {
    /// Create a new configuration; fragment size is at least one sample.
    pub fn new(sample_rate: f64, fragment_size: usize, channels: usize) -> Self {
        Self {
            sample_rate,
            fragment_size: fragment_size.max(1),
            channels,
        }
    }

    /// Same rate and fragment size with a different channel count.
    pub fn with_channels(&self, channels: usize) -> Self {
        Self { channels, ..*self }
    }

    /// Duration of one sample in seconds.
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate
    }

    /// Duration of one fragment in seconds.
    pub fn fragment_duration(&self) -> f64 {
        self.fragment_size as f64 / self.sample_rate
    }

    /// Fragment rate in Hz.
    pub fn fragment_rate(&self) -> f64 {
        self.sample_rate / self.fragment_size as f64
    }

    /// Per-sample increment used to interpolate values across a fragment.
    pub fn interp_step(&self) -> f64 {
        1.0 / self.fragment_size as f64
    }
}

/// Playback state passed to every processing stage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transport {
    /// True while time advances.
    pub rolling: bool,
    /// Session time in samples.
    pub session_time_samples: u64,
    /// Session time in seconds.
    pub session_time_seconds: f64,
    /// Object time in samples (session time minus scene offset).
    pub object_time_samples: u64,
    /// Object time in seconds.
    pub object_time_seconds: f64,
}

impl Transport {
    /// Transport positioned at `t` seconds.
    pub fn at_time(t: f64, sample_rate: f64, rolling: bool) -> Self {
        let samples = (t.max(0.0) * sample_rate).round() as u64;
        Self {
            rolling,
            session_time_samples: samples,
            session_time_seconds: t,
            object_time_samples: samples,
            object_time_seconds: t,
        }
    }

    /// Advance by one fragment, if rolling.
    pub fn advance(&mut self, cfg: &ChunkConfig) {
        if !self.rolling {
            return;
        }
        let n = cfg.fragment_size as u64;
        self.session_time_samples += n;
        self.object_time_samples += n;
        self.session_time_seconds += cfg.fragment_duration();
        self.object_time_seconds += cfg.fragment_duration();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_by_one_fragment() {
        let cfg = ChunkConfig::new(1000.0, 100, 2);
        let mut tp = Transport::at_time(1.0, cfg.sample_rate, true);
        tp.advance(&cfg);
        assert_eq!(tp.session_time_samples, 1100);
        assert!((tp.object_time_seconds - 1.1).abs() < 1e-12);
    }

    #[test]
    fn stopped_transport_stays() {
        let cfg = ChunkConfig::default();
        let mut tp = Transport::at_time(0.5, cfg.sample_rate, false);
        tp.advance(&cfg);
        assert_eq!(tp.session_time_seconds, 0.5);
    }

    #[test]
    fn zero_fragment_size_is_clamped() {
        assert_eq!(ChunkConfig::new(44100.0, 0, 1).fragment_size, 1);
    }
}
