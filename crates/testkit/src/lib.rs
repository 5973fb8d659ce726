#![warn(missing_docs)]
//! Test helpers: deterministic test signals, impulse response inspection
//! and JSON metric reports for CI artifacts.

mod metrics;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tascar_audio::Wave;

pub use metrics::*;

/// Unit impulse of `len` samples at index `at`.
pub fn impulse(len: usize, at: usize) -> Wave {
    let mut w = Wave::new(len);
    if at < len {
        w[at] = 1.0;
    }
    w
}

/// Sine of frequency `f` Hz and amplitude `a` at sample rate `fs`.
pub fn sine(len: usize, f: f64, a: f32, fs: f64) -> Wave {
    Wave::from_vec(
        (0..len)
            .map(|k| a * (2.0 * std::f64::consts::PI * f * k as f64 / fs).sin() as f32)
            .collect(),
    )
}

/// Uniform white noise in `[-a, a]`, reproducible for a given `seed`.
pub fn noise(len: usize, a: f32, seed: u64) -> Wave {
    let mut rng = StdRng::seed_from_u64(seed);
    Wave::from_vec((0..len).map(|_| rng.gen_range(-a..=a)).collect())
}

/// Index and value of the sample with the largest magnitude.
pub fn peak(x: &[f32]) -> Option<(usize, f32)> {
    x.iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
}

/// Indices of samples whose magnitude exceeds `threshold`.
pub fn onsets(x: &[f32], threshold: f32) -> Vec<usize> {
    x.iter()
        .enumerate()
        .filter(|(_, v)| v.abs() > threshold)
        .map(|(k, _)| k)
        .collect()
}

/// Sum of squares.
pub fn energy(x: &[f32]) -> f64 {
    x.iter().map(|v| f64::from(*v) * f64::from(*v)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_are_deterministic() {
        assert_eq!(peak(&impulse(8, 3)), Some((3, 1.0)));
        assert_eq!(impulse(4, 9).maxabs(), 0.0);
        assert_eq!(noise(64, 0.5, 7), noise(64, 0.5, 7));
        assert!(noise(64, 0.5, 7).maxabs() <= 0.5);
        let s = sine(100, 10.0, 2.0, 1000.0);
        assert!((s[25] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn onsets_and_energy() {
        let x = [0.0, 0.5, 0.0, -0.25];
        assert_eq!(onsets(&x, 0.1), vec![1, 3]);
        assert!((energy(&x) - 0.3125).abs() < 1e-12);
    }
}
