//! Source directivity.

use tascar_core::{DVec3, PosExt};
use tascar_scene::Directivity;

/// Directivity gain of a sound towards one receiver, kept between fragments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectivityState {
    gain: f32,
}

impl Default for DirectivityState {
    fn default() -> Self {
        Self { gain: 1.0 }
    }
}

/// Gain of `pattern` towards `prel`, the receiver position in source coordinates.
pub fn directivity_gain(pattern: Directivity, prel: DVec3) -> f32 {
    match pattern {
        Directivity::Omni => 1.0,
        Directivity::Cardioid => (0.5 + 0.5 * prel.normal().x) as f32,
    }
}

impl DirectivityState {
    /// Current gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Copy `input` to `output`, fading the directivity gain towards the new direction.
    pub fn read(&mut self, pattern: Directivity, prel: DVec3, input: &[f32], output: &mut [f32]) {
        let target = directivity_gain(pattern, prel);
        if pattern == Directivity::Omni && self.gain == target {
            output.copy_from_slice(input);
            return;
        }
        let dg = (target - self.gain) / output.len().max(1) as f32;
        for (y, x) in output.iter_mut().zip(input) {
            self.gain += dg;
            *y = self.gain * *x;
        }
        self.gain = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omni_copies_input() {
        let mut state = DirectivityState::default();
        let mut out = [0.0; 3];
        state.read(Directivity::Omni, DVec3::Y, &[1.0, 2.0, 3.0], &mut out);
        assert_eq!(out, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn cardioid_rejects_rear() {
        assert_eq!(directivity_gain(Directivity::Cardioid, DVec3::X), 1.0);
        assert!((directivity_gain(Directivity::Cardioid, DVec3::Z) - 0.5).abs() < 1e-6);
        assert!(directivity_gain(Directivity::Cardioid, -DVec3::X).abs() < 1e-6);
    }

    #[test]
    fn gain_fades_across_fragment() {
        let mut state = DirectivityState::default();
        let mut out = [0.0; 4];
        state.read(Directivity::Cardioid, -DVec3::X, &[1.0; 4], &mut out);
        assert_eq!(out, [0.75, 0.5, 0.25, 0.0]);
        assert_eq!(state.gain(), 0.0);
    }
}
