//! Single-channel receivers.

use super::ReceiverModule;
use tascar_audio::{Amb1Wave, Wave};
use tascar_core::{DVec3, PosExt};
use tascar_scene::ReceiverKind;

const SQRT2: f32 = std::f32::consts::SQRT_2;

/// Omnidirectional microphone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Omni;

impl ReceiverModule for Omni {
    fn kind(&self) -> ReceiverKind {
        ReceiverKind::Omni
    }

    fn channels(&self) -> usize {
        1
    }

    fn point_weights(&self, _prel: DVec3, _width: f64, weights: &mut [f32]) {
        weights[0] = 1.0;
    }

    fn add_diffuse(&mut self, chunk: &Amb1Wave, output: &mut [Wave]) {
        output[0].add_scaled(&chunk.w, SQRT2);
    }
}

/// Cardioid microphone facing the receiver x-axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cardioid;

impl ReceiverModule for Cardioid {
    fn kind(&self) -> ReceiverKind {
        ReceiverKind::Cardioid
    }

    fn channels(&self) -> usize {
        1
    }

    fn point_weights(&self, prel: DVec3, _width: f64, weights: &mut [f32]) {
        weights[0] = (0.5 + 0.5 * prel.normal().x) as f32;
    }

    fn add_diffuse(&mut self, chunk: &Amb1Wave, output: &mut [Wave]) {
        output[0].add_scaled(&chunk.w, 0.5 * SQRT2);
        output[0].add_scaled(&chunk.x, 0.5);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardioid_pattern() {
        let mut w = [0.0f32];
        Cardioid.point_weights(DVec3::X, 0.0, &mut w);
        assert!((w[0] - 1.0).abs() < 1e-6);
        Cardioid.point_weights(DVec3::Y, 0.0, &mut w);
        assert!((w[0] - 0.5).abs() < 1e-6);
        Cardioid.point_weights(-DVec3::X, 0.0, &mut w);
        assert!(w[0].abs() < 1e-6);
    }

    #[test]
    fn omni_diffuse_uses_w_only() {
        let mut field = Amb1Wave::new(1);
        field.w[0] = 1.0;
        field.x[0] = 5.0;
        let mut out = vec![Wave::new(1)];
        Omni.add_diffuse(&field, &mut out);
        assert!((out[0][0] - SQRT2).abs() < 1e-6);
    }
}
