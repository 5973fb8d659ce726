//! First-order Ambisonics (FuMa weighting) receivers.

use super::ReceiverModule;
use tascar_audio::{Amb1Wave, Wave, MIN3DB};
use tascar_core::{DVec3, PosExt};
use tascar_scene::ReceiverKind;

/// First-order B-format microphone, horizontal (W X Y) or full (W X Y Z).
#[derive(Debug, Clone, Copy)]
pub struct Amb1 {
    periphonic: bool,
}

impl Amb1 {
    /// Horizontal-only receiver with channels W, X and Y.
    pub fn horizontal() -> Self {
        Self { periphonic: false }
    }

    /// Periphonic receiver with channels W, X, Y and Z.
    pub fn full() -> Self {
        Self { periphonic: true }
    }
}

impl ReceiverModule for Amb1 {
    fn kind(&self) -> ReceiverKind {
        if self.periphonic {
            ReceiverKind::Amb1h1v
        } else {
            ReceiverKind::Amb1h0v
        }
    }

    fn channels(&self) -> usize {
        if self.periphonic {
            4
        } else {
            3
        }
    }

    fn point_weights(&self, prel: DVec3, _width: f64, weights: &mut [f32]) {
        let az = prel.azim();
        weights[0] = MIN3DB;
        if self.periphonic {
            let el = prel.elev();
            weights[1] = (az.cos() * el.cos()) as f32;
            weights[2] = (az.sin() * el.cos()) as f32;
            weights[3] = el.sin() as f32;
        } else {
            weights[1] = az.cos() as f32;
            weights[2] = az.sin() as f32;
        }
    }

    fn add_diffuse(&mut self, chunk: &Amb1Wave, output: &mut [Wave]) {
        output[0].add(&chunk.w);
        output[1].add(&chunk.x);
        output[2].add(&chunk.y);
        if self.periphonic {
            output[3].add(&chunk.z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_lateral_source() {
        let mut w = [0.0f32; 3];
        Amb1::horizontal().point_weights(DVec3::new(0.0, 2.0, 0.0), 0.0, &mut w);
        assert!((w[0] - MIN3DB).abs() < 1e-6);
        assert!(w[1].abs() < 1e-6);
        assert!((w[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn periphonic_encodes_elevation() {
        let mut w = [0.0f32; 4];
        Amb1::full().point_weights(DVec3::new(0.0, 0.0, 1.0), 0.0, &mut w);
        assert!(w[1].abs() < 1e-6 && w[2].abs() < 1e-6);
        assert!((w[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn diffuse_fields_pass_through() {
        let mut field = Amb1Wave::new(1);
        field.w[0] = 1.0;
        field.z[0] = 2.0;
        let mut out = vec![Wave::new(1); 3];
        Amb1::horizontal().add_diffuse(&field, &mut out);
        assert_eq!(out[0][0], 1.0);
        assert_eq!(out[2][0], 0.0);
        let mut out = vec![Wave::new(1); 4];
        Amb1::full().add_diffuse(&field, &mut out);
        assert_eq!(out[3][0], 2.0);
    }
}
