//! Horizontal higher-order Ambisonics with a sampling decoder.

use super::ReceiverModule;
use crate::speakerarray::SpeakerArray;
use std::f64::consts::PI;
use tascar_audio::{Amb1Wave, Wave};
use tascar_core::{ChunkConfig, DVec3, PosExt};
use tascar_scene::ReceiverKind;
use tracing::debug;

/// Circular-harmonics panner decoded directly to a speaker ring.
#[derive(Debug, Clone)]
pub struct Hoa2d {
    speakers: SpeakerArray,
    order: usize,
    rotation: f64,
    /// Per-order weights, including max-rE tapering.
    ordergain: Vec<f64>,
    /// Angles of the virtual sampling points.
    angles: Vec<f64>,
}

impl Hoa2d {
    /// Decoder of `order` (0 selects the highest order the layout supports).
    ///
    /// `rotation` in radians defaults to the negative mean rotation of the layout.
    pub fn new(speakers: SpeakerArray, order: u32, maxre: bool, rotation: Option<f64>) -> Self {
        let n = speakers.len();
        let max_order = n.saturating_sub(1) / 2;
        let order = if order == 0 {
            max_order
        } else {
            (order as usize).min(max_order)
        };
        let rotation = rotation.unwrap_or(-speakers.mean_rotation());
        let ordergain = (0..=order)
            .map(|m| {
                if maxre {
                    (m as f64 * PI / (2.0 * order as f64 + 2.0)).cos()
                } else {
                    1.0
                }
            })
            .collect();
        let angles = (0..n)
            .map(|k| 2.0 * PI * k as f64 / n as f64 - rotation)
            .collect();
        debug!(speakers = n, order, rotation, maxre, "Created hoa2d decoder");
        Self {
            speakers,
            order,
            rotation,
            ordergain,
            angles,
        }
    }

    /// Ambisonics order in use.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Decoder rotation in radians.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }
}

impl ReceiverModule for Hoa2d {
    fn kind(&self) -> ReceiverKind {
        ReceiverKind::Hoa2d
    }

    fn channels(&self) -> usize {
        self.speakers.len()
    }

    fn prepare(&mut self, cfg: &ChunkConfig) {
        self.speakers.prepare(cfg);
    }

    fn point_weights(&self, prel: DVec3, _width: f64, weights: &mut [f32]) {
        let az = prel.azim();
        let scale = 1.0 / self.angles.len() as f64;
        for (w, theta) in weights.iter_mut().zip(&self.angles) {
            let mut acc = self.ordergain[0];
            for m in 1..=self.order {
                acc += 2.0 * self.ordergain[m] * (m as f64 * (theta - az)).cos();
            }
            *w = (scale * acc) as f32;
        }
    }

    fn add_diffuse(&mut self, chunk: &Amb1Wave, _output: &mut [Wave]) {
        self.speakers.add_diffuse(chunk);
    }

    fn postproc(&mut self, output: &mut [Wave]) {
        self.speakers.postproc(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tascar_scene::SpeakerLayout;

    fn ring(n: usize) -> SpeakerArray {
        SpeakerArray::new(&SpeakerLayout::circle(n, 1.0)).expect("valid layout")
    }

    #[test]
    fn order_is_limited_by_speaker_count() {
        assert_eq!(Hoa2d::new(ring(8), 0, false, None).order(), 3);
        assert_eq!(Hoa2d::new(ring(8), 2, false, None).order(), 2);
        assert_eq!(Hoa2d::new(ring(5), 7, false, None).order(), 2);
    }

    #[test]
    fn weights_sum_to_one_and_peak_at_source() {
        let hoa = Hoa2d::new(ring(8), 0, true, None);
        let mut w = vec![0.0; 8];
        let az = 3.0 * PI / 4.0;
        hoa.point_weights(DVec3::new(az.cos(), az.sin(), 0.0), 0.0, &mut w);
        assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        let loudest = w
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k);
        assert_eq!(loudest, Some(3));
    }

    #[test]
    fn rotation_follows_layout() {
        let mut layout = SpeakerLayout::circle(6, 1.0);
        for spk in &mut layout.speaker {
            spk.az += 30.0;
        }
        let arr = SpeakerArray::new(&layout).expect("valid layout");
        let hoa = Hoa2d::new(arr, 0, false, None);
        assert!((hoa.rotation() + PI / 6.0).abs() < 1e-9);
        let mut w = vec![0.0; 6];
        hoa.point_weights(DVec3::from_sphere(1.0, PI / 6.0, 0.0), 0.0, &mut w);
        assert!(w[0] > w[1] && w[0] > w[5]);
    }
}
