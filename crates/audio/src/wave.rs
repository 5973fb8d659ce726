//! Sample containers.

use std::ops::{Deref, DerefMut};
use tascar_core::{DVec3, Euler, PosExt};

/// W-channel weight of first-order Ambisonics (-3 dB).
pub const MIN3DB: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// A block of mono samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wave {
    data: Vec<f32>,
}

impl Wave {
    /// Silent block of `n` samples.
    pub fn new(n: usize) -> Self {
        Self { data: vec![0.0; n] }
    }

    /// Wrap existing samples.
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Consume into the sample vector.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Set every sample to zero.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Mean square.
    pub fn ms(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|x| x * x).sum::<f32>() / self.data.len() as f32
    }

    /// Root mean square.
    pub fn rms(&self) -> f32 {
        self.ms().sqrt()
    }

    /// Largest absolute sample value.
    pub fn maxabs(&self) -> f32 {
        self.data.iter().fold(0.0, |m, x| m.max(x.abs()))
    }

    /// RMS level in dB SPL, assuming full scale 1 is 1 Pa.
    pub fn spldb(&self) -> f32 {
        20.0 * (self.rms() / 2e-5).log10()
    }

    /// Copy from `src`, zero-filling or truncating to this length.
    pub fn copy_from(&mut self, src: &[f32]) {
        let n = self.data.len().min(src.len());
        self.data[..n].copy_from_slice(&src[..n]);
        self.data[n..].fill(0.0);
    }

    /// Add `src` sample by sample.
    pub fn add(&mut self, src: &[f32]) {
        for (y, x) in self.data.iter_mut().zip(src) {
            *y += *x;
        }
    }

    /// Add `src` scaled by `gain`.
    pub fn add_scaled(&mut self, src: &[f32], gain: f32) {
        for (y, x) in self.data.iter_mut().zip(src) {
            *y += *x * gain;
        }
    }

    /// Multiply every sample by `gain`.
    pub fn scale(&mut self, gain: f32) {
        for y in &mut self.data {
            *y *= gain;
        }
    }
}

impl Deref for Wave {
    type Target = [f32];
    fn deref(&self) -> &[f32] {
        &self.data
    }
}

impl DerefMut for Wave {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

/// First-order Ambisonics block with channels W, X, Y and Z.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Amb1Wave {
    /// Omnidirectional component.
    pub w: Wave,
    /// Front/back component.
    pub x: Wave,
    /// Left/right component.
    pub y: Wave,
    /// Up/down component.
    pub z: Wave,
}

impl Amb1Wave {
    /// Silent block of `n` samples per channel.
    pub fn new(n: usize) -> Self {
        Self {
            w: Wave::new(n),
            x: Wave::new(n),
            y: Wave::new(n),
            z: Wave::new(n),
        }
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.w.len()
    }

    /// True for zero-length blocks.
    pub fn is_empty(&self) -> bool {
        self.w.is_empty()
    }

    /// Channels in W, X, Y, Z order.
    pub fn channels(&self) -> [&Wave; 4] {
        [&self.w, &self.x, &self.y, &self.z]
    }

    /// Mutable channels in W, X, Y, Z order.
    pub fn channels_mut(&mut self) -> [&mut Wave; 4] {
        [&mut self.w, &mut self.x, &mut self.y, &mut self.z]
    }

    /// Set all channels to zero.
    pub fn clear(&mut self) {
        for ch in self.channels_mut() {
            ch.clear();
        }
    }

    /// Add another block channel by channel.
    pub fn add(&mut self, src: &Amb1Wave) {
        for (dst, s) in self.channels_mut().into_iter().zip(src.channels()) {
            dst.add(s);
        }
    }

    /// Add another block scaled by `gain`.
    pub fn add_scaled(&mut self, src: &Amb1Wave, gain: f32) {
        for (dst, s) in self.channels_mut().into_iter().zip(src.channels()) {
            dst.add_scaled(s, gain);
        }
    }

    /// Multiply all channels by `gain`.
    pub fn scale(&mut self, gain: f32) {
        for ch in self.channels_mut() {
            ch.scale(gain);
        }
    }

    /// Encode a mono block arriving from direction `dir` with gain `g`.
    pub fn add_panned(&mut self, dir: DVec3, v: &[f32], g: f32) {
        let u = dir.normal().as_vec3() * g;
        self.w.add_scaled(v, g * MIN3DB);
        self.x.add_scaled(v, u.x);
        self.y.add_scaled(v, u.y);
        self.z.add_scaled(v, u.z);
    }

    /// Rotate the sound field by `rot`.
    pub fn rotate(&mut self, rot: &Euler) {
        self.rotate_with(|v| rot.rotate(v));
    }

    /// Rotate the sound field by the inverse of `rot`.
    pub fn rotate_inverse(&mut self, rot: &Euler) {
        self.rotate_with(|v| rot.rotate_inverse(v));
    }

    fn rotate_with(&mut self, f: impl Fn(DVec3) -> DVec3) {
        let cx = f(DVec3::X).as_vec3();
        let cy = f(DVec3::Y).as_vec3();
        let cz = f(DVec3::Z).as_vec3();
        for k in 0..self.len() {
            let (x, y, z) = (self.x[k], self.y[k], self.z[k]);
            self.x[k] = cx.x * x + cy.x * y + cz.x * z;
            self.y[k] = cx.y * x + cy.y * y + cz.y * z;
            self.z[k] = cx.z * x + cy.z * y + cz.z * z;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_measures() {
        let w = Wave::from_vec(vec![1.0, -1.0, 1.0, -1.0]);
        assert_eq!(w.rms(), 1.0);
        assert_eq!(w.maxabs(), 1.0);
        assert!((w.spldb() - 93.9794).abs() < 1e-3);
        assert_eq!(Wave::new(0).ms(), 0.0);
    }

    #[test]
    fn copy_zero_fills_tail() {
        let mut w = Wave::from_vec(vec![5.0; 4]);
        w.copy_from(&[1.0, 2.0]);
        assert_eq!(&*w, &[1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn add_scaled_accumulates() {
        let mut w = Wave::new(2);
        w.add_scaled(&[1.0, 2.0], 0.5);
        w.add(&[1.0, 1.0]);
        assert_eq!(&*w, &[1.5, 2.0]);
    }

    #[test]
    fn rotation_moves_front_to_left() {
        let mut a = Amb1Wave::new(1);
        a.x[0] = 1.0;
        a.rotate(&Euler::new(std::f64::consts::FRAC_PI_2, 0.0, 0.0));
        assert!(a.x[0].abs() < 1e-6);
        assert!((a.y[0] - 1.0).abs() < 1e-6);
        a.rotate_inverse(&Euler::new(std::f64::consts::FRAC_PI_2, 0.0, 0.0));
        assert!((a.x[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn panned_block_encodes_direction() {
        let mut a = Amb1Wave::new(2);
        a.add_panned(DVec3::new(0.0, -3.0, 0.0), &[1.0, 2.0], 0.5);
        assert!((a.w[1] - MIN3DB).abs() < 1e-6);
        assert!(a.x[0].abs() < 1e-6);
        assert!((a.y[1] + 1.0).abs() < 1e-6);
    }
}
