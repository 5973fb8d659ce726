//! Loudspeaker arrays used by speaker-based receivers.

use crate::RenderError;
use tascar_audio::{Amb1Wave, StaticDelay, Wave};
use tascar_core::{ChunkConfig, DVec3, PosExt, SPEED_OF_SOUND};
use tascar_scene::SpeakerLayout;

/// One loudspeaker with derived compensation values.
#[derive(Debug, Clone)]
pub struct Speaker {
    /// Position relative to the receiver centre.
    pub position: DVec3,
    /// Unit vector towards the speaker.
    pub unit: DVec3,
    /// Linear gain from the layout.
    pub gain: f64,
    /// Extra delay in seconds.
    pub delay: f64,
    /// Channel label.
    pub label: String,
    /// Distance gain compensation, `r / rmax`.
    pub spkgain: f64,
    /// Distance difference to the farthest speaker.
    pub dr: f64,
    /// Diffuse decoder weights for W, X, Y and Z.
    pub foa_decoder: [f32; 4],
    /// Relative density weight for diffuse rendering.
    pub densityweight: f64,
}

/// A loudspeaker layout prepared for rendering.
#[derive(Debug, Clone)]
pub struct SpeakerArray {
    speakers: Vec<Speaker>,
    rmax: f64,
    rmin: f64,
    mean_rotation: f64,
    densitycorr: bool,
    delaycomp: Vec<StaticDelay>,
    diffuse: Amb1Wave,
    scratch: Wave,
}

impl SpeakerArray {
    /// Derive gains, delays and decoders from a layout.
    pub fn new(layout: &SpeakerLayout) -> Result<Self, RenderError> {
        if layout.speaker.is_empty() {
            return Err(RenderError::Config(format!(
                "layout '{}' has no speakers",
                layout.name
            )));
        }
        let mut speakers: Vec<Speaker> = layout
            .speaker
            .iter()
            .map(|spk| {
                let position = spk.position();
                Speaker {
                    position,
                    unit: position.normal(),
                    gain: spk.linear_gain(),
                    delay: spk.delay,
                    label: spk.label.clone(),
                    spkgain: 1.0,
                    dr: 0.0,
                    foa_decoder: [0.0; 4],
                    densityweight: 1.0,
                }
            })
            .collect();
        let n = speakers.len();
        let rmax = speakers.iter().map(|s| s.position.length()).fold(0.0, f64::max);
        let rmin = speakers
            .iter()
            .map(|s| s.position.length())
            .fold(f64::INFINITY, f64::min);
        let (mut re, mut im) = (0.0, 0.0);
        for (k, spk) in speakers.iter_mut().enumerate() {
            let r = spk.position.length();
            spk.spkgain = r / rmax;
            spk.dr = rmax - r;
            // first circular moment, exp(-i 2 pi k / N) * (ux + i uy)
            let phi = -2.0 * std::f64::consts::PI * k as f64 / n as f64;
            let (s, c) = phi.sin_cos();
            re += c * spk.unit.x - s * spk.unit.y;
            im += c * spk.unit.y + s * spk.unit.x;
        }
        let mean_rotation = im.atan2(re);
        let scale = 1.0 / n as f64;
        for spk in &mut speakers {
            let g = scale * layout.xyzgain;
            spk.foa_decoder = [
                (std::f64::consts::SQRT_2 * scale) as f32,
                (spk.unit.x * g) as f32,
                (spk.unit.y * g) as f32,
                (spk.unit.z * g) as f32,
            ];
        }
        let weights: Vec<f64> = (0..n)
            .map(|k| {
                let w = 1.0
                    + (0..n)
                        .filter(|l| *l != k)
                        .map(|l| speakers[k].unit.dot(speakers[l].unit).max(0.0))
                        .sum::<f64>();
                n as f64 / w
            })
            .collect();
        let mean = weights.iter().sum::<f64>() / n as f64;
        for (spk, w) in speakers.iter_mut().zip(weights) {
            spk.densityweight = w / mean;
        }
        Ok(Self {
            speakers,
            rmax,
            rmin,
            mean_rotation,
            densitycorr: layout.densitycorr,
            delaycomp: Vec::new(),
            diffuse: Amb1Wave::default(),
            scratch: Wave::default(),
        })
    }

    /// Allocate buffers and delay compensation for a block configuration.
    pub fn prepare(&mut self, cfg: &ChunkConfig) {
        self.delaycomp = self
            .speakers
            .iter()
            .map(|s| {
                let d = cfg.sample_rate * (s.dr / SPEED_OF_SOUND + s.delay);
                StaticDelay::new(d.max(0.0).round() as usize)
            })
            .collect();
        self.diffuse = Amb1Wave::new(cfg.fragment_size);
        self.scratch = Wave::new(cfg.fragment_size);
    }

    /// Number of speakers.
    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    /// True if there are no speakers.
    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    /// Speakers in channel order.
    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    /// Largest speaker distance.
    pub fn rmax(&self) -> f64 {
        self.rmax
    }

    /// Smallest speaker distance.
    pub fn rmin(&self) -> f64 {
        self.rmin
    }

    /// Rotation of the layout relative to a regular ring starting at azimuth zero.
    pub fn mean_rotation(&self) -> f64 {
        self.mean_rotation
    }

    /// Index of the speaker closest to the direction `dir`.
    pub fn nearest(&self, dir: DVec3) -> usize {
        let dir = dir.normal();
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (k, spk) in self.speakers.iter().enumerate() {
            let d = (spk.unit - dir).length_squared();
            if d < best_dist {
                best_dist = d;
                best = k;
            }
        }
        best
    }

    /// Accumulate a diffuse first-order field for decoding in [`postproc`](Self::postproc).
    pub fn add_diffuse(&mut self, chunk: &Amb1Wave) {
        if self.diffuse.len() != chunk.len() {
            self.diffuse = Amb1Wave::new(chunk.len());
            self.scratch = Wave::new(chunk.len());
        }
        self.diffuse.add(chunk);
    }

    fn render_diffuse(&mut self, output: &mut [Wave]) {
        for (spk, out) in self.speakers.iter().zip(output.iter_mut()) {
            let [dw, dx, dy, dz] = spk.foa_decoder;
            for k in 0..self.scratch.len() {
                self.scratch[k] = dw * self.diffuse.w[k]
                    + dx * self.diffuse.x[k]
                    + dy * self.diffuse.y[k]
                    + dz * self.diffuse.z[k];
            }
            if self.densitycorr {
                self.scratch.scale(spk.densityweight as f32);
            }
            out.add(&self.scratch);
        }
        self.diffuse.clear();
    }

    /// Decode accumulated diffuse fields, then apply speaker gain and delay compensation.
    pub fn postproc(&mut self, output: &mut [Wave]) {
        self.render_diffuse(output);
        for (k, out) in output.iter_mut().enumerate().take(self.speakers.len()) {
            let spk = &self.speakers[k];
            let g = (spk.spkgain * spk.gain) as f32;
            match self.delaycomp.get_mut(k) {
                Some(delay) => {
                    for v in out.iter_mut() {
                        *v = g * delay.process(*v);
                    }
                }
                None => out.scale(g),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tascar_scene::SpeakerDesc;

    #[test]
    fn distance_compensation() {
        let layout = SpeakerLayout {
            speaker: vec![
                SpeakerDesc {
                    r: 2.0,
                    ..SpeakerDesc::at_azimuth(0.0)
                },
                SpeakerDesc {
                    r: 1.0,
                    ..SpeakerDesc::at_azimuth(90.0)
                },
            ],
            ..SpeakerLayout::default()
        };
        let mut arr = SpeakerArray::new(&layout).expect("valid layout");
        assert_eq!(arr.rmax(), 2.0);
        assert_eq!(arr.speakers()[1].spkgain, 0.5);
        assert_eq!(arr.speakers()[1].dr, 1.0);
        arr.prepare(&ChunkConfig::new(340.0, 4, 2));
        let mut out = vec![Wave::from_vec(vec![1.0, 0.0, 0.0, 0.0]); 2];
        arr.postproc(&mut out);
        assert_eq!(&*out[0], &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(&*out[1], &[0.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn mean_rotation_of_rotated_ring() {
        let mut layout = SpeakerLayout::circle(6, 1.0);
        for spk in &mut layout.speaker {
            spk.az += 15.0;
        }
        let arr = SpeakerArray::new(&layout).expect("valid layout");
        assert!((arr.mean_rotation() - 15f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn nearest_speaker() {
        let arr = SpeakerArray::new(&SpeakerLayout::circle(4, 1.0)).expect("valid layout");
        assert_eq!(arr.nearest(DVec3::new(0.1, 1.0, 0.0)), 1);
        assert_eq!(arr.nearest(DVec3::new(-1.0, -0.2, 0.0)), 2);
    }

    #[test]
    fn diffuse_omni_field_reaches_every_speaker() {
        let mut arr = SpeakerArray::new(&SpeakerLayout::circle(4, 1.0)).expect("valid layout");
        arr.prepare(&ChunkConfig::new(48000.0, 2, 4));
        let mut field = Amb1Wave::new(2);
        field.w.copy_from(&[1.0, 1.0]);
        arr.add_diffuse(&field);
        let mut out = vec![Wave::new(2); 4];
        arr.postproc(&mut out);
        for ch in &out {
            assert!((ch[0] - std::f32::consts::SQRT_2 / 4.0).abs() < 1e-6);
        }
    }
}
