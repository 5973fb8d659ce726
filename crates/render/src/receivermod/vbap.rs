//! Two-dimensional vector base amplitude panning.

use super::ReceiverModule;
use crate::speakerarray::SpeakerArray;
use crate::RenderError;
use tascar_audio::{Amb1Wave, Wave};
use tascar_core::{ChunkConfig, DVec3, PosExt};
use tascar_scene::ReceiverKind;

/// A speaker pair with the inverse of its direction matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Simplex {
    c1: usize,
    c2: usize,
    l11: f64,
    l12: f64,
    l21: f64,
    l22: f64,
}

impl Simplex {
    fn new(arr: &SpeakerArray, c1: usize, c2: usize) -> Self {
        let a = arr.speakers()[c1].unit;
        let b = arr.speakers()[c2].unit;
        let mut det = a.x * b.y - b.x * a.y;
        if det != 0.0 {
            det = 1.0 / det;
        }
        Self {
            c1,
            c2,
            l11: det * b.y,
            l12: -det * a.y,
            l21: -det * b.x,
            l22: det * a.x,
        }
    }

    /// Energy-normalised gains, or `None` if `p` lies outside the pair.
    fn gains(&self, p: DVec3) -> Option<(f64, f64)> {
        let g1 = p.x * self.l11 + p.y * self.l21;
        let g2 = p.x * self.l12 + p.y * self.l22;
        if g1 < 0.0 || g2 < 0.0 {
            return None;
        }
        let mut w = (g1 * g1 + g2 * g2).sqrt();
        if w > 0.0 {
            w = 1.0 / w;
        }
        Some((g1 * w, g2 * w))
    }
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Indices of the 2D convex hull of the speaker directions, counter-clockwise.
fn convex_hull(arr: &SpeakerArray) -> Vec<usize> {
    let pts: Vec<(f64, f64)> = arr.speakers().iter().map(|s| (s.unit.x, s.unit.y)).collect();
    let mut idx: Vec<usize> = (0..pts.len()).collect();
    idx.sort_by(|a, b| {
        pts[*a]
            .0
            .total_cmp(&pts[*b].0)
            .then(pts[*a].1.total_cmp(&pts[*b].1))
    });
    idx.dedup_by(|a, b| {
        (pts[*a].0 - pts[*b].0).abs() < 1e-12 && (pts[*a].1 - pts[*b].1).abs() < 1e-12
    });
    if idx.len() < 3 {
        return idx;
    }
    let half = |order: &mut dyn Iterator<Item = usize>| {
        let mut chain: Vec<usize> = Vec::new();
        for k in order {
            while chain.len() >= 2
                && cross(pts[chain[chain.len() - 2]], pts[chain[chain.len() - 1]], pts[k]) <= 0.0
            {
                chain.pop();
            }
            chain.push(k);
        }
        chain.pop();
        chain
    };
    let mut hull = half(&mut idx.iter().copied());
    hull.extend(half(&mut idx.iter().rev().copied()));
    hull
}

/// Panner over adjacent speaker pairs of the horizontal hull.
#[derive(Debug, Clone)]
pub struct Vbap {
    speakers: SpeakerArray,
    simplices: Vec<Simplex>,
}

impl Vbap {
    /// Build the speaker pairs of `speakers`.
    pub fn new(speakers: SpeakerArray) -> Result<Self, RenderError> {
        if speakers.len() < 2 {
            return Err(RenderError::Config(
                "at least two loudspeakers are required for 2D VBAP".into(),
            ));
        }
        let hull = convex_hull(&speakers);
        if hull.len() < 2 {
            return Err(RenderError::Config("invalid convex hull".into()));
        }
        let simplices = if hull.len() == 2 {
            vec![Simplex::new(&speakers, hull[0], hull[1])]
        } else {
            (0..hull.len())
                .map(|k| Simplex::new(&speakers, hull[k], hull[(k + 1) % hull.len()]))
                .collect()
        };
        Ok(Self {
            speakers,
            simplices,
        })
    }
}

fn pair_weights(simplices: &[Simplex], prel: DVec3, weights: &mut [f32]) {
    weights.fill(0.0);
    let p = prel.normal();
    for sim in simplices {
        if let Some((g1, g2)) = sim.gains(p) {
            weights[sim.c1] = g1 as f32;
            weights[sim.c2] = g2 as f32;
        }
    }
}

impl ReceiverModule for Vbap {
    fn kind(&self) -> ReceiverKind {
        ReceiverKind::Vbap
    }

    fn channels(&self) -> usize {
        self.speakers.len()
    }

    fn prepare(&mut self, cfg: &ChunkConfig) {
        self.speakers.prepare(cfg);
    }

    fn point_weights(&self, prel: DVec3, _width: f64, weights: &mut [f32]) {
        pair_weights(&self.simplices, prel, weights);
    }

    fn add_diffuse(&mut self, chunk: &Amb1Wave, _output: &mut [Wave]) {
        self.speakers.add_diffuse(chunk);
    }

    fn postproc(&mut self, output: &mut [Wave]) {
        self.speakers.postproc(output);
    }
}

/// Amplitude panning between the first two speakers of a layout.
#[derive(Debug, Clone)]
pub struct Stereo {
    speakers: SpeakerArray,
    pair: Simplex,
}

impl Stereo {
    /// Panner over speakers 0 and 1; further speakers stay silent.
    pub fn new(speakers: SpeakerArray) -> Result<Self, RenderError> {
        if speakers.len() < 2 {
            return Err(RenderError::Config(
                "stereo panning needs at least two loudspeakers".into(),
            ));
        }
        let pair = Simplex::new(&speakers, 0, 1);
        Ok(Self { speakers, pair })
    }
}

impl ReceiverModule for Stereo {
    fn kind(&self) -> ReceiverKind {
        ReceiverKind::Stereo
    }

    fn channels(&self) -> usize {
        self.speakers.len()
    }

    fn prepare(&mut self, cfg: &ChunkConfig) {
        self.speakers.prepare(cfg);
    }

    fn point_weights(&self, prel: DVec3, _width: f64, weights: &mut [f32]) {
        weights.fill(0.0);
        let p = prel.normal();
        match self.pair.gains(p) {
            Some((g1, g2)) => {
                weights[0] = g1 as f32;
                weights[1] = g2 as f32;
            }
            None => {
                // outside the pair, clamp to the nearer speaker
                let spk = self.speakers.speakers();
                let nearer = if spk[1].unit.dot(p) > spk[0].unit.dot(p) { 1 } else { 0 };
                weights[nearer] = 1.0;
            }
        }
    }

    fn add_diffuse(&mut self, chunk: &Amb1Wave, _output: &mut [Wave]) {
        self.speakers.add_diffuse(chunk);
    }

    fn postproc(&mut self, output: &mut [Wave]) {
        self.speakers.postproc(output);
    }
}
