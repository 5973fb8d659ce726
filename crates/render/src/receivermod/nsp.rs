//! Nearest speaker panning.

use super::ReceiverModule;
use crate::speakerarray::SpeakerArray;
use tascar_audio::{Amb1Wave, Wave};
use tascar_core::{ChunkConfig, DVec3};
use tascar_scene::ReceiverKind;

/// Routes each source to the speaker closest to its direction.
#[derive(Debug, Clone)]
pub struct Nsp {
    speakers: SpeakerArray,
    useall: bool,
}

impl Nsp {
    /// Panner over `speakers`; `useall` drives every speaker with unit weight.
    pub fn new(speakers: SpeakerArray, useall: bool) -> Self {
        Self { speakers, useall }
    }
}

impl ReceiverModule for Nsp {
    fn kind(&self) -> ReceiverKind {
        ReceiverKind::Nsp
    }

    fn channels(&self) -> usize {
        self.speakers.len()
    }

    fn prepare(&mut self, cfg: &ChunkConfig) {
        self.speakers.prepare(cfg);
    }

    fn point_weights(&self, prel: DVec3, _width: f64, weights: &mut [f32]) {
        if self.useall {
            weights.fill(1.0);
            return;
        }
        weights.fill(0.0);
        weights[self.speakers.nearest(prel)] = 1.0;
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

    fn ring() -> SpeakerArray {
        SpeakerArray::new(&SpeakerLayout::circle(8, 1.0)).expect("valid layout")
    }

    #[test]
    fn single_speaker_gets_weight() {
        let nsp = Nsp::new(ring(), false);
        let mut w = vec![0.0; 8];
        nsp.point_weights(DVec3::new(-1.0, -1.1, 0.0), 0.0, &mut w);
        assert_eq!(w.iter().sum::<f32>(), 1.0);
        assert_eq!(w[5], 1.0);
    }

    #[test]
    fn useall_drives_every_speaker() {
        let nsp = Nsp::new(ring(), true);
        let mut w = vec![0.0; 8];
        nsp.point_weights(DVec3::X, 0.0, &mut w);
        assert!(w.iter().all(|v| *v == 1.0));
    }
}
