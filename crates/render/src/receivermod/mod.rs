//! Receiver (panning) modules
//!
//! A receiver module turns a point source direction into per-channel
//! weights and decodes diffuse first-order fields into its channels.

pub mod ambisonics;
pub mod hoa2d;
pub mod nsp;
pub mod omni;
pub mod vbap;

pub use ambisonics::Amb1;
pub use hoa2d::Hoa2d;
pub use nsp::Nsp;
pub use omni::{Cardioid, Omni};
pub use vbap::{Stereo, Vbap};

use crate::speakerarray::SpeakerArray;
use crate::RenderError;
use tascar_audio::{Amb1Wave, Wave};
use tascar_core::{ChunkConfig, DVec3};
use tascar_scene::{ReceiverDesc, ReceiverKind};

/// Per source/receiver pair panning state.
#[derive(Debug, Clone, Default)]
pub struct PanState {
    current: Vec<f32>,
    target: Vec<f32>,
}

impl PanState {
    /// State for `channels` output channels, starting silent.
    pub fn new(channels: usize) -> Self {
        Self {
            current: vec![0.0; channels],
            target: vec![0.0; channels],
        }
    }

    /// Weights reached at the end of the last fragment.
    pub fn weights(&self) -> &[f32] {
        &self.current
    }
}

/// Common interface of all receiver types.
pub trait ReceiverModule: Send {
    /// Receiver type.
    fn kind(&self) -> ReceiverKind;

    /// Number of output channels.
    fn channels(&self) -> usize;

    /// Allocate buffers for a block configuration.
    fn prepare(&mut self, _cfg: &ChunkConfig) {}

    /// Target weights for a source at `prel` (receiver coordinates) with angular `width`.
    fn point_weights(&self, prel: DVec3, width: f64, weights: &mut [f32]);

    /// Pan `chunk` into `output`, interpolating weights across the fragment.
    fn add_pointsource(
        &self,
        prel: DVec3,
        width: f64,
        chunk: &[f32],
        output: &mut [Wave],
        state: &mut PanState,
    ) {
        let channels = self.channels();
        if state.current.len() != channels {
            *state = PanState::new(channels);
        }
        self.point_weights(prel, width, &mut state.target);
        let dt = 1.0 / chunk.len().max(1) as f32;
        for (ch, out) in output.iter_mut().enumerate().take(channels) {
            let start = state.current[ch];
            let target = state.target[ch];
            if start == 0.0 && target == 0.0 {
                continue;
            }
            let dw = (target - start) * dt;
            let mut w = start;
            for (y, x) in out.iter_mut().zip(chunk) {
                w += dw;
                *y += w * *x;
            }
        }
        state.current.copy_from_slice(&state.target);
    }

    /// Add a diffuse first-order field.
    fn add_diffuse(&mut self, chunk: &Amb1Wave, output: &mut [Wave]);

    /// Receiver-specific post-processing of the output channels.
    fn postproc(&mut self, _output: &mut [Wave]) {}
}

/// Instantiate the module of a receiver description.
pub fn create(desc: &ReceiverDesc) -> Result<Box<dyn ReceiverModule>, RenderError> {
    let kind = desc.kind;
    let speakers = || -> Result<SpeakerArray, RenderError> {
        if desc.speaker.len() < kind.min_speakers() {
            return Err(RenderError::Config(format!(
                "receiver '{}' of type {} needs at least {} speakers, got {}",
                desc.object.name,
                kind.name(),
                kind.min_speakers(),
                desc.speaker.len()
            )));
        }
        SpeakerArray::new(&desc.speaker_layout())
    };
    Ok(match kind {
        ReceiverKind::Omni => Box::new(Omni),
        ReceiverKind::Cardioid => Box::new(Cardioid),
        ReceiverKind::Nsp => Box::new(Nsp::new(speakers()?, desc.useall)),
        ReceiverKind::Vbap => Box::new(Vbap::new(speakers()?)?),
        ReceiverKind::Stereo => Box::new(Stereo::new(speakers()?)?),
        ReceiverKind::Amb1h0v => Box::new(Amb1::horizontal()),
        ReceiverKind::Amb1h1v => Box::new(Amb1::full()),
        ReceiverKind::Hoa2d => Box::new(Hoa2d::new(
            speakers()?,
            desc.order,
            desc.maxre,
            desc.rotation.map(f64::to_radians),
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tascar_scene::{ObjectDesc, SpeakerDesc};

    #[test]
    fn weights_ramp_across_fragment() {
        let module = Omni;
        let mut state = PanState::new(1);
        let mut out = vec![Wave::new(4)];
        module.add_pointsource(DVec3::X, 0.0, &[1.0; 4], &mut out, &mut state);
        assert_eq!(&*out[0], &[0.25, 0.5, 0.75, 1.0]);
        assert_eq!(state.weights(), &[1.0]);
    }

    #[test]
    fn create_checks_speaker_count() {
        let desc = ReceiverDesc {
            object: ObjectDesc::at("r", [0.0; 3]),
            kind: ReceiverKind::Hoa2d,
            speaker: vec![SpeakerDesc::at_azimuth(0.0), SpeakerDesc::at_azimuth(180.0)],
            ..ReceiverDesc::default()
        };
        assert!(matches!(create(&desc), Err(RenderError::Config(_))));
        let desc = ReceiverDesc {
            kind: ReceiverKind::Amb1h1v,
            ..desc
        };
        assert_eq!(create(&desc).expect("valid receiver").channels(), 4);
    }
}
