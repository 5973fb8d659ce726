#![warn(missing_docs)]
//! Acoustic scene rendering.
//!
//! A [`RenderCore`] is built from one scene description. Per fragment it
//! evaluates object trajectories, feeds the input ports into sounds and
//! diffuse fields, runs one acoustic model per (sound path, receiver) pair
//! and collects the receiver channels on its output ports. [`WavRender`]
//! drives a render core from sound files.
//!
//! # Example
//!
//! ```
//! use tascar_core::{ChunkConfig, Transport};
//! use tascar_audio::Wave;
//! use tascar_render::RenderCore;
//! use tascar_scene::Session;
//!
//! let session = Session::parse_str(r#"
//!     [[scene]]
//!     [[scene.source]]
//!     name = "src"
//!     position = [[0, 1, 0, 0]]
//!     [[scene.receiver]]
//!     name = "out"
//! "#).unwrap();
//! let cfg = ChunkConfig::new(44100.0, 64, 1);
//! let mut core = RenderCore::new(&session.scene[0], &cfg, &session.base_dir).unwrap();
//! let input = vec![Wave::new(64)];
//! let mut output = vec![Wave::new(64)];
//! core.process(&Transport::default(), &input, &mut output).unwrap();
//! assert_eq!(core.total_pointsources(), 1);
//! ```

pub mod acoustic;
pub mod directivity;
pub mod objects;
pub mod receivermod;
pub mod render_core;
pub mod speakerarray;
pub mod wavrender;
pub mod world;

use tascar_audio::AudioError;
use tascar_scene::SceneError;
use thiserror::Error;

pub use acoustic::{AcousticModel, DiffuseModel};
pub use directivity::DirectivityState;
pub use objects::{DiffuseField, Face, Mask, ObjectState, Receiver, Sound, Source};
pub use receivermod::{PanState, ReceiverModule};
pub use render_core::RenderCore;
pub use speakerarray::{Speaker, SpeakerArray};
pub use wavrender::{RenderStats, WavRender};
pub use world::{ReceiverGraph, World};

/// Errors raised while building or running a renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Inconsistent receiver or layout configuration.
    #[error("invalid render configuration: {0}")]
    Config(String),
    /// Session loading failed.
    #[error(transparent)]
    Scene(#[from] SceneError),
    /// Sound file I/O failed.
    #[error(transparent)]
    Audio(#[from] AudioError),
    /// The requested scene does not exist in the session.
    #[error("scene '{0}' not found")]
    UnknownScene(String),
    /// An input channel index is out of range.
    #[error("input channel number {channel} is not smaller than the number of input channels ({inputs})")]
    InputChannel {
        /// Requested channel.
        channel: usize,
        /// Number of input ports.
        inputs: usize,
    },
    /// Buffers passed to the renderer do not match its ports.
    #[error("expected {expected} {what} buffers, got {got}")]
    BufferCount {
        /// `input` or `output`.
        what: &'static str,
        /// Number of ports.
        expected: usize,
        /// Number of buffers.
        got: usize,
    },
}
