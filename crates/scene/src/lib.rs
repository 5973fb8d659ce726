#![warn(missing_docs)]
//! Scene description format for tascar.
//!
//! A session file is TOML. It holds session metadata and one or more
//! scenes; every scene lists its sources (with sounds), receivers,
//! reflecting faces, diffuse sound fields and masks. Loudspeaker layouts
//! for speaker-based receivers are either inline or separate TOML files
//! referenced relative to the session file.

pub mod layout;
pub mod objects;
pub mod session;

use std::path::PathBuf;
use tascar_core::GeometryError;
use thiserror::Error;

pub use layout::{SpeakerDesc, SpeakerLayout};
pub use objects::{
    DiffuseDesc, Directivity, FaceDesc, GainModel, MaskDesc, ObjectDesc, ReceiverDesc,
    ReceiverKind, SoundDesc, SourceDesc, ALL_LAYERS,
};
pub use session::{SceneDesc, Session, SessionInfo};

/// Errors emitted while loading or validating a session.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Wrap IO failures when reading session, layout or trajectory files.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Wrap TOML parsing issues.
    #[error("failed to parse scene description: {0}")]
    Parse(#[from] toml::de::Error),
    /// Invalid polygon or trajectory.
    #[error("object '{object}': {source}")]
    Geometry {
        /// Name of the offending object.
        object: String,
        /// Underlying error.
        source: GeometryError,
    },
    /// Validation errors describing why the description is inconsistent.
    #[error("invalid scene description: {0}")]
    Invalid(String),
}

impl SceneError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn geometry(object: &str, source: GeometryError) -> Self {
        Self::Geometry {
            object: object.to_string(),
            source,
        }
    }
}
