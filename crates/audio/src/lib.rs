#![warn(missing_docs)]
//! Audio building blocks for tascar.
//!
//! Provides the sample containers, delay lines and file I/O used by the
//! renderer.
//!
//! # Architecture
//!
//! - [`Wave`] - Mono block of `f32` samples
//! - [`Amb1Wave`] - First-order Ambisonics block (W, X, Y, Z)
//! - [`VariDelay`] - Variable delay line addressed by distance
//! - [`StaticDelay`] - Fixed integer delay
//! - [`LevelMeter`] - Running RMS in dB SPL
//! - [`read_wav`] / [`WavSink`] - WAV file input and output
//!
//! # Example
//!
//! ```
//! use tascar_audio::{VariDelay, Wave};
//!
//! let mut dline = VariDelay::new(100, 1000.0, 340.0, 0);
//! let mut out = Wave::new(8);
//! for (k, y) in out.iter_mut().enumerate() {
//!     let x = if k == 0 { 1.0 } else { 0.0 };
//!     *y = dline.get_dist_push(1.7, x);
//! }
//! assert_eq!(out[5], 1.0);
//! ```

mod delayline;
mod levelmeter;
mod wave;
mod wavfile;

pub use delayline::{SincTable, StaticDelay, VariDelay};
pub use levelmeter::LevelMeter;
pub use wave::{Amb1Wave, Wave, MIN3DB};
pub use wavfile::{read_wav, write_wav, SoundFile, WavSink};

use thiserror::Error;

/// Errors raised by audio file handling.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Underlying file system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// WAV encoder or decoder error.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    /// Number of channels passed to a writer did not match its header.
    #[error("expected {expected} channels, got {got}")]
    ChannelMismatch {
        /// Channels in the file header.
        expected: usize,
        /// Channels supplied.
        got: usize,
    },
    /// Unsupported sample format.
    #[error("unsupported sample format: {0}")]
    Format(String),
}
