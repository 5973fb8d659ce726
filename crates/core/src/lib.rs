#![warn(missing_docs)]
//! Core primitives shared across the workspace: geometry, trajectories and
//! transport bookkeeping.

pub mod dynobject;
pub mod geometry;
pub mod polygon;
pub mod table;
pub mod track;
pub mod transport;

use thiserror::Error;

// Re-export commonly used types
pub use dynobject::{DynObject, Pose};
pub use geometry::{Euler, PosExt, RotMat, Shoebox};
pub use glam::DVec3;
pub use polygon::Polygon;
pub use table::Table1;
pub use track::{EulerTrack, Interpolation, PositionTrack};
pub use transport::{ChunkConfig, Transport};

/// Degrees to radians.
pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;
/// Radians to degrees.
pub const RAD2DEG: f64 = 180.0 / std::f64::consts::PI;
/// Default speed of sound in m/s.
pub const SPEED_OF_SOUND: f64 = 340.0;

/// Errors raised while building geometric objects or trajectories.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    /// A polygon needs at least three vertices.
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    /// A trajectory row did not have the expected number of columns.
    #[error("trajectory row {row} has {got} values, expected {expected}")]
    RowWidth {
        /// Zero-based row index.
        row: usize,
        /// Number of values found.
        got: usize,
        /// Number of values required.
        expected: usize,
    },
    /// Trajectory time stamps must be strictly increasing.
    #[error("trajectory time {time} at row {row} is not increasing")]
    NonMonotonicTime {
        /// Zero-based row index.
        row: usize,
        /// Offending time stamp.
        time: f64,
    },
    /// A CSV trajectory line could not be parsed.
    #[error("invalid trajectory line {line}: {reason}")]
    Csv {
        /// One-based line number.
        line: usize,
        /// Parser message.
        reason: String,
    },
}

/// Flush denormals and non-finite values to zero.
pub fn make_friendly_number(x: f32) -> f32 {
    if x.is_finite() && !x.is_subnormal() {
        x
    } else {
        0.0
    }
}

/// Convert a gain in dB to a linear factor.
pub fn db2lin(db: f64) -> f64 {
    10f64.powf(0.05 * db)
}

/// Convert a linear factor to dB.
pub fn lin2db(lin: f64) -> f64 {
    20.0 * lin.abs().log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friendly_number_flushes_denormals_and_infinity() {
        assert_eq!(make_friendly_number(1.0e-40), 0.0);
        assert_eq!(make_friendly_number(f32::INFINITY), 0.0);
        assert_eq!(make_friendly_number(f32::NAN), 0.0);
        assert_eq!(make_friendly_number(0.25), 0.25);
    }

    #[test]
    fn db_conversion_round_trips() {
        assert!((db2lin(-6.0) - 0.501187).abs() < 1e-5);
        assert!((lin2db(db2lin(-12.5)) + 12.5).abs() < 1e-9);
    }
}
