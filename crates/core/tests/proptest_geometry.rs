//! Property-based tests for geometry and trajectories
//!
//! Validates:
//! - Euler rotation followed by its inverse is the identity
//! - Rotations preserve length
//! - Track interpolation stays within the bounding box of its key frames
//! - Looped tracks are periodic

use proptest::prelude::*;
use tascar_core::{DVec3, Euler, PositionTrack};

fn angle() -> impl Strategy<Value = f64> {
    -3.1f64..3.1
}

fn coord() -> impl Strategy<Value = f64> {
    -100.0f64..100.0
}

proptest! {
    /// Property: rotate then rotate_inverse returns the input point
    #[test]
    fn euler_inverse_round_trips(
        z in angle(), y in angle(), x in angle(),
        px in coord(), py in coord(), pz in coord(),
    ) {
        let e = Euler::new(z, y, x);
        let p = DVec3::new(px, py, pz);
        let back = e.rotate_inverse(e.rotate(p));
        prop_assert!((back - p).length() < 1e-9 * (1.0 + p.length()));
    }

    /// Property: rotations never change the distance to the origin
    #[test]
    fn rotation_preserves_length(
        z in angle(), y in angle(), x in angle(),
        px in coord(), py in coord(), pz in coord(),
    ) {
        let p = DVec3::new(px, py, pz);
        let r = Euler::new(z, y, x).rotate(p);
        prop_assert!((r.length() - p.length()).abs() < 1e-9 * (1.0 + p.length()));
    }

    /// Property: cartesian interpolation never leaves the key frame bounding box
    #[test]
    fn interpolation_stays_in_bounds(
        pts in prop::collection::vec((coord(), coord(), coord()), 2..8),
        t in -5.0f64..20.0,
    ) {
        let rows: Vec<Vec<f64>> = pts
            .iter()
            .enumerate()
            .map(|(k, (x, y, z))| vec![k as f64 * 1.5, *x, *y, *z])
            .collect();
        let track = PositionTrack::from_rows(&rows).expect("monotonic rows");
        let lo = pts.iter().fold(DVec3::splat(f64::MAX), |a, p| a.min(DVec3::new(p.0, p.1, p.2)));
        let hi = pts.iter().fold(DVec3::splat(f64::MIN), |a, p| a.max(DVec3::new(p.0, p.1, p.2)));
        let p = track.interp(t);
        prop_assert!(p.cmpge(lo - 1e-9).all() && p.cmple(hi + 1e-9).all());
    }

    /// Property: looped tracks repeat with their loop period
    #[test]
    fn looped_track_is_periodic(t in 0.0f64..10.0, periods in 1i32..4) {
        let mut track = PositionTrack::from_rows(&[
            vec![0.0, 0.0, 0.0, 0.0],
            vec![1.0, 3.0, -1.0, 2.0],
            vec![2.0, 0.0, 4.0, 0.0],
        ])
        .expect("monotonic rows");
        track.loop_period = 2.0;
        let a = track.interp(t);
        let b = track.interp(t + 2.0 * periods as f64);
        prop_assert!((a - b).length() < 1e-6);
    }
}
