//! Trajectories: positions and orientations over time.
//!
//! Both track types keep their key frames sorted by time. Evaluation clamps
//! to the first/last key frame outside the covered range, unless a loop
//! period is set, in which case the time is wrapped into `[0, loop)` first.

use crate::geometry::{Euler, PosExt};
use crate::table::Table1;
use crate::{GeometryError, DEG2RAD};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Interpolation mode of a position track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Linear interpolation of x, y and z.
    #[default]
    Cartesian,
    /// Linear interpolation of radius, azimuth and elevation.
    Spherical,
}

fn wrap_time(t: f64, period: f64) -> f64 {
    if period > 0.0 {
        t.rem_euclid(period)
    } else {
        t
    }
}

fn check_times(times: impl Iterator<Item = f64>) -> Result<(), GeometryError> {
    let mut last = f64::NEG_INFINITY;
    for (row, time) in times.enumerate() {
        if !(time > last) {
            return Err(GeometryError::NonMonotonicTime { row, time });
        }
        last = time;
    }
    Ok(())
}

/// Time-stamped list of positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionTrack {
    points: Vec<(f64, DVec3)>,
    /// Loop period in seconds, or zero for no looping.
    pub loop_period: f64,
    interpolation: Interpolation,
    time_dist: Table1,
    dist_time: Table1,
}

impl PositionTrack {
    /// Empty track (evaluates to the origin).
    pub fn new() -> Self {
        Self::default()
    }

    /// Track with a single, constant position.
    pub fn constant(p: DVec3) -> Self {
        let mut track = Self::new();
        track.insert(0.0, p);
        track
    }

    /// Build from rows of `[t, x, y, z]`; times must be strictly increasing.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, GeometryError> {
        let mut track = Self::new();
        for (row, values) in rows.iter().enumerate() {
            if values.len() != 4 {
                return Err(GeometryError::RowWidth {
                    row,
                    got: values.len(),
                    expected: 4,
                });
            }
        }
        check_times(rows.iter().map(|r| r[0]))?;
        for r in rows {
            track.points.push((r[0], DVec3::new(r[1], r[2], r[3])));
        }
        track.prepare();
        Ok(track)
    }

    /// Parse `t,x,y,z` lines. Commas, semicolons, tabs and spaces separate
    /// values; blank lines and lines starting with `#` are skipped.
    pub fn from_csv(text: &str) -> Result<Self, GeometryError> {
        let mut rows = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let values = line
                .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| GeometryError::Csv {
                    line: idx + 1,
                    reason: e.to_string(),
                })?;
            rows.push(values);
        }
        Self::from_rows(&rows)
    }

    /// Insert or replace a key frame.
    pub fn insert(&mut self, t: f64, p: DVec3) {
        match self.points.binary_search_by(|k| k.0.total_cmp(&t)) {
            Ok(idx) => self.points[idx].1 = p,
            Err(idx) => self.points.insert(idx, (t, p)),
        }
        self.prepare();
    }

    /// Key frames.
    pub fn points(&self) -> &[(f64, DVec3)] {
        &self.points
    }

    /// Number of key frames.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the track has no key frames.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Set interpolation mode.
    pub fn set_interpolation(&mut self, mode: Interpolation) {
        self.interpolation = mode;
    }

    /// First time stamp (zero when empty).
    pub fn t_min(&self) -> f64 {
        self.points.first().map(|p| p.0).unwrap_or(0.0)
    }

    /// Last time stamp (zero when empty).
    pub fn t_max(&self) -> f64 {
        self.points.last().map(|p| p.0).unwrap_or(0.0)
    }

    /// Covered time span.
    pub fn duration(&self) -> f64 {
        self.t_max() - self.t_min()
    }

    /// Mean of all key frame positions.
    pub fn center(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        self.points.iter().map(|p| p.1).sum::<DVec3>() / self.points.len() as f64
    }

    /// Travel length along the key frames.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].1 - w[0].1).length())
            .sum()
    }

    /// Rebuild the time/distance lookup tables.
    pub fn prepare(&mut self) {
        self.time_dist.clear();
        self.dist_time.clear();
        let mut dist = 0.0;
        let mut prev: Option<DVec3> = None;
        for (t, p) in &self.points {
            if let Some(q) = prev {
                dist += (*p - q).length();
            }
            self.time_dist.insert(*t, dist);
            self.dist_time.insert(dist, *t);
            prev = Some(*p);
        }
    }

    /// Travelled distance at time `t`.
    pub fn get_dist(&self, t: f64) -> f64 {
        self.time_dist.interp(t)
    }

    /// Time at which the travelled distance reaches `d`.
    pub fn get_time(&self, d: f64) -> f64 {
        self.dist_time.interp(d)
    }

    /// Interpolated position at time `t`.
    pub fn interp(&self, t: f64) -> DVec3 {
        self.interp_unwrapped(wrap_time(t, self.loop_period))
    }

    fn interp_unwrapped(&self, t: f64) -> DVec3 {
        let Some(first) = self.points.first() else {
            return DVec3::ZERO;
        };
        let idx = self.points.partition_point(|p| p.0 < t);
        if idx == self.points.len() {
            return self.points[idx - 1].1;
        }
        if idx == 0 {
            return first.1;
        }
        let (t2, p2) = self.points[idx];
        if t2 == t {
            return p2;
        }
        let (t1, p1) = self.points[idx - 1];
        let w = (t - t1) / (t2 - t1);
        match self.interpolation {
            Interpolation::Cartesian => p1 * (1.0 - w) + p2 * w,
            Interpolation::Spherical => {
                let r = (1.0 - w) * p1.length() + w * p2.length();
                let mut daz = p2.azim() - p1.azim();
                if daz > PI {
                    daz -= 2.0 * PI;
                } else if daz < -PI {
                    daz += 2.0 * PI;
                }
                let az = p1.azim() + w * daz;
                let el = (1.0 - w) * p1.elev() + w * p2.elev();
                DVec3::from_sphere(r, az, el)
            }
        }
    }

    /// Add `dt` to every time stamp.
    pub fn shift_time(&mut self, dt: f64) {
        for p in &mut self.points {
            p.0 += dt;
        }
        self.prepare();
    }

    /// Translate every key frame.
    pub fn translate(&mut self, d: DVec3) {
        for p in &mut self.points {
            p.1 += d;
        }
        self.prepare();
    }

    /// Scale every key frame per axis.
    pub fn scale(&mut self, s: DVec3) {
        for p in &mut self.points {
            p.1 *= s;
        }
        self.prepare();
    }

    /// Rotate every key frame.
    pub fn rotate(&mut self, e: Euler) {
        for p in &mut self.points {
            p.1 = e.rotate(p.1);
        }
        self.prepare();
    }

    /// Smooth positions by convolution with an `n`-point Hann window.
    pub fn smooth(&mut self, n: usize) {
        if n < 2 || self.points.len() < 2 {
            return;
        }
        let wnd: Vec<f64> = (0..n)
            .map(|k| 0.5 - 0.5 * (2.0 * PI * (k + 1) as f64 / (n + 1) as f64).cos())
            .collect();
        let wsum: f64 = wnd.iter().sum();
        let last = self.points.len() as isize - 1;
        let half = (n / 2) as isize;
        let smoothed: Vec<(f64, DVec3)> = (0..self.points.len())
            .map(|i| {
                let acc = wnd
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let idx = (i as isize + k as isize - half).clamp(0, last) as usize;
                        self.points[idx].1 * *w
                    })
                    .sum::<DVec3>();
                (self.points[i].0, acc / wsum)
            })
            .collect();
        self.points = smoothed;
        self.prepare();
    }

    /// Resample with equidistant time steps of `dt`.
    pub fn resample(&mut self, dt: f64) {
        if dt <= 0.0 || self.points.len() < 2 {
            return;
        }
        let t0 = self.t_min();
        let count = (self.duration() / dt).floor() as usize;
        let points = (0..=count)
            .map(|k| {
                let t = t0 + k as f64 * dt;
                (t, self.interp_unwrapped(t))
            })
            .collect();
        self.points = points;
        self.prepare();
    }

    /// Re-time the key frames so that the track is travelled at constant speed `v`.
    pub fn set_velocity_const(&mut self, v: f64) {
        if v <= 0.0 || self.points.is_empty() {
            return;
        }
        let t0 = self.t_min();
        let mut dist = 0.0;
        let mut prev = self.points[0].1;
        let mut retimed = Vec::with_capacity(self.points.len());
        for (k, (_, p)) in self.points.iter().enumerate() {
            if k > 0 {
                let step = (*p - prev).length();
                if step <= 0.0 {
                    continue;
                }
                dist += step;
            }
            retimed.push((t0 + dist / v, *p));
            prev = *p;
        }
        self.points = retimed;
        self.prepare();
    }
}

/// Time-stamped list of orientations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EulerTrack {
    points: Vec<(f64, Euler)>,
    /// Loop period in seconds, or zero for no looping.
    pub loop_period: f64,
}

impl EulerTrack {
    /// Empty track (evaluates to the identity rotation).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows of `[t, rz, ry, rx]` with angles in degrees.
    pub fn from_rows_deg(rows: &[Vec<f64>]) -> Result<Self, GeometryError> {
        for (row, values) in rows.iter().enumerate() {
            if values.len() != 4 {
                return Err(GeometryError::RowWidth {
                    row,
                    got: values.len(),
                    expected: 4,
                });
            }
        }
        check_times(rows.iter().map(|r| r[0]))?;
        Ok(Self {
            points: rows
                .iter()
                .map(|r| {
                    (
                        r[0],
                        Euler::new(r[1] * DEG2RAD, r[2] * DEG2RAD, r[3] * DEG2RAD),
                    )
                })
                .collect(),
            loop_period: 0.0,
        })
    }

    /// Insert or replace a key frame.
    pub fn insert(&mut self, t: f64, e: Euler) {
        match self.points.binary_search_by(|k| k.0.total_cmp(&t)) {
            Ok(idx) => self.points[idx].1 = e,
            Err(idx) => self.points.insert(idx, (t, e)),
        }
    }

    /// Key frames.
    pub fn points(&self) -> &[(f64, Euler)] {
        &self.points
    }

    /// Interpolated orientation at time `t`.
    pub fn interp(&self, t: f64) -> Euler {
        let Some(first) = self.points.first() else {
            return Euler::ZERO;
        };
        let t = wrap_time(t, self.loop_period);
        let idx = self.points.partition_point(|p| p.0 < t);
        if idx == self.points.len() {
            return self.points[idx - 1].1;
        }
        if idx == 0 {
            return first.1;
        }
        let (t2, e2) = self.points[idx];
        if t2 == t {
            return e2;
        }
        let (t1, e1) = self.points[idx - 1];
        let w = (t - t1) / (t2 - t1);
        e1 * (1.0 - w) + e2 * w
    }
}
