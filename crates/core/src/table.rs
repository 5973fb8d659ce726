//! Linear interpolation tables.

/// Sorted lookup table with clamped linear interpolation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table1 {
    points: Vec<(f64, f64)>,
}

impl Table1 {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a point, keeping keys sorted.
    pub fn insert(&mut self, x: f64, y: f64) {
        match self.points.binary_search_by(|p| p.0.total_cmp(&x)) {
            Ok(idx) => self.points[idx].1 = y,
            Err(idx) => self.points.insert(idx, (x, y)),
        }
    }

    /// Remove all points.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the table has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Interpolated value; clamps to the first/last value outside the range
    /// and returns zero for an empty table.
    pub fn interp(&self, x: f64) -> f64 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };
        let idx = self.points.partition_point(|p| p.0 < x);
        if idx == self.points.len() {
            return self.points[idx - 1].1;
        }
        if idx == 0 {
            return first.1;
        }
        let (x2, y2) = self.points[idx];
        if x2 == x {
            return y2;
        }
        let (x1, y1) = self.points[idx - 1];
        let mut w = (x - x1) / (x2 - x1);
        if !w.is_finite() {
            w = 0.0;
        }
        (1.0 - w) * y1 + w * y2
    }
}
