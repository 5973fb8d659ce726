//! Planar polygons used as reflectors.

use crate::geometry::{Euler, PosExt};
use crate::GeometryError;
use glam::DVec3;

/// A planar polygon with a local shape and a global placement.
///
/// The face normal follows the right-hand rule over the vertex order.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    local_verts: Vec<DVec3>,
    verts: Vec<DVec3>,
    edges: Vec<DVec3>,
    edge_normals: Vec<DVec3>,
    normal: DVec3,
    local_normal: DVec3,
    area: f64,
    aperture: f64,
    delta: DVec3,
    orientation: Euler,
}

impl Default for Polygon {
    fn default() -> Self {
        // 1 m x 2 m rectangle, as used for reflectors without explicit size.
        Self::rectangle(1.0, 2.0)
    }
}

impl Polygon {
    /// Create a polygon from at least three local vertices.
    pub fn from_vertices(verts: Vec<DVec3>) -> Result<Self, GeometryError> {
        if verts.len() < 3 {
            return Err(GeometryError::TooFewVertices(verts.len()));
        }
        let mut newell = DVec3::ZERO;
        for k in 0..verts.len() {
            newell += verts[k].cross(verts[(k + 1) % verts.len()]);
        }
        let area = 0.5 * newell.length();
        let local_normal = newell.normal();
        let mut poly = Self {
            local_verts: verts,
            verts: Vec::new(),
            edges: Vec::new(),
            edge_normals: Vec::new(),
            normal: local_normal,
            local_normal,
            area,
            aperture: 0.0,
            delta: DVec3::ZERO,
            orientation: Euler::ZERO,
        };
        poly.update();
        Ok(poly)
    }

    /// Rectangle in the y-z plane with its normal along +x.
    pub fn rectangle(width: f64, height: f64) -> Self {
        let verts = vec![
            DVec3::ZERO,
            DVec3::new(0.0, width, 0.0),
            DVec3::new(0.0, width, height),
            DVec3::new(0.0, 0.0, height),
        ];
        match Self::from_vertices(verts) {
            Ok(p) => p,
            Err(_) => unreachable!("rectangle always has four vertices"),
        }
    }

    /// Place the polygon: rotate local vertices by `orientation`, then translate by `origin`.
    pub fn apply_rot_loc(&mut self, origin: DVec3, orientation: Euler) {
        self.delta = origin;
        self.orientation = orientation;
        self.update();
    }

    fn update(&mut self) {
        let o = self.orientation;
        let d = self.delta;
        self.verts = self.local_verts.iter().map(|v| o.rotate(*v) + d).collect();
        self.normal = o.rotate(self.local_normal);
        let n = self.verts.len();
        self.edges = (0..n)
            .map(|k| self.verts[(k + 1) % n] - self.verts[k])
            .collect();
        self.edge_normals = self
            .edges
            .iter()
            .map(|e| e.cross(self.normal).normal())
            .collect();
        let center = self.verts.iter().copied().sum::<DVec3>() / n as f64;
        self.aperture = 2.0
            * self
                .verts
                .iter()
                .map(|v| (*v - center).length())
                .fold(0.0, f64::max);
    }

    /// Global vertices.
    pub fn verts(&self) -> &[DVec3] {
        &self.verts
    }

    /// Global edge vectors (from vertex k to k+1).
    pub fn edges(&self) -> &[DVec3] {
        &self.edges
    }

    /// Global face normal (unit length).
    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// Face area.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Largest extent of the face.
    pub fn aperture(&self) -> f64 {
        self.aperture
    }

    /// Signed distance of `p` to the plane (positive on the normal side).
    pub fn plane_distance(&self, p: DVec3) -> f64 {
        (p - self.verts[0]).dot(self.normal)
    }

    /// True if `p` is on the normal side of the plane.
    pub fn is_infront(&self, p: DVec3) -> bool {
        self.plane_distance(p) > 0.0
    }

    /// True if `p` is on the back side of the plane.
    pub fn is_behind(&self, p: DVec3) -> bool {
        self.plane_distance(p) < 0.0
    }

    /// Orthogonal projection of `p` onto the infinite plane.
    pub fn nearest_on_plane(&self, p: DVec3) -> DVec3 {
        p - self.normal * self.plane_distance(p)
    }

    /// Nearest point on the polygon boundary and the index of its edge.
    pub fn nearest_on_edge(&self, p: DVec3) -> (DVec3, usize) {
        let mut best = (edge_nearest(self.verts[0], self.edges[0], p), 0);
        let mut best_dist = (best.0 - p).length_squared();
        for k in 1..self.verts.len() {
            let candidate = edge_nearest(self.verts[k], self.edges[k], p);
            let d = (candidate - p).length_squared();
            if d < best_dist {
                best_dist = d;
                best = (candidate, k);
            }
        }
        best
    }

    /// Nearest point on the (finite) polygon and whether the projection fell outside it.
    pub fn nearest(&self, p: DVec3) -> (DVec3, bool) {
        let on_plane = self.nearest_on_plane(p);
        let outside = self
            .verts
            .iter()
            .zip(&self.edge_normals)
            .any(|(v, en)| (on_plane - *v).dot(*en) > 0.0);
        if outside {
            (self.nearest_on_edge(p).0, true)
        } else {
            (on_plane, false)
        }
    }

    /// Intersection of the line p0-p1 with the infinite plane.
    ///
    /// Returns the intersection point and the weight `w` with `w = 0` at `p0`
    /// and `w = 1` at `p1`, or `None` if the line is parallel to the plane.
    pub fn intersection(&self, p0: DVec3, p1: DVec3) -> Option<(DVec3, f64)> {
        let dir = p1 - p0;
        let denom = dir.dot(self.normal);
        if denom.abs() < 1e-12 {
            return None;
        }
        let w = (self.verts[0] - p0).dot(self.normal) / denom;
        Some((p0 + dir * w, w))
    }
}

/// Nearest point to `p` on the segment starting at `v` with direction `d`.
pub fn edge_nearest(v: DVec3, d: DVec3, p: DVec3) -> DVec3 {
    let len2 = d.length_squared();
    if len2 <= 0.0 {
        return v;
    }
    let t = ((p - v).dot(d) / len2).clamp(0.0, 1.0);
    v + d * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_has_positive_x_normal_and_area() {
        let r = Polygon::rectangle(2.0, 3.0);
        assert!((r.normal() - DVec3::X).length() < 1e-12);
        assert!((r.area() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn too_few_vertices_rejected() {
        let err = Polygon::from_vertices(vec![DVec3::ZERO, DVec3::X]).unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices(2));
    }

    #[test]
    fn nearest_inside_and_outside() {
        let r = Polygon::rectangle(2.0, 2.0);
        let (p, outside) = r.nearest(DVec3::new(3.0, 1.0, 1.0));
        assert!(!outside);
        assert!((p - DVec3::new(0.0, 1.0, 1.0)).length() < 1e-12);
        let (p, outside) = r.nearest(DVec3::new(1.0, 5.0, 1.0));
        assert!(outside);
        assert!((p - DVec3::new(0.0, 2.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn placement_moves_plane() {
        let mut r = Polygon::rectangle(1.0, 1.0);
        r.apply_rot_loc(DVec3::new(4.0, 0.0, 0.0), Euler::new(std::f64::consts::PI, 0.0, 0.0));
        assert!((r.normal() + DVec3::X).length() < 1e-9);
        assert!(r.is_infront(DVec3::new(1.0, 0.0, 0.0)));
        assert!(r.is_behind(DVec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn line_intersection_weight() {
        let r = Polygon::rectangle(1.0, 1.0);
        let (p, w) = r
            .intersection(DVec3::new(-1.0, 0.5, 0.5), DVec3::new(3.0, 0.5, 0.5))
            .expect("not parallel");
        assert!((w - 0.25).abs() < 1e-12);
        assert!(p.x.abs() < 1e-12);
        assert!(r.intersection(DVec3::ZERO, DVec3::Y).is_none());
    }
}
