//! Objects that move along a trajectory.

use crate::geometry::Euler;
use crate::track::{EulerTrack, PositionTrack};
use glam::DVec3;

/// Position and orientation of an object at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    /// Global position.
    pub position: DVec3,
    /// Global orientation.
    pub orientation: Euler,
}

/// A scene object with a location and an orientation trajectory.
#[derive(Debug, Clone, Default)]
pub struct DynObject {
    /// Location trajectory (object time).
    pub location: PositionTrack,
    /// Orientation trajectory (object time).
    pub orientation: EulerTrack,
    /// Session time at which object time zero starts.
    pub start: f64,
    /// Offset added to the interpolated location.
    pub dlocation: DVec3,
    /// Offset added to the interpolated orientation.
    pub dorientation: Euler,
    /// Position in the object's own coordinate system.
    pub localpos: DVec3,
    /// If non-zero, orientation follows the travel direction measured over this distance.
    pub sampled_orientation: f64,
    pose: Pose,
    pose_nodelta: Pose,
}

impl DynObject {
    /// Object resting at `position`.
    pub fn at(position: DVec3) -> Self {
        let mut obj = Self {
            location: PositionTrack::constant(position),
            ..Self::default()
        };
        obj.geometry_update(0.0);
        obj
    }

    /// Object following `location` and `orientation` from session time `start`.
    ///
    /// The pose is evaluated at `start`.
    pub fn new(
        location: PositionTrack,
        orientation: EulerTrack,
        start: f64,
        dlocation: DVec3,
        dorientation: Euler,
        sampled_orientation: f64,
    ) -> Self {
        let mut obj = Self {
            location,
            orientation,
            start,
            dlocation,
            dorientation,
            sampled_orientation,
            ..Self::default()
        };
        obj.geometry_update(start);
        obj
    }

    /// Evaluate the trajectories at session time `t`.
    pub fn geometry_update(&mut self, t: f64) -> Pose {
        let local_time = t - self.start;
        let position = self.location.interp(local_time);
        let orientation = if self.sampled_orientation == 0.0 {
            self.orientation.interp(local_time)
        } else {
            let dist = self.location.get_dist(local_time) - self.sampled_orientation;
            let earlier = self.location.interp(self.location.get_time(dist));
            let mut dir = position - earlier;
            if self.sampled_orientation < 0.0 {
                dir = -dir;
            }
            if dir.length_squared() > 0.0 {
                Euler::from_direction(dir)
            } else {
                self.pose_nodelta.orientation
            }
        };
        self.pose_nodelta = Pose {
            position,
            orientation,
        };
        let orientation = orientation + self.dorientation;
        self.pose = Pose {
            position: position + self.dlocation + orientation.rotate(self.localpos),
            orientation,
        };
        self.pose
    }

    /// Pose computed by the last [`geometry_update`](Self::geometry_update).
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Pose without the delta location and orientation.
    pub fn pose_nodelta(&self) -> Pose {
        self.pose_nodelta
    }

    /// Last evaluated global position.
    pub fn location(&self) -> DVec3 {
        self.pose.position
    }

    /// Last evaluated global orientation.
    pub fn orientation(&self) -> Euler {
        self.pose.orientation
    }
}
