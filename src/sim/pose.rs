//! Position and facing of an entity on the battlefield
//!
//! Y is up. Yaw is in degrees, 0 faces +Z and positive yaw turns clockwise
//! when viewed from above (toward +X).

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{flat_distance, heading_degrees, normalize_degrees};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    /// Facing (degrees, normalized to (-180, 180])
    pub yaw: f32,
}

impl Pose {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw: normalize_degrees(yaw),
        }
    }

    /// Unit vector along the facing direction
    #[inline]
    pub fn forward(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        Vec3::new(yaw.sin(), 0.0, yaw.cos())
    }

    /// Horizontal distance to a point
    #[inline]
    pub fn distance_to(&self, point: Vec3) -> f32 {
        flat_distance(self.position, point)
    }

    /// Unsigned angle between the forward axis and the line to `point` (degrees, 0..=180)
    pub fn angle_to(&self, point: Vec3) -> f32 {
        let dir = point - self.position;
        let flat = Vec3::new(dir.x, 0.0, dir.z);
        if flat.length_squared() <= f32::EPSILON {
            return 0.0;
        }
        self.forward().angle_between(flat).to_degrees()
    }

    /// Orbit around `pivot` about the vertical axis, turning the facing by the same amount
    pub fn rotate_around(&mut self, pivot: Vec3, degrees: f32) {
        let rotation = Quat::from_rotation_y(degrees.to_radians());
        self.position = pivot + rotation * (self.position - pivot);
        self.yaw = normalize_degrees(self.yaw + degrees);
    }

    /// Step toward `target` by at most `max_delta`; a negative delta backs away
    ///
    /// Never overshoots the target when approaching. Backing away from a target
    /// sitting on the same spot steps straight backwards.
    pub fn move_towards(&mut self, target: Vec3, max_delta: f32) {
        let offset = target - self.position;
        let dist = offset.length();
        if dist <= f32::EPSILON {
            if max_delta < 0.0 {
                self.position += self.forward() * max_delta;
            } else {
                self.position = target;
            }
            return;
        }
        if dist <= max_delta {
            self.position = target;
            return;
        }
        self.position += offset / dist * max_delta;
    }

    /// Turn toward `point` by fraction `t` of the remaining yaw (shortest way round)
    pub fn turn_towards(&mut self, point: Vec3, t: f32) {
        let dir = point - self.position;
        if dir.x.abs() <= f32::EPSILON && dir.z.abs() <= f32::EPSILON {
            return;
        }
        let wanted = heading_degrees(dir);
        let delta = normalize_degrees(wanted - self.yaw);
        self.yaw = normalize_degrees(self.yaw + delta * t.clamp(0.0, 1.0));
    }
}
