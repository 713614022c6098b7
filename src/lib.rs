//! Encircle - group combat AI for a pack of melee units
//!
//! Core modules:
//! - `sim`: Deterministic simulation (angle oracle, units, formation, group coordinator)
//! - `config`: Serde-backed encounter configuration

pub mod config;
pub mod sim;

pub use config::{ConfigError, EncounterConfig};

use glam::Vec3;

/// Simulation constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// How long a strike holds the unit in place (seconds)
    pub const STRIKE_DURATION: f32 = 1.3;

    /// Width of the slow-correction band around a formation bearing (degrees)
    pub const FORMATION_MARGIN_OF_ERROR: f32 = 10.0;
    /// Orbit rate multiplier for fast correction (degrees per unit of speed per second)
    pub const FAST_ORBIT_MULTIPLIER: f32 = 10.0;
    /// Orbit rate multiplier for slow correction, applied to half the unit speed
    pub const SLOW_ORBIT_MULTIPLIER: f32 = 5.0;

    /// Yaw interpolation rate when facing a target (fraction per second, clamped to 1)
    pub const LOOK_AT_RATE: f32 = 50.0;

    /// Target counts as "committed" when moving faster than this fraction of its max speed
    pub const TARGET_COMMIT_FRACTION: f32 = 0.5;
    /// Speed multiplier for distance keeping while the target is committed
    pub const WAIT_SPEED_FACTOR: f32 = 0.25;

    /// Group turns Offensive when target health is below this fraction of group health
    pub const OFFENSIVE_HEALTH_RATIO: f32 = 0.75;
}

/// Normalize an angle in degrees to (-180, 180]
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// World heading of a horizontal direction, in degrees (0 = +Z, 90 = +X)
#[inline]
pub fn heading_degrees(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z).to_degrees()
}

/// Signed bearing of `point` relative to an observer at `origin` facing `yaw`
///
/// Positive bearings are clockwise when viewed from above.
#[inline]
pub fn bearing_degrees(origin: Vec3, yaw: f32, point: Vec3) -> f32 {
    normalize_degrees(heading_degrees(point - origin) - yaw)
}

/// Distance between two points projected onto the horizontal plane
#[inline]
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    let d = b - a;
    (d.x * d.x + d.z * d.z).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees_range() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(190.0), -170.0);
        assert_eq!(normalize_degrees(-190.0), 170.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
    }

    #[test]
    fn test_bearing_relative_to_yaw() {
        let origin = Vec3::ZERO;
        // Straight ahead
        assert!(bearing_degrees(origin, 0.0, Vec3::new(0.0, 0.0, 5.0)).abs() < 1e-4);
        // To the right (+X) is +90 when facing +Z
        assert!((bearing_degrees(origin, 0.0, Vec3::new(5.0, 0.0, 0.0)) - 90.0).abs() < 1e-4);
        // Facing +X, a point on +X is dead ahead
        assert!(bearing_degrees(origin, 90.0, Vec3::new(5.0, 0.0, 0.0)).abs() < 1e-4);
        // Behind wraps to 180
        assert!((bearing_degrees(origin, 0.0, Vec3::new(0.0, 0.0, -5.0)) - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_flat_distance_ignores_height() {
        let d = flat_distance(Vec3::new(0.0, 10.0, 0.0), Vec3::new(3.0, -4.0, 4.0));
        assert!((d - 5.0).abs() < 1e-5);
    }
}
