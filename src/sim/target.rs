//! Targets the group hunts, and the spatial queries units sense them through
//!
//! Units never own a target; they hold its [`TargetId`] and look it up through
//! [`Surroundings`] each tick, so a target that leaves the arena simply stops
//! resolving.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::pose::Pose;
use crate::consts::TARGET_COMMIT_FRACTION;

pub type TargetId = u32;

/// What the group needs to know about (and do to) whatever it is fighting
pub trait Target {
    fn id(&self) -> TargetId;
    fn pose(&self) -> &Pose;
    fn health(&self) -> f32;
    fn max_health(&self) -> f32;
    /// Current locomotion speed
    fn current_speed(&self) -> f32;
    /// Top locomotion speed
    fn max_speed(&self) -> f32;
    fn apply_damage(&mut self, amount: f32);

    fn position(&self) -> Vec3 {
        self.pose().position
    }

    fn is_dead(&self) -> bool {
        self.health() <= 0.0
    }

    fn is_damaged(&self) -> bool {
        self.health() < self.max_health()
    }

    /// Moving faster than half its top speed: it has committed to a move
    fn is_moving_fast(&self) -> bool {
        self.current_speed() > self.max_speed() * TARGET_COMMIT_FRACTION
    }
}

/// Spatial sensing plus target lookup
pub trait Surroundings {
    type Target: Target;

    /// Every target within `radius` of `origin`, in stable id order
    fn candidates_within(&self, origin: Vec3, radius: f32) -> Vec<TargetId>;

    fn target(&self, id: TargetId) -> Option<&Self::Target>;

    fn target_mut(&mut self, id: TargetId) -> Option<&mut Self::Target>;
}

/// A player-controlled (or scripted) combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hero {
    pub id: TargetId,
    pub pose: Pose,
    pub health: f32,
    pub max_health: f32,
    /// Top speed
    pub movement_speed: f32,
    /// Speed this tick (0 when standing still)
    #[serde(default)]
    pub current_speed: f32,
}

impl Hero {
    pub fn new(id: TargetId, pose: Pose, max_health: f32, movement_speed: f32) -> Self {
        Self {
            id,
            pose,
            health: max_health,
            max_health,
            movement_speed,
            current_speed: 0.0,
        }
    }

    /// Move along `direction` at `throttle` (0..=1) of top speed, facing the way it walks
    pub fn walk(&mut self, direction: Vec3, throttle: f32, dt: f32) {
        let flat = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero();
        let throttle = throttle.clamp(0.0, 1.0);
        if flat == Vec3::ZERO || throttle == 0.0 {
            self.current_speed = 0.0;
            return;
        }
        self.current_speed = self.movement_speed * throttle;
        self.pose.position += flat * self.current_speed * dt;
        self.pose.yaw = crate::heading_degrees(flat);
    }
}

impl Target for Hero {
    fn id(&self) -> TargetId {
        self.id
    }

    fn pose(&self) -> &Pose {
        &self.pose
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn max_health(&self) -> f32 {
        self.max_health
    }

    fn current_speed(&self) -> f32 {
        self.current_speed
    }

    fn max_speed(&self) -> f32 {
        self.movement_speed
    }

    fn apply_damage(&mut self, amount: f32) {
        self.health -= amount;
    }
}

/// Every target in the encounter, sorted by id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    pub heroes: Vec<Hero>,
}

impl Arena {
    pub fn new(mut heroes: Vec<Hero>) -> Self {
        heroes.sort_by_key(|h| h.id);
        Self { heroes }
    }

    pub fn remove(&mut self, id: TargetId) -> Option<Hero> {
        let idx = self.heroes.iter().position(|h| h.id == id)?;
        Some(self.heroes.remove(idx))
    }
}

impl Surroundings for Arena {
    type Target = Hero;

    fn candidates_within(&self, origin: Vec3, radius: f32) -> Vec<TargetId> {
        self.heroes
            .iter()
            .filter(|h| h.pose.position.distance(origin) <= radius)
            .map(|h| h.id)
            .collect()
    }

    fn target(&self, id: TargetId) -> Option<&Hero> {
        self.heroes.iter().find(|h| h.id == id)
    }

    fn target_mut(&mut self, id: TargetId) -> Option<&mut Hero> {
        self.heroes.iter_mut().find(|h| h.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_threshold() {
        let mut hero = Hero::new(1, Pose::default(), 100.0, 6.0);
        assert!(!hero.is_moving_fast());
        hero.current_speed = 3.0;
        assert!(!hero.is_moving_fast());
        hero.current_speed = 3.5;
        assert!(hero.is_moving_fast());
    }

    #[test]
    fn test_walk_updates_speed_and_facing() {
        let mut hero = Hero::new(1, Pose::default(), 100.0, 4.0);
        hero.walk(Vec3::X, 0.5, 1.0);
        assert_eq!(hero.current_speed, 2.0);
        assert!((hero.pose.position - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
        assert!((hero.pose.yaw - 90.0).abs() < 1e-4);

        hero.walk(Vec3::ZERO, 1.0, 1.0);
        assert_eq!(hero.current_speed, 0.0);
    }

    #[test]
    fn test_candidates_within_radius() {
        let arena = Arena::new(vec![
            Hero::new(2, Pose::new(Vec3::new(20.0, 0.0, 0.0), 0.0), 100.0, 5.0),
            Hero::new(1, Pose::new(Vec3::new(3.0, 0.0, 0.0), 0.0), 100.0, 5.0),
        ]);
        assert_eq!(arena.candidates_within(Vec3::ZERO, 10.0), vec![1]);
        assert_eq!(arena.candidates_within(Vec3::ZERO, 25.0), vec![1, 2]);
    }

    #[test]
    fn test_damage_and_death() {
        let mut arena = Arena::new(vec![Hero::new(7, Pose::default(), 30.0, 5.0)]);
        let hero = arena.target_mut(7).unwrap();
        hero.apply_damage(10.0);
        assert!(hero.is_damaged());
        hero.apply_damage(25.0);
        assert!(hero.is_dead());
        assert!(arena.remove(7).is_some());
        assert!(arena.target(7).is_none());
    }
}
