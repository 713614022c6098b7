//! Encounter state
//!
//! Everything the simulation advances lives here. Given the same seed and the
//! same inputs, an encounter plays out identically.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::group::{AttackTiming, Group, GroupEvent};
use super::pose::Pose;
use super::target::{Arena, Hero, TargetId};
use super::unit::{Unit, UnitId, UnitStats};

/// A group event stamped with the tick it happened on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub tick: u64,
    pub event: GroupEvent,
}

/// One group hunting the heroes in an arena
#[derive(Debug, Clone)]
pub struct Encounter {
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub group: Group,
    pub arena: Arena,
    /// Everything the group reported, oldest first
    pub log: Vec<LoggedEvent>,
    next_id: u32,
}

impl Encounter {
    pub fn new(seed: u64, timing: AttackTiming) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            group: Group::new(1, timing),
            arena: Arena::default(),
            log: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID (shared by units and heroes)
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn_unit(&mut self, stats: UnitStats, position: Vec3, yaw: f32) -> UnitId {
        let id = self.next_entity_id();
        let group = self.group.id;
        self.group
            .add_unit(Unit::new(id, group, stats, Pose::new(position, yaw)));
        id
    }

    pub fn spawn_hero(
        &mut self,
        position: Vec3,
        yaw: f32,
        max_health: f32,
        speed: f32,
    ) -> TargetId {
        let id = self.next_entity_id();
        self.arena
            .heroes
            .push(Hero::new(id, Pose::new(position, yaw), max_health, speed));
        self.normalize_order();
        id
    }

    /// First hero in the arena, if any
    pub fn hero(&self) -> Option<&Hero> {
        self.arena.heroes.first()
    }

    /// Split borrows for the group tick
    pub(crate) fn parts_mut(&mut self) -> (&mut Group, &mut Arena, &mut Pcg32) {
        (&mut self.group, &mut self.arena, &mut self.rng)
    }

    /// Ensure heroes are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.arena.heroes.sort_by_key(|h| h.id);
    }

    /// Encounter is over once every hero or every unit is dead
    pub fn is_finished(&self) -> bool {
        self.arena.heroes.iter().all(|h| h.health <= 0.0) || self.group.alive_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_assigns_unique_ids() {
        let mut encounter = Encounter::new(7, AttackTiming::default());
        let a = encounter.spawn_unit(UnitStats::default(), Vec3::ZERO, 0.0);
        let b = encounter.spawn_unit(UnitStats::default(), Vec3::X, 0.0);
        let h = encounter.spawn_hero(Vec3::Z, 180.0, 100.0, 5.0);
        assert_ne!(a, b);
        assert_ne!(b, h);
        assert_eq!(encounter.group.units().len(), 2);
        assert_eq!(encounter.group.unit(a).unwrap().group, encounter.group.id);
        assert_eq!(encounter.hero().unwrap().id, h);
    }

    #[test]
    fn test_finished_when_one_side_falls() {
        let mut encounter = Encounter::new(7, AttackTiming::default());
        let u = encounter.spawn_unit(UnitStats::default(), Vec3::ZERO, 0.0);
        encounter.spawn_hero(Vec3::Z, 180.0, 100.0, 5.0);
        assert!(!encounter.is_finished());
        encounter.group.unit_mut(u).unwrap().take_damage(1000.0);
        assert!(encounter.is_finished());
    }
}
