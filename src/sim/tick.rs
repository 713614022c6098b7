//! Fixed timestep simulation tick
//!
//! Applies external input (hero movement, collision contacts, hits on units),
//! then runs the group pipeline and stamps its events into the encounter log.

use glam::Vec3;

use super::state::{Encounter, LoggedEvent};
use super::target::TargetId;
use super::unit::UnitId;

/// Locomotion command for one hero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeroWalk {
    pub hero: TargetId,
    pub direction: Vec3,
    /// Fraction of top speed (0..=1)
    pub throttle: f32,
}

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Heroes without a command stand still
    pub walks: Vec<HeroWalk>,
    /// Collision layer: unit started touching a hero
    pub contacts_began: Vec<(UnitId, TargetId)>,
    /// Collision layer: unit stopped touching whatever it touched
    pub contacts_ended: Vec<UnitId>,
    /// Damage dealt to units this tick
    pub unit_hits: Vec<(UnitId, f32)>,
}

/// Advance the encounter by one fixed timestep
pub fn tick(encounter: &mut Encounter, input: &TickInput, dt: f32) {
    for hero in &mut encounter.arena.heroes {
        match input.walks.iter().find(|w| w.hero == hero.id) {
            Some(walk) if hero.health > 0.0 => hero.walk(walk.direction, walk.throttle, dt),
            _ => hero.current_speed = 0.0,
        }
    }

    for &(unit, hero) in &input.contacts_began {
        if let Some(unit) = encounter.group.unit_mut(unit) {
            unit.report_contact(hero);
        }
    }
    for &unit in &input.contacts_ended {
        if let Some(unit) = encounter.group.unit_mut(unit) {
            unit.clear_contact();
        }
    }
    for &(unit, damage) in &input.unit_hits {
        if let Some(unit) = encounter.group.unit_mut(unit) {
            unit.take_damage(damage);
        }
    }

    encounter.time_ticks += 1;

    let (group, arena, rng) = encounter.parts_mut();
    group.tick(arena, rng, dt);

    let tick = encounter.time_ticks;
    for event in encounter.group.drain_events() {
        log::debug!("[tick {}] {:?}", tick, event);
        encounter.log.push(LoggedEvent { tick, event });
    }
}
