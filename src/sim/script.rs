//! Scripted hero behavior for headless runs
//!
//! Stands in for the player: walks along timed legs, reports body contact with
//! nearby units, and swings back at the closest unit on a fixed cadence.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::Encounter;
use super::target::Target;
use super::tick::{HeroWalk, TickInput};

/// Walk in one direction between two ticks (end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptLeg {
    pub from_tick: u64,
    pub until_tick: u64,
    pub direction: Vec3,
    /// Fraction of top speed (0..=1)
    pub throttle: f32,
}

/// The hero hitting back
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterAttack {
    pub damage: f32,
    pub range: f32,
    /// Seconds between swings
    pub interval: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroScript {
    #[serde(default)]
    pub legs: Vec<ScriptLeg>,
    #[serde(default)]
    pub counter: Option<CounterAttack>,
    /// Units closer than this are touching the hero
    #[serde(default = "default_contact_radius")]
    pub contact_radius: f32,
}

fn default_contact_radius() -> f32 {
    1.0
}

impl Default for HeroScript {
    fn default() -> Self {
        Self {
            legs: Vec::new(),
            counter: None,
            contact_radius: default_contact_radius(),
        }
    }
}

impl HeroScript {
    /// Build the input for the tick about to run
    pub fn input_for(&self, encounter: &Encounter, dt: f32) -> TickInput {
        let mut input = TickInput::default();
        let Some(hero) = encounter.hero().filter(|h| !h.is_dead()) else {
            return input;
        };
        let tick = encounter.time_ticks;

        if let Some(leg) = self
            .legs
            .iter()
            .find(|l| (l.from_tick..l.until_tick).contains(&tick))
        {
            input.walks.push(HeroWalk {
                hero: hero.id,
                direction: leg.direction,
                throttle: leg.throttle,
            });
        }

        for unit in encounter.group.alive_units() {
            let touching = unit.pose.distance_to(hero.position()) < self.contact_radius;
            match (touching, unit.in_contact) {
                (true, None) => input.contacts_began.push((unit.id, hero.id)),
                (false, Some(_)) => input.contacts_ended.push(unit.id),
                _ => {}
            }
        }

        if let Some(counter) = self.counter {
            let cadence = ((counter.interval / dt).round() as u64).max(1);
            if tick > 0 && tick % cadence == 0 {
                let closest = encounter
                    .group
                    .alive_units()
                    .map(|u| (u.id, u.pose.distance_to(hero.position())))
                    .filter(|&(_, d)| d <= counter.range)
                    .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
                if let Some((unit, _)) = closest {
                    input.unit_hits.push((unit, counter.damage));
                }
            }
        }

        input
    }
}
