//! Group coordinator
//!
//! Owns the roster and, once per tick and in this order:
//! 1. releases the token of any unit that died since the last tick
//! 2. lets every alive unit sense, and works out whether the group sees a target
//! 3. determines the group state and derives the primary behavior
//! 4. if the group is not Normal: re-ranks, then, while the target is not
//!    moving fast, moves the formation and runs the attack scheduler
//! 5. ticks the units, which read the shared target and token decided above
//!
//! The attack token is implicit: it is held by whichever alive unit has
//! [`BattleState::Attacking`], and the group never lets two units hold it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::formation::{self, FormationAction, FormationMember, FormationSlot};
use super::target::{Surroundings, Target, TargetId};
use super::unit::{BattleState, GroupId, GroupView, Unit, UnitEvent, UnitId};
use crate::bearing_degrees;
use crate::consts::OFFENSIVE_HEALTH_RATIO;

/// The group's overall situation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupState {
    /// Has never noticed a target
    #[default]
    Normal,
    /// Target in sight and hurt or outmatched: press the attack
    Offensive,
    /// Target in sight and healthy: react to it
    Defensive,
    /// Guarding an objective. Never entered by state determination.
    Protective,
    /// Target seen before but not right now
    Patrol,
}

/// Primary behavior, derived from the state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupBehavior {
    #[default]
    Passive,
    Aggressive,
}

impl GroupState {
    pub fn behavior(self) -> GroupBehavior {
        match self {
            GroupState::Normal => GroupBehavior::Passive,
            GroupState::Offensive => GroupBehavior::Aggressive,
            GroupState::Defensive => GroupBehavior::Passive,
            GroupState::Protective => GroupBehavior::Aggressive,
            GroupState::Patrol => GroupBehavior::Passive,
        }
    }
}

/// Bounds on how often the group attacks (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackTiming {
    /// Soonest the group may attack after the last strike
    pub min_attack_interval: f32,
    /// Longest the group waits before forcing an attack
    pub max_attack_interval: f32,
}

impl Default for AttackTiming {
    fn default() -> Self {
        Self {
            min_attack_interval: 2.0,
            max_attack_interval: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseReason {
    Completed,
    Death,
}

/// Things that happened in the group this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GroupEvent {
    StateChanged { from: GroupState, to: GroupState },
    TokenGranted { unit: UnitId },
    StrikeStarted { unit: UnitId, target: TargetId, damage: f32 },
    TokenReleased { unit: UnitId, reason: ReleaseReason },
    UnitDied { unit: UnitId },
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: GroupId,
    /// Roster in insertion order, dead units included until removed
    units: Vec<Unit>,
    pub state: GroupState,
    pub behavior: GroupBehavior,
    /// Sticky: set the first time any unit detects a target
    pub has_seen_target: bool,
    found_target: bool,
    /// Target shared with the units while someone detects it
    pub target: Option<TargetId>,
    /// Seconds since the last strike completed (only counts while the target holds still)
    pub attack_clock: f32,
    pub timing: AttackTiming,
    formation: Vec<FormationSlot>,
    known_dead: Vec<UnitId>,
    events: Vec<GroupEvent>,
}

impl Group {
    pub fn new(id: GroupId, timing: AttackTiming) -> Self {
        Self {
            id,
            units: Vec::new(),
            state: GroupState::Normal,
            behavior: GroupBehavior::Passive,
            has_seen_target: false,
            found_target: false,
            target: None,
            attack_clock: 0.0,
            timing,
            formation: Vec::new(),
            known_dead: Vec::new(),
            events: Vec::new(),
        }
    }

    // ---- Roster ----

    /// Add a unit to the roster; the unit's back-reference is pointed at this group
    pub fn add_unit(&mut self, mut unit: Unit) {
        unit.group = self.id;
        self.units.push(unit);
        self.rank_units();
    }

    /// Take a unit out of the roster (the only way units leave)
    pub fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let idx = self.units.iter().position(|u| u.id == id)?;
        let unit = self.units.remove(idx);
        self.known_dead.retain(|&d| d != id);
        self.formation.retain(|s| s.unit != id);
        Some(unit)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn alive_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| !u.is_dead())
    }

    pub fn dead_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_dead())
    }

    pub fn alive_count(&self) -> usize {
        self.alive_units().count()
    }

    // ---- Aggregates ----

    /// Sum of current health over alive units
    pub fn group_health(&self) -> f32 {
        self.alive_units().map(|u| u.health).sum()
    }

    /// Sum of max health over alive units
    pub fn group_total_health(&self) -> f32 {
        self.alive_units().map(|u| u.stats.max_health).sum()
    }

    /// Alive unit with the lowest health (first one wins ties)
    pub fn weakest_unit(&self) -> Option<&Unit> {
        self.alive_units().fold(None, |weakest: Option<&Unit>, unit| match weakest {
            Some(w) if unit.health >= w.health => Some(w),
            _ => Some(unit),
        })
    }

    /// Alive unit with the highest health (first one wins ties)
    pub fn strongest_unit(&self) -> Option<&Unit> {
        self.alive_units().fold(None, |strongest: Option<&Unit>, unit| match strongest {
            Some(s) if unit.health <= s.health => Some(s),
            _ => Some(unit),
        })
    }

    /// Some alive unit sees or touches the target (as of the last sense pass)
    pub fn found_target(&self) -> bool {
        self.found_target
    }

    pub fn token_holder(&self) -> Option<UnitId> {
        self.alive_units().find(|u| u.holds_token()).map(|u| u.id)
    }

    pub fn is_attacking(&self) -> bool {
        self.token_holder().is_some()
    }

    pub fn ready_to_attack(&self) -> bool {
        self.attack_clock >= self.timing.min_attack_interval
    }

    /// Formation planned on the last tick that ran one
    pub fn formation(&self) -> &[FormationSlot] {
        &self.formation
    }

    pub fn drain_events(&mut self) -> Vec<GroupEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Per-tick pipeline ----

    /// Advance the group and all its units by one fixed step
    pub fn tick<S, R>(&mut self, world: &mut S, rng: &mut R, dt: f32)
    where
        S: Surroundings,
        R: Rng + ?Sized,
    {
        self.handle_deaths();
        self.sense(world);

        let previous = self.state;
        self.state = self.determine_state(world);
        self.behavior = self.state.behavior();
        if self.state != previous {
            log::info!("Group {} state {:?} -> {:?}", self.id, previous, self.state);
            self.events.push(GroupEvent::StateChanged {
                from: previous,
                to: self.state,
            });
        }

        if self.state != GroupState::Normal {
            self.react(world, rng, dt);
        }

        self.tick_units(world, dt);
    }

    /// Release tokens held by units that died, and note each death once
    fn handle_deaths(&mut self) {
        let mut released = Vec::new();
        for unit in self.units.iter_mut().filter(|u| u.is_dead()) {
            if self.known_dead.contains(&unit.id) {
                continue;
            }
            self.known_dead.push(unit.id);
            unit.rank = None;
            log::info!("Group {} lost unit {}", self.id, unit.id);
            self.events.push(GroupEvent::UnitDied { unit: unit.id });

            if unit.holds_token() {
                unit.reset_attack();
                released.push(unit.id);
            }
        }
        for unit in released {
            self.events.push(GroupEvent::TokenReleased {
                unit,
                reason: ReleaseReason::Death,
            });
        }
    }

    /// Run every alive unit's sight check and pick the group's shared target
    pub fn sense<S: Surroundings>(&mut self, world: &S) {
        let mut found = false;
        let mut target = None;
        for unit in self.units.iter_mut().filter(|u| !u.is_dead()) {
            unit.sense(world);
            if unit.detects_target() {
                found = true;
                if let Some(t) = unit.in_contact.filter(|_| !unit.in_sight).or(unit.target) {
                    target = Some(t);
                }
            }
        }

        self.found_target = found;
        self.target = if found { target } else { None };
        if found {
            self.has_seen_target = true;
        }
    }

    /// Work out the group state from what the units currently see
    pub fn determine_state<S: Surroundings>(&self, world: &S) -> GroupState {
        if !self.has_seen_target {
            return GroupState::Normal;
        }
        if !self.found_target {
            return GroupState::Patrol;
        }
        let Some(target) = self.target.and_then(|id| world.target(id)) else {
            return GroupState::Normal;
        };

        if target.is_damaged() || target.health() < self.group_health() * OFFENSIVE_HEALTH_RATIO {
            GroupState::Offensive
        } else {
            GroupState::Defensive
        }
    }

    fn react<S, R>(&mut self, world: &mut S, rng: &mut R, dt: f32)
    where
        S: Surroundings,
        R: Rng + ?Sized,
    {
        self.rank_units();

        let Some(target) = self.target.and_then(|id| world.target(id)) else {
            self.formation.clear();
            return;
        };
        // Hold the circle while the target commits to a move
        if target.is_moving_fast() {
            for unit in &mut self.units {
                unit.strafe = FormationAction::Hold;
            }
            return;
        }
        let pivot = target.position();
        let target_yaw = target.pose().yaw;

        self.apply_formation(pivot, target_yaw, dt);
        self.schedule_attack(rng, dt);
    }

    /// Rank alive units by descending health; ties keep roster order
    pub fn rank_units(&mut self) {
        let mut order: Vec<usize> = (0..self.units.len())
            .filter(|&i| !self.units[i].is_dead())
            .collect();
        order.sort_by(|&a, &b| {
            self.units[b]
                .health
                .partial_cmp(&self.units[a].health)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for unit in &mut self.units {
            unit.rank = None;
        }
        for (rank, idx) in order.into_iter().enumerate() {
            self.units[idx].rank = Some(rank);
        }
    }

    /// Alive unit indices in rank order
    fn ranked_indices(&self) -> Vec<usize> {
        let mut ranked: Vec<(usize, usize)> = self
            .units
            .iter()
            .enumerate()
            .filter(|(_, u)| !u.is_dead())
            .filter_map(|(i, u)| u.rank.map(|r| (r, i)))
            .collect();
        ranked.sort_by_key(|&(rank, _)| rank);
        ranked.into_iter().map(|(_, i)| i).collect()
    }

    /// Plan the circle around `pivot` and orbit each unit toward its slot
    fn apply_formation(&mut self, pivot: glam::Vec3, target_yaw: f32, dt: f32) {
        let ranked = self.ranked_indices();
        let members: Vec<FormationMember> = ranked
            .iter()
            .map(|&i| {
                let unit = &self.units[i];
                FormationMember {
                    unit: unit.id,
                    bearing: bearing_degrees(pivot, target_yaw, unit.pose.position),
                    holds_token: unit.holds_token(),
                }
            })
            .collect();

        self.formation = formation::plan(&members);

        for (slot, &idx) in self.formation.iter().zip(ranked.iter()) {
            let unit = &mut self.units[idx];
            unit.strafe = slot.action;
            if slot.action == FormationAction::Stationary {
                continue;
            }
            let degrees = slot.action.orbit_degrees(unit.stats.movement_speed, dt);
            if degrees != 0.0 {
                unit.pose.rotate_around(pivot, degrees);
            }
            log::debug!(
                "Unit {} rank {} slot {:.1} -> {:?}",
                unit.id,
                slot.rank,
                slot.bearing(),
                slot.action
            );
        }
    }

    /// Maybe hand the token to a random alive unit
    ///
    /// Only called while the target holds still; the clock only runs then too.
    pub fn schedule_attack<R: Rng + ?Sized>(&mut self, rng: &mut R, dt: f32) {
        let alive: Vec<UnitId> = self.alive_units().map(|u| u.id).collect();

        if !alive.is_empty() && !self.is_attacking() && self.ready_to_attack() {
            let forced = self.attack_clock >= self.timing.max_attack_interval;
            if forced || rng.random::<f32>() > 0.5 {
                let pick = alive[rng.random_range(0..alive.len())];
                self.grant_token(pick);
            }
        }

        self.attack_clock += dt;
    }

    /// Give `unit` the attack token; a no-op if anyone already holds it
    pub fn grant_token(&mut self, unit: UnitId) -> bool {
        if self.is_attacking() {
            return false;
        }
        let Some(u) = self.units.iter_mut().find(|u| u.id == unit && !u.is_dead()) else {
            return false;
        };
        u.set_battle_state(BattleState::Attacking);
        log::info!("Group {} grants attack token to unit {}", self.id, unit);
        self.events.push(GroupEvent::TokenGranted { unit });
        true
    }

    /// A unit finished its strike: release the token and restart the cooldown
    ///
    /// The release is only logged when `unit` is in the roster and held the token.
    pub fn done_attacking(&mut self, unit: UnitId) {
        self.attack_clock = 0.0;
        let Some(u) = self.unit_mut(unit) else {
            return;
        };
        let held = u.holds_token();
        u.reset_attack();
        if held {
            self.events.push(GroupEvent::TokenReleased {
                unit,
                reason: ReleaseReason::Completed,
            });
        }
    }

    fn tick_units<S: Surroundings>(&mut self, world: &mut S, dt: f32) {
        let view = GroupView {
            found_target: self.found_target,
            target: self.target,
        };

        let mut finished = Vec::new();
        for member in self.units.iter_mut().filter(|u| !u.is_dead()) {
            match member.tick(world, view, dt) {
                Some(UnitEvent::StrikeStarted {
                    unit,
                    target,
                    damage,
                }) => {
                    self.events.push(GroupEvent::StrikeStarted {
                        unit,
                        target,
                        damage,
                    });
                }
                Some(UnitEvent::StrikeFinished { unit }) => finished.push(unit),
                None => {}
            }
        }

        for unit in finished {
            self.done_attacking(unit);
        }
    }
}
