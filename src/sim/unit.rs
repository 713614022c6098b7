//! A single combatant and its local state machine
//!
//! A unit senses on its own, keeps its distance while engaged, and only
//! strikes once its group hands it the attack token. A strike applies damage
//! once, holds the unit in place for [`STRIKE_DURATION`], then reports back so
//! the group can release the token.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::formation::FormationAction;
use super::pose::Pose;
use super::target::{Surroundings, Target, TargetId};
use crate::consts::{LOOK_AT_RATE, STRIKE_DURATION, WAIT_SPEED_FACTOR};

pub type UnitId = u32;
pub type GroupId = u32;

/// Whether the unit holds its group's attack token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattleState {
    #[default]
    Normal,
    Attacking,
}

/// What the unit is doing this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitPhase {
    /// No target engaged
    #[default]
    Seeking,
    /// Target engaged, keeping distance
    Engaging,
    /// Holding the token but out of striking position
    Closing,
    /// Mid-strike
    Attacking,
}

/// Static combat stats for a unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    pub max_health: f32,
    pub movement_speed: f32,
    pub attack_range: f32,
    pub base_damage: f32,
    pub sight_radius: f32,
    /// Half-angle of the sight cone (degrees)
    pub sight_half_angle: f32,
    pub min_keep_distance: f32,
    pub max_keep_distance: f32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            movement_speed: 3.5,
            attack_range: 2.0,
            base_damage: 10.0,
            sight_radius: 15.0,
            sight_half_angle: 60.0,
            min_keep_distance: 4.0,
            max_keep_distance: 6.0,
        }
    }
}

/// A strike in progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Strike {
    pub target: TargetId,
    /// Seconds until the strike completes
    pub remaining: f32,
}

/// Something the group needs to hear about
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitEvent {
    StrikeStarted {
        unit: UnitId,
        target: TargetId,
        damage: f32,
    },
    StrikeFinished {
        unit: UnitId,
    },
}

/// What the group shares with its units for this tick
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupView {
    /// Some unit in the group currently detects the target
    pub found_target: bool,
    pub target: Option<TargetId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    /// Owning group (non-owning back-reference)
    pub group: GroupId,
    pub stats: UnitStats,
    pub health: f32,
    pub pose: Pose,
    pub battle_state: BattleState,
    pub phase: UnitPhase,
    /// Priority within the group; `None` until ranked or once dead
    pub rank: Option<usize>,
    /// Currently acquired target (looked up by id, never owned)
    pub target: Option<TargetId>,
    /// Target seen by this unit's own sight check this tick
    pub in_sight: bool,
    /// Target the collision layer says we are touching
    pub in_contact: Option<TargetId>,
    pub strike: Option<Strike>,
    /// Last formation correction, for presentation
    pub strafe: FormationAction,
    /// Last commanded linear speed, for presentation
    pub move_speed: f32,
}

impl Unit {
    pub fn new(id: UnitId, group: GroupId, stats: UnitStats, pose: Pose) -> Self {
        Self {
            id,
            group,
            stats,
            health: stats.max_health,
            pose,
            battle_state: BattleState::Normal,
            phase: UnitPhase::Seeking,
            rank: None,
            target: None,
            in_sight: false,
            in_contact: None,
            strike: None,
            strafe: FormationAction::Hold,
            move_speed: 0.0,
        }
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    #[inline]
    pub fn holds_token(&self) -> bool {
        self.battle_state == BattleState::Attacking
    }

    pub fn set_battle_state(&mut self, state: BattleState) {
        self.battle_state = state;
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health -= amount;
    }

    /// Collision layer reports the unit touching a target
    pub fn report_contact(&mut self, target: TargetId) {
        self.in_contact = Some(target);
    }

    pub fn clear_contact(&mut self) {
        self.in_contact = None;
    }

    /// Sees or touches a target right now
    #[inline]
    pub fn detects_target(&self) -> bool {
        self.in_sight || self.in_contact.is_some()
    }

    /// Look for targets inside the sight cone
    ///
    /// Every candidate within the sight radius whose direction is less than
    /// the sight half-angle off the forward axis qualifies; the last one
    /// scanned becomes the acquired target.
    pub fn sense<S: Surroundings>(&mut self, world: &S) -> bool {
        self.in_sight = false;
        for id in world.candidates_within(self.pose.position, self.stats.sight_radius) {
            let Some(target) = world.target(id) else {
                continue;
            };
            if target.is_dead() {
                continue;
            }
            if self.pose.angle_to(target.position()) < self.stats.sight_half_angle {
                self.in_sight = true;
                self.target = Some(id);
            }
        }
        self.in_sight
    }

    #[inline]
    pub fn in_attack_range(&self, target: Vec3) -> bool {
        self.pose.distance_to(target) < self.stats.attack_range
    }

    /// Advance the unit one tick
    ///
    /// Called after the group has reacted, so `view` and the token are stable
    /// for the rest of the tick.
    pub fn tick<S: Surroundings>(
        &mut self,
        world: &mut S,
        view: GroupView,
        dt: f32,
    ) -> Option<UnitEvent> {
        if self.strike.is_some() {
            return self.advance_strike(world, dt);
        }

        if !self.in_sight {
            if let Some(contact) = self.in_contact {
                self.target = Some(contact);
            }
        }

        if !self.detects_target() {
            match view.target {
                // Assisted acquisition
                Some(shared) if view.found_target => self.target = Some(shared),
                _ => {
                    self.go_seeking();
                    return None;
                }
            }
        }

        let Some(target_id) = self.target else {
            self.go_seeking();
            return None;
        };
        let Some(target) = world.target(target_id) else {
            self.target = None;
            self.go_seeking();
            return None;
        };
        let target_pos = target.position();
        let target_committed = target.is_moving_fast();

        self.pose.turn_towards(target_pos, LOOK_AT_RATE * dt);

        if self.holds_token() {
            if self.in_attack_range(target_pos) {
                return self.start_strike(world, target_id);
            }
            self.close_in(target_pos, dt);
            self.phase = UnitPhase::Closing;
        } else {
            self.maintain_distance(target_pos, target_committed, dt);
            self.phase = UnitPhase::Engaging;
        }
        None
    }

    fn go_seeking(&mut self) {
        self.phase = UnitPhase::Seeking;
        self.move_speed = 0.0;
    }

    /// Hold between the keep distances; crawl while the target is committed to a move
    pub fn maintain_distance(&mut self, target: Vec3, target_committed: bool, dt: f32) {
        let distance = self.pose.distance_to(target);
        let mut speed = self.stats.movement_speed;
        if target_committed {
            speed *= WAIT_SPEED_FACTOR;
        }

        if distance < self.stats.min_keep_distance {
            self.pose.move_towards(target, -speed * dt);
        } else if distance > self.stats.max_keep_distance {
            self.pose.move_towards(target, speed * dt);
        } else {
            speed = 0.0;
        }
        self.move_speed = speed;
    }

    /// Approach until the target is inside attack range
    pub fn close_in(&mut self, target: Vec3, dt: f32) {
        if self.in_attack_range(target) {
            self.move_speed = 0.0;
            return;
        }
        self.pose.move_towards(target, self.stats.movement_speed * dt);
        self.move_speed = self.stats.movement_speed;
    }

    fn start_strike<S: Surroundings>(
        &mut self,
        world: &mut S,
        target: TargetId,
    ) -> Option<UnitEvent> {
        let damage = self.stats.base_damage;
        world.target_mut(target)?.apply_damage(damage);

        self.strike = Some(Strike {
            target,
            remaining: STRIKE_DURATION,
        });
        self.phase = UnitPhase::Attacking;
        self.move_speed = 0.0;

        Some(UnitEvent::StrikeStarted {
            unit: self.id,
            target,
            damage,
        })
    }

    fn advance_strike<S: Surroundings>(&mut self, world: &S, dt: f32) -> Option<UnitEvent> {
        let strike = self.strike.as_mut()?;
        strike.remaining -= dt;
        let target = strike.target;
        let done = strike.remaining <= 0.0;

        if let Some(target) = world.target(target) {
            self.pose.turn_towards(target.position(), LOOK_AT_RATE * dt);
        }
        self.move_speed = 0.0;

        if !done {
            return None;
        }
        self.strike = None;
        self.phase = if self.target.is_some() {
            UnitPhase::Engaging
        } else {
            UnitPhase::Seeking
        };
        Some(UnitEvent::StrikeFinished { unit: self.id })
    }

    /// Drop any strike and token state (group released the token)
    pub(crate) fn reset_attack(&mut self) {
        self.strike = None;
        self.battle_state = BattleState::Normal;
        if self.phase == UnitPhase::Attacking || self.phase == UnitPhase::Closing {
            self.phase = if self.target.is_some() {
                UnitPhase::Engaging
            } else {
                UnitPhase::Seeking
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::target::{Arena, Hero};

    const DT: f32 = 0.1;

    fn arena_with_hero_at(pos: Vec3) -> Arena {
        Arena::new(vec![Hero::new(1, Pose::new(pos, 180.0), 100.0, 5.0)])
    }

    fn unit_at(pos: Vec3, yaw: f32) -> Unit {
        Unit::new(1, 1, UnitStats::default(), Pose::new(pos, yaw))
    }

    #[test]
    fn test_sense_requires_cone_and_radius() {
        let arena = arena_with_hero_at(Vec3::new(0.0, 0.0, 10.0));

        // Facing the hero
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        assert!(unit.sense(&arena));
        assert_eq!(unit.target, Some(1));

        // Facing away
        let mut unit = unit_at(Vec3::ZERO, 180.0);
        assert!(!unit.sense(&arena));
        assert_eq!(unit.target, None);

        // Out of radius
        let mut unit = unit_at(Vec3::new(0.0, 0.0, -20.0), 0.0);
        assert!(!unit.sense(&arena));
    }

    #[test]
    fn test_seeking_without_detection() {
        let mut arena = arena_with_hero_at(Vec3::new(0.0, 0.0, 50.0));
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        unit.sense(&arena);
        assert_eq!(unit.tick(&mut arena, GroupView::default(), DT), None);
        assert_eq!(unit.phase, UnitPhase::Seeking);
    }

    #[test]
    fn test_contact_counts_as_detection() {
        let mut arena = arena_with_hero_at(Vec3::new(0.0, 0.0, -1.0));
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        unit.sense(&arena);
        assert!(!unit.in_sight);

        unit.report_contact(1);
        unit.tick(&mut arena, GroupView::default(), DT);
        assert_eq!(unit.phase, UnitPhase::Engaging);
        assert_eq!(unit.target, Some(1));
    }

    #[test]
    fn test_assisted_acquisition_from_group() {
        let mut arena = arena_with_hero_at(Vec3::new(0.0, 0.0, -5.0));
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        unit.sense(&arena);
        let view = GroupView {
            found_target: true,
            target: Some(1),
        };
        unit.tick(&mut arena, view, DT);
        assert_eq!(unit.target, Some(1));
        assert_eq!(unit.phase, UnitPhase::Engaging);
    }

    #[test]
    fn test_maintain_distance_band() {
        let target = Vec3::new(0.0, 0.0, 10.0);

        // Too far: approach at full speed
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        unit.maintain_distance(target, false, 1.0);
        assert!((unit.pose.position.z - 3.5).abs() < 1e-4);
        assert_eq!(unit.move_speed, 3.5);

        // Too far while target is committed: quarter speed
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        unit.maintain_distance(target, true, 1.0);
        assert!((unit.pose.position.z - 0.875).abs() < 1e-4);

        // Too close: retreat
        let mut unit = unit_at(Vec3::new(0.0, 0.0, 8.0), 0.0);
        unit.maintain_distance(target, false, 0.1);
        assert!(unit.pose.position.z < 8.0);

        // Inside the band: hold
        let mut unit = unit_at(Vec3::new(0.0, 0.0, 5.0), 0.0);
        unit.maintain_distance(target, false, 1.0);
        assert_eq!(unit.pose.position.z, 5.0);
        assert_eq!(unit.move_speed, 0.0);
    }

    #[test]
    fn test_token_holder_closes_then_strikes_once() {
        let mut arena = arena_with_hero_at(Vec3::new(0.0, 0.0, 5.0));
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        unit.sense(&arena);
        unit.set_battle_state(BattleState::Attacking);

        let mut started = 0;
        let mut finished = false;
        for _ in 0..100 {
            unit.sense(&arena);
            match unit.tick(&mut arena, GroupView::default(), DT) {
                Some(UnitEvent::StrikeStarted { damage, .. }) => {
                    started += 1;
                    assert_eq!(damage, 10.0);
                }
                Some(UnitEvent::StrikeFinished { unit: id }) => {
                    assert_eq!(id, 1);
                    finished = true;
                    break;
                }
                None => {}
            }
        }

        assert_eq!(started, 1);
        assert!(finished);
        assert_eq!(arena.target(1).unwrap().health, 90.0);
        assert!(unit.strike.is_none());
    }

    #[test]
    fn test_strike_lasts_its_duration() {
        let mut arena = arena_with_hero_at(Vec3::new(0.0, 0.0, 1.5));
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        unit.sense(&arena);
        unit.set_battle_state(BattleState::Attacking);

        let first = unit.tick(&mut arena, GroupView::default(), DT);
        assert!(matches!(first, Some(UnitEvent::StrikeStarted { .. })));
        assert_eq!(unit.phase, UnitPhase::Attacking);

        // 1.3s at 0.1s per tick: finishes on the 13th tick after the start
        let mut ticks = 0;
        loop {
            ticks += 1;
            let event = unit.tick(&mut arena, GroupView::default(), DT);
            if let Some(UnitEvent::StrikeFinished { .. }) = event {
                break;
            }
            assert!(ticks < 20, "strike never finished");
        }
        assert!((12..=14).contains(&ticks));
    }

    #[test]
    fn test_close_in_stops_inside_range() {
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        unit.close_in(Vec3::new(0.0, 0.0, 0.5), 0.1);
        assert_eq!(unit.pose.position, Vec3::ZERO);
        assert_eq!(unit.move_speed, 0.0);

        unit.close_in(Vec3::new(0.0, 0.0, 5.0), 0.1);
        assert!((unit.pose.position.z - 0.35).abs() < 1e-5);
    }

    /// Tick a token holder until it strikes, returning the tick it struck on
    fn ticks_until_strike(unit: &mut Unit, arena: &mut Arena, dt: f32) -> Option<usize> {
        for i in 0..400 {
            unit.sense(arena);
            if let Some(UnitEvent::StrikeStarted { .. }) =
                unit.tick(arena, GroupView::default(), dt)
            {
                return Some(i);
            }
        }
        None
    }

    #[test]
    fn test_token_holder_strikes_with_coarse_timestep() {
        // One step at dt 0.5 covers 1.75, wider than half the attack range
        let mut arena = arena_with_hero_at(Vec3::new(0.0, 0.0, 2.2));
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        unit.set_battle_state(BattleState::Attacking);

        let struck = ticks_until_strike(&mut unit, &mut arena, 0.5);
        assert_eq!(struck, Some(1));
        assert_eq!(arena.target(1).unwrap().health, 90.0);
    }

    #[test]
    fn test_token_holder_on_top_of_target_strikes() {
        let mut arena = arena_with_hero_at(Vec3::ZERO);
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        unit.report_contact(1);
        unit.set_battle_state(BattleState::Attacking);

        assert_eq!(ticks_until_strike(&mut unit, &mut arena, 1.0 / 60.0), Some(0));
        assert_eq!(arena.target(1).unwrap().health, 90.0);
    }

    #[test]
    fn test_reset_attack_clears_token() {
        let mut unit = unit_at(Vec3::ZERO, 0.0);
        unit.set_battle_state(BattleState::Attacking);
        unit.phase = UnitPhase::Attacking;
        unit.strike = Some(Strike {
            target: 1,
            remaining: 0.5,
        });
        unit.reset_attack();
        assert_eq!(unit.battle_state, BattleState::Normal);
        assert!(unit.strike.is_none());
        assert_eq!(unit.phase, UnitPhase::Seeking);
    }
}
