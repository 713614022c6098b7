//! Deterministic simulation module
//!
//! All coordination logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (roster order, heroes by ID)
//! - No rendering, animation or platform dependencies

pub mod angle;
pub mod formation;
pub mod group;
pub mod pose;
pub mod script;
pub mod state;
pub mod target;
pub mod tick;
pub mod unit;

pub use angle::{
    is_greater_than_flipped_angle, is_less_than_flipped_angle, need_to_adjust_clockwise,
    need_to_adjust_counter_clockwise,
};
pub use formation::{FormationAction, FormationMember, FormationSlot};
pub use group::{AttackTiming, Group, GroupBehavior, GroupEvent, GroupState, ReleaseReason};
pub use pose::Pose;
pub use script::{CounterAttack, HeroScript, ScriptLeg};
pub use state::{Encounter, LoggedEvent};
pub use target::{Arena, Hero, Surroundings, Target, TargetId};
pub use tick::{HeroWalk, TickInput, tick};
pub use unit::{BattleState, GroupId, Unit, UnitEvent, UnitId, UnitPhase, UnitStats};
