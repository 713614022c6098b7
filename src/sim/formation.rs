//! Circular formation around the target
//!
//! Alive units are spread evenly around the target in rank order. Even ranks
//! fill the positive arc (0, D, 2D, ...) and odd ranks the negative arc
//! (-D, -2D, ...), where D = 360 / N. Rank 0 always takes the point position
//! at bearing 0, straight in front of the target.
//!
//! Each unit then gets one of five corrections from its current bearing:
//! a fast orbit when it is outside its sector, a slow orbit when it is inside
//! the sector but outside the margin around its bearing, or hold.

use serde::{Deserialize, Serialize};

use super::angle::{need_to_adjust_clockwise, need_to_adjust_counter_clockwise};
use super::unit::UnitId;
use crate::consts::{FAST_ORBIT_MULTIPLIER, FORMATION_MARGIN_OF_ERROR, SLOW_ORBIT_MULTIPLIER};
use crate::normalize_degrees;

/// Orbit correction for one unit this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormationAction {
    /// Within the margin of its bearing
    #[default]
    Hold,
    ClockwiseFast,
    CounterClockwiseFast,
    ClockwiseSlow,
    CounterClockwiseSlow,
    /// Holding the attack token; formation leaves it alone
    Stationary,
}

impl FormationAction {
    /// Signed orbit angle for this tick (positive = clockwise)
    pub fn orbit_degrees(self, movement_speed: f32, dt: f32) -> f32 {
        let fast = movement_speed * dt * FAST_ORBIT_MULTIPLIER;
        let slow = (movement_speed / 2.0) * dt * SLOW_ORBIT_MULTIPLIER;
        match self {
            FormationAction::ClockwiseFast => fast,
            FormationAction::CounterClockwiseFast => -fast,
            FormationAction::ClockwiseSlow => slow,
            FormationAction::CounterClockwiseSlow => -slow,
            FormationAction::Hold | FormationAction::Stationary => 0.0,
        }
    }

    /// Linear speed a presentation layer should animate with
    pub fn move_speed(self, movement_speed: f32) -> f32 {
        match self {
            FormationAction::ClockwiseFast | FormationAction::CounterClockwiseFast => {
                movement_speed
            }
            FormationAction::ClockwiseSlow | FormationAction::CounterClockwiseSlow => {
                movement_speed / 4.0
            }
            FormationAction::Hold | FormationAction::Stationary => 0.0,
        }
    }
}

/// Which half of the circle a slot lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arc {
    Positive,
    Negative,
}

/// A ranked unit as the planner sees it
#[derive(Debug, Clone, Copy)]
pub struct FormationMember {
    pub unit: UnitId,
    /// Current bearing from the target's forward axis
    pub bearing: f32,
    pub holds_token: bool,
}

/// Planned placement for one unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormationSlot {
    pub unit: UnitId,
    pub rank: usize,
    pub arc: Arc,
    /// Slot index along the arc
    pub slot: usize,
    /// Assigned bearing before wrapping (may be -180 or beyond)
    pub base: f32,
    pub action: FormationAction,
}

impl FormationSlot {
    /// Assigned bearing normalized to (-180, 180]
    pub fn bearing(&self) -> f32 {
        normalize_degrees(self.base)
    }
}

/// Degrees each unit covers; `None` for an empty roster
#[inline]
pub fn angle_division(count: usize) -> Option<f32> {
    (count > 0).then(|| 360.0 / count as f32)
}

/// Pick the correction for a unit at `current` whose slot is at `base`
pub fn classify(current: f32, base: f32, division: f32) -> FormationAction {
    let clockwise_edge = base - division / 2.0;
    let counter_clockwise_edge = base + division / 2.0;
    let clockwise_margin = base - FORMATION_MARGIN_OF_ERROR;
    let counter_clockwise_margin = base + FORMATION_MARGIN_OF_ERROR;

    if need_to_adjust_clockwise(current, base, clockwise_edge) {
        FormationAction::ClockwiseFast
    } else if need_to_adjust_counter_clockwise(current, base, counter_clockwise_edge) {
        FormationAction::CounterClockwiseFast
    } else if need_to_adjust_clockwise(current, clockwise_margin, clockwise_margin) {
        FormationAction::ClockwiseSlow
    } else if need_to_adjust_counter_clockwise(
        current,
        counter_clockwise_margin,
        counter_clockwise_margin,
    ) {
        FormationAction::CounterClockwiseSlow
    } else {
        FormationAction::Hold
    }
}

/// Plan the formation for members given in rank order (rank 0 first)
///
/// Returns one slot per member. An empty roster plans nothing.
pub fn plan(members: &[FormationMember]) -> Vec<FormationSlot> {
    let Some(division) = angle_division(members.len()) else {
        return Vec::new();
    };

    let mut positive_slots = 0usize;
    let mut negative_slots = 1usize;
    let mut slots = Vec::with_capacity(members.len());

    for (rank, member) in members.iter().enumerate() {
        let (arc, slot, base) = if rank % 2 == 0 {
            let slot = positive_slots;
            positive_slots += 1;
            // Point position
            let base = if rank == 0 { 0.0 } else { slot as f32 * division };
            (Arc::Positive, slot, base)
        } else {
            let slot = negative_slots;
            negative_slots += 1;
            (Arc::Negative, slot, -(slot as f32) * division)
        };

        let action = if member.holds_token {
            FormationAction::Stationary
        } else {
            classify(member.bearing, base, division)
        };

        slots.push(FormationSlot {
            unit: member.unit,
            rank,
            arc,
            slot,
            base,
            action,
        });
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn members(bearings: &[f32]) -> Vec<FormationMember> {
        bearings
            .iter()
            .enumerate()
            .map(|(i, &bearing)| FormationMember {
                unit: i as UnitId + 1,
                bearing,
                holds_token: false,
            })
            .collect()
    }

    #[test]
    fn test_three_unit_bearings() {
        let slots = plan(&members(&[0.0, 0.0, 0.0]));
        let bearings: Vec<f32> = slots.iter().map(|s| s.bearing()).collect();
        assert_eq!(bearings, vec![0.0, -120.0, 120.0]);
        assert_eq!(slots[1].arc, Arc::Negative);
        assert_eq!(slots[1].slot, 1);
        assert_eq!(slots[2].arc, Arc::Positive);
        assert_eq!(slots[2].slot, 1);
    }

    #[test]
    fn test_empty_roster_plans_nothing() {
        assert!(angle_division(0).is_none());
        assert!(plan(&[]).is_empty());
    }

    #[test]
    fn test_single_unit_takes_point() {
        let slots = plan(&members(&[45.0]));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].bearing(), 0.0);
        assert_eq!(slots[0].action, FormationAction::CounterClockwiseSlow);
    }

    #[test]
    fn test_classify_bands() {
        // Point slot with three units: sector (-60, 60), margin (-10, 10)
        assert_eq!(classify(-90.0, 0.0, 120.0), FormationAction::ClockwiseFast);
        assert_eq!(classify(90.0, 0.0, 120.0), FormationAction::CounterClockwiseFast);
        assert_eq!(classify(-30.0, 0.0, 120.0), FormationAction::ClockwiseSlow);
        assert_eq!(classify(30.0, 0.0, 120.0), FormationAction::CounterClockwiseSlow);
        assert_eq!(classify(5.0, 0.0, 120.0), FormationAction::Hold);
    }

    #[test]
    fn test_classify_across_the_back() {
        // Two units: rank 1 sits at -180, sector wraps through the back
        assert_eq!(classify(45.0, -180.0, 180.0), FormationAction::ClockwiseFast);
        assert_eq!(classify(-45.0, -180.0, 180.0), FormationAction::CounterClockwiseFast);
        assert_eq!(classify(120.0, -180.0, 180.0), FormationAction::ClockwiseSlow);
        assert_eq!(classify(-120.0, -180.0, 180.0), FormationAction::CounterClockwiseSlow);
        assert_eq!(classify(179.0, -180.0, 180.0), FormationAction::Hold);
        assert_eq!(classify(-175.0, -180.0, 180.0), FormationAction::Hold);
    }

    #[test]
    fn test_token_holder_is_stationary_but_keeps_its_slot() {
        let mut m = members(&[0.0, 90.0, 0.0]);
        m[1].holds_token = true;
        let slots = plan(&m);
        assert_eq!(slots[1].action, FormationAction::Stationary);
        assert_eq!(slots[1].bearing(), -120.0);
        assert_eq!(slots[2].bearing(), 120.0);
    }

    #[test]
    fn test_orbit_rates_ordered() {
        let fast = FormationAction::ClockwiseFast.orbit_degrees(4.0, 0.1);
        let slow = FormationAction::ClockwiseSlow.orbit_degrees(4.0, 0.1);
        let hold = FormationAction::Hold.orbit_degrees(4.0, 0.1);
        assert!(fast > slow && slow > hold);
        assert_eq!(FormationAction::CounterClockwiseFast.orbit_degrees(4.0, 0.1), -fast);

        assert_eq!(FormationAction::ClockwiseFast.move_speed(4.0), 4.0);
        assert_eq!(FormationAction::CounterClockwiseSlow.move_speed(4.0), 1.0);
        assert_eq!(FormationAction::Stationary.move_speed(4.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_distinct_bearings_with_point_at_zero(
            bearings in proptest::collection::vec(-179.0f32..180.0, 1..16),
        ) {
            let slots = plan(&members(&bearings));
            prop_assert_eq!(slots.len(), bearings.len());
            prop_assert_eq!(slots[0].bearing(), 0.0);
            for (i, a) in slots.iter().enumerate() {
                for b in slots.iter().skip(i + 1) {
                    prop_assert!((a.bearing() - b.bearing()).abs() > 1e-3);
                }
            }
        }
    }
}
