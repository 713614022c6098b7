//! Angular sector arithmetic for formation decisions
//!
//! All angles are degrees on a (-180, 180] scale. A sector is anchored at a
//! base angle and bounded by a limit on each side; these checks answer which
//! way a bearing has to be nudged to land inside the sector. They are decision
//! oracles, not rotations: callers pick a direction from the answers.
//!
//! "Clockwise" means increasing bearing (viewed from above), so a bearing
//! below the clockwise-side limit needs a clockwise push to reach the sector.

/// The angle directly opposite `base` (wrap-aware, may sit just outside the range)
#[inline]
fn flipped(base: f32) -> f32 {
    if base > 0.0 { base - 180.0 } else { base + 180.0 }
}

/// True if `current` lies past the angle opposite `base`, on the side of `base`
///
/// The opposite of 120 is -60, so `is_greater_than_flipped_angle(0, 120)` holds.
#[inline]
pub fn is_greater_than_flipped_angle(current: f32, base: f32) -> bool {
    current > flipped(base)
}

/// True if `current` is at or below the angle opposite `base`
#[inline]
pub fn is_less_than_flipped_angle(current: f32, base: f32) -> bool {
    current <= flipped(base)
}

/// Does `current` sit outside the clockwise-side boundary `limit` of the sector at `base`?
///
/// `limit` is expected to be below `base`. When `limit` drops past -180 the
/// boundary wraps to the positive half and the check follows it there.
pub fn need_to_adjust_clockwise(current: f32, base: f32, limit: f32) -> bool {
    if base > 0.0 {
        current <= limit && is_greater_than_flipped_angle(current, base)
    } else {
        let wrapped_limit = 360.0 + limit;
        (limit >= -180.0 && current <= limit)
            || (limit <= -180.0
                && current <= wrapped_limit
                && is_greater_than_flipped_angle(current, base))
    }
}

/// Does `current` sit outside the counter-clockwise-side boundary `limit` of the sector at `base`?
///
/// `limit` is expected to be above `base`.
pub fn need_to_adjust_counter_clockwise(current: f32, base: f32, limit: f32) -> bool {
    if base > 0.0 {
        current >= limit || is_less_than_flipped_angle(current, base)
    } else {
        current >= limit && is_less_than_flipped_angle(current, base)
    }
}
