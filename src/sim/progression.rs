//! Score and difficulty curves
//!
//! Pure functions of score, level, and tuning. Nothing here touches the
//! session, so every curve is easy to test in isolation.

use crate::config::{HazardTuning, StackTuning};
use crate::map_range;

/// `floor(score / threshold) + 1`
pub fn level_for_score(score: u64, threshold: u64) -> u32 {
    let threshold = threshold.max(1);
    u32::try_from(score / threshold)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Points for clearing `lines` rows in one lock at `level`
pub fn line_clear_reward(lines: u32, level: u32) -> u64 {
    let base: u64 = match lines {
        0 => 0,
        1 => 100,
        2 => 300,
        3 => 500,
        _ => 800,
    };
    base * level as u64
}

/// One row of soft drop
pub fn soft_drop_reward(level: u32) -> u64 {
    level as u64
}

/// Hard drop of `rows` rows
pub fn hard_drop_reward(rows: u32, level: u32) -> u64 {
    rows as u64 * 2 * level as u64
}

/// Milliseconds between automatic fall steps, never below the floor.
/// `last_clear` is the row count of the most recent lock that cleared rows.
pub fn fall_interval(level: u32, last_clear: u32, tuning: &StackTuning) -> f64 {
    let raw = tuning.base_interval_ms
        - level.saturating_sub(1) as f64 * tuning.level_step_ms
        - last_clear as f64 * tuning.line_step_ms;
    raw.max(tuning.min_interval_ms)
}

/// Reward for destroying a hazard of `radius`
///
/// Small hazards are worth the most: the curve runs from `max_reward` at
/// `min_radius` down to `min_reward` at `initial_radius`.
pub fn hazard_reward(radius: f32, tuning: &HazardTuning) -> u32 {
    let lo = tuning.min_radius;
    let hi = tuning.initial_radius;
    let clamped = if radius.is_finite() {
        radius.clamp(lo.min(hi), lo.max(hi))
    } else {
        hi
    };
    let value = map_range(
        clamped,
        lo,
        hi,
        tuning.max_reward as f32,
        tuning.min_reward as f32,
    );
    value.floor().max(0.0) as u32
}

/// Hazard speed multiplier for a level (non-decreasing, capped)
pub fn hazard_speed_scale(level: u32, tuning: &HazardTuning) -> f32 {
    let scale = 1.0 + level.saturating_sub(1) as f32 * tuning.level_speed_step;
    scale.min(tuning.max_speed_scale).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, GameKind};
    use proptest::prelude::*;

    fn hazards() -> HazardTuning {
        GameConfig::for_game(GameKind::DataCleaning).hazards
    }

    fn stack() -> StackTuning {
        GameConfig::for_game(GameKind::FeatureEngineering).stack
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(level_for_score(0, 1000), 1);
        assert_eq!(level_for_score(999, 1000), 1);
        assert_eq!(level_for_score(1000, 1000), 2);
        assert_eq!(level_for_score(25_400, 1000), 26);
    }

    #[test]
    fn test_line_clear_table() {
        assert_eq!(line_clear_reward(0, 3), 0);
        assert_eq!(line_clear_reward(1, 1), 100);
        assert_eq!(line_clear_reward(2, 1), 300);
        assert_eq!(line_clear_reward(3, 1), 500);
        // Four rows at level 2
        assert_eq!(line_clear_reward(4, 2), 1600);
    }

    #[test]
    fn test_fall_interval_floor() {
        let tuning = stack();
        assert_eq!(fall_interval(1, 0, &tuning), 1000.0);
        assert_eq!(fall_interval(3, 5, &tuning), 1000.0 - 100.0 - 50.0);
        assert_eq!(fall_interval(40, 200, &tuning), 100.0);
    }

    #[test]
    fn test_hazard_reward_curve() {
        let tuning = hazards();
        assert_eq!(hazard_reward(20.0, &tuning), 50);
        assert_eq!(hazard_reward(70.0, &tuning), 10);
        assert_eq!(hazard_reward(45.0, &tuning), 30);
        // Jittered radii outside the curve are clamped
        assert_eq!(hazard_reward(77.0, &tuning), 10);
        assert_eq!(hazard_reward(12.0, &tuning), 50);
        assert_eq!(hazard_reward(f32::NAN, &tuning), 10);
    }

    #[test]
    fn test_drop_rewards() {
        assert_eq!(soft_drop_reward(3), 3);
        assert_eq!(hard_drop_reward(10, 2), 40);
    }

    proptest! {
        #[test]
        fn prop_speed_scale_non_decreasing(level in 1u32..500) {
            let tuning = hazards();
            let a = hazard_speed_scale(level, &tuning);
            let b = hazard_speed_scale(level + 1, &tuning);
            prop_assert!(b >= a);
            prop_assert!(b <= tuning.max_speed_scale);
        }

        #[test]
        fn prop_reward_within_bounds(radius in -100.0f32..200.0) {
            let tuning = hazards();
            let reward = hazard_reward(radius, &tuning);
            prop_assert!(reward >= tuning.min_reward && reward <= tuning.max_reward);
        }

        #[test]
        fn prop_level_non_decreasing(score in 0u64..10_000_000, delta in 0u64..10_000) {
            prop_assert!(level_for_score(score + delta, 1000) >= level_for_score(score, 1000));
        }
    }
}
