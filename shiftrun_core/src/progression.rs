//! Load ramp and distance sizing.
//!
//! The rolling 10-day load target ramps linearly from the starting load to
//! the peak load between plan start and goal. Run distances are sized from
//! the weekly share of that target:
//! - Long effort: phase-weighted fraction of the weekly target
//! - Quality run: 15% of the weekly target
//! - Easy run: 10% of the weekly target, bounded by the long-run scale

use crate::{
    types::{finite_or, round_distance},
    Phase, PlanPolicy,
};
use chrono::NaiveDate;

/// Weekly share of a rolling 10-day load value
pub const WEEK_OF_ROLLING_WINDOW: f64 = 7.0 / 10.0;

/// Share of the weekly target used for a quality run
pub const QUALITY_WEEKLY_FRACTION: f64 = 0.15;

/// Share of the weekly target used for an easy run
pub const EASY_WEEKLY_FRACTION: f64 = 0.10;

/// Easy runs never exceed this share of the long-run scale
pub const EASY_LONG_FRACTION: f64 = 0.75;

/// Quality runs never exceed this share of the long-run scale
pub const QUALITY_LONG_FRACTION: f64 = 0.8;

/// Goal-week easy runs never exceed this share of the long-run scale
pub const GOAL_WEEK_LONG_FRACTION: f64 = 0.6;

/// Target rolling 10-day load for `date`.
///
/// `starting + (peak - starting) * clamp(progress, 0, 1)` with
/// `progress = days_elapsed / total_days`. Non-finite loads count as 0.
pub fn target_rolling_load(
    date: NaiveDate,
    start: NaiveDate,
    goal: NaiveDate,
    starting_load: f64,
    peak_load: f64,
) -> f64 {
    let starting = finite_or(starting_load, 0.0);
    let peak = finite_or(peak_load, 0.0);
    let total = (goal - start).num_days().max(1) as f64;
    let progress = ((date - start).num_days() as f64 / total).clamp(0.0, 1.0);

    finite_or(starting + (peak - starting) * progress, 0.0).max(0.0)
}

/// Weekly load target derived from a rolling 10-day target
pub fn weekly_target(rolling_target: f64) -> f64 {
    finite_or(rolling_target * WEEK_OF_ROLLING_WINDOW, 0.0).max(0.0)
}

/// Fraction of the weekly target spent on the long effort
pub fn long_effort_fraction(phase: Phase) -> f64 {
    match phase {
        Phase::Base => 0.22,
        Phase::Build => 0.25,
        Phase::Peak => 0.28,
        Phase::Taper => 0.20,
    }
}

/// Long-effort distance for a phase, floored at the policy minimum
pub fn long_effort_distance(phase: Phase, weekly: f64, policy: &PlanPolicy) -> f64 {
    let miles = (weekly * long_effort_fraction(phase)).max(policy.min_long_distance);
    round_distance(finite_or(miles, policy.min_long_distance))
}

/// Quality-run distance, capped below the long-run scale
pub fn quality_run_distance(weekly: f64, long_scale: f64, policy: &PlanPolicy) -> f64 {
    let miles = (weekly * QUALITY_WEEKLY_FRACTION)
        .max(policy.min_quality_distance)
        .min(long_scale * QUALITY_LONG_FRACTION);
    round_distance(miles)
}

/// Easy-run distance: `min(0.75 * long_scale, max(minimum, weekly * 0.10))`
pub fn easy_run_distance(weekly: f64, long_scale: f64, policy: &PlanPolicy) -> f64 {
    let miles = (long_scale * EASY_LONG_FRACTION)
        .min((weekly * EASY_WEEKLY_FRACTION).max(policy.min_easy_distance));
    round_distance(miles)
}

/// Easy-run distance inside the goal week, kept well below the long run
pub fn goal_week_easy_distance(weekly: f64, long_scale: f64, policy: &PlanPolicy) -> f64 {
    let miles = (weekly * EASY_WEEKLY_FRACTION)
        .max(policy.min_easy_distance)
        .min(long_scale * GOAL_WEEK_LONG_FRACTION);
    round_distance(miles)
}

/// Distance a run collapses to when it is demoted to easy on `date`.
///
/// Pure in the date so the generator and the consistency pass agree.
pub fn demotion_distance(
    date: NaiveDate,
    phase: Phase,
    start: NaiveDate,
    goal: NaiveDate,
    starting_load: f64,
    peak_load: f64,
    policy: &PlanPolicy,
) -> f64 {
    let weekly = weekly_target(target_rolling_load(date, start, goal, starting_load, peak_load));
    let long_scale = long_effort_distance(phase, weekly, policy);
    easy_run_distance(weekly, long_scale, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ramp_endpoints_and_midpoint() {
        let start = ymd(2026, 1, 1);
        let goal = start + Duration::days(10);

        assert_eq!(target_rolling_load(start, start, goal, 20.0, 40.0), 20.0);
        assert_eq!(target_rolling_load(goal, start, goal, 20.0, 40.0), 40.0);
        let mid = target_rolling_load(start + Duration::days(5), start, goal, 20.0, 40.0);
        assert!((mid - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_ramp_clamps_outside_window() {
        let start = ymd(2026, 1, 1);
        let goal = start + Duration::days(10);
        let before = start - Duration::days(3);
        let after = goal + Duration::days(3);

        assert_eq!(target_rolling_load(before, start, goal, 20.0, 40.0), 20.0);
        assert_eq!(target_rolling_load(after, start, goal, 20.0, 40.0), 40.0);
    }

    #[test]
    fn test_ramp_normalizes_non_finite_loads() {
        let start = ymd(2026, 1, 1);
        let goal = start + Duration::days(10);
        assert_eq!(target_rolling_load(goal, start, goal, f64::NAN, 40.0), 40.0);
        assert_eq!(target_rolling_load(start, start, goal, 20.0, f64::INFINITY), 20.0);
    }

    #[test]
    fn test_long_effort_floor() {
        let policy = PlanPolicy::default();
        assert_eq!(long_effort_distance(Phase::Base, 10.0, &policy), 5.0);
        assert_eq!(long_effort_distance(Phase::Peak, 40.0, &policy), 11.2);
        assert_eq!(long_effort_distance(Phase::Build, f64::NAN, &policy), 5.0);
    }

    #[test]
    fn test_easy_distance_bounded_by_long_scale() {
        let policy = PlanPolicy::default();
        // weekly * 0.10 = 6.0 but the long scale caps at 0.75 * 6.0
        assert_eq!(easy_run_distance(60.0, 6.0, &policy), 4.5);
        // floor at the easy minimum
        assert_eq!(easy_run_distance(10.0, 8.0, &policy), 3.0);
    }

    #[test]
    fn test_quality_distance_capped_below_long() {
        let policy = PlanPolicy::default();
        assert_eq!(quality_run_distance(40.0, 10.0, &policy), 6.0);
        assert_eq!(quality_run_distance(80.0, 10.0, &policy), 8.0);
    }

    #[test]
    fn test_goal_week_easy_distance() {
        let policy = PlanPolicy::default();
        assert_eq!(goal_week_easy_distance(35.0, 10.0, &policy), 3.5);
        assert_eq!(goal_week_easy_distance(35.0, 5.0, &policy), 3.0);
    }
}
