//! Plan statistics and rule validation.
//!
//! Everything here is a pure function of a finished plan: daily load
//! equivalents, the trailing 10-day rolling load (seeded with a synthetic
//! history before the plan starts), category counts, run-on-workday and
//! run-streak metrics, phase date ranges, and a rule checker used by tests
//! and the CLI.

use crate::{
    engine::{LOOKBACK, WEEK_LEN},
    types::cross_train_load_eq,
    Phase, Plan, PlanDay, PlanPolicy, WorkoutCategory,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// Days in the rolling load window used for reporting
pub const ROLLING_LOAD_DAYS: usize = 10;

/// First and last date of a phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Summary metrics over a finished plan
#[derive(Clone, Debug, PartialEq)]
pub struct PlanStats {
    pub daily_load: Vec<f64>,
    pub rolling_load: Vec<f64>,
    pub category_counts: BTreeMap<WorkoutCategory, usize>,
    pub quality_days: usize,
    pub long_efforts: usize,
    pub total_run_distance: f64,
    pub run_on_workday_count: usize,
    pub max_run_streak: usize,
    pub phase_ranges: BTreeMap<Phase, PhaseRange>,
}

impl PlanStats {
    pub fn count(&self, category: WorkoutCategory) -> usize {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }
}

/// Load-equivalent of one day: run distance plus the cross-training constant
pub fn day_load_eq(day: &PlanDay) -> f64 {
    let run = if day.is_run() {
        day.segment_distance()
    } else {
        0.0
    };
    let cross = match (day.category, day.effort) {
        (WorkoutCategory::CrossTrain, Some(effort)) => cross_train_load_eq(effort),
        _ => 0.0,
    };
    run + cross
}

/// Compute statistics for `days`.
///
/// Indices before the plan start contribute `starting_load / 10` each to
/// the rolling sum.
pub fn compute_stats(days: &[PlanDay], starting_load: f64) -> PlanStats {
    let daily_load: Vec<f64> = days.iter().map(day_load_eq).collect();
    let ghost = crate::types::finite_or(starting_load, 0.0).max(0.0) / ROLLING_LOAD_DAYS as f64;

    let rolling_load = (0..daily_load.len())
        .map(|i| {
            let missing = (ROLLING_LOAD_DAYS - 1).saturating_sub(i);
            let from = (i + 1).saturating_sub(ROLLING_LOAD_DAYS);
            let actual: f64 = daily_load[from..=i].iter().sum();
            actual + ghost * missing as f64
        })
        .collect();

    let mut category_counts = BTreeMap::new();
    for day in days {
        *category_counts.entry(day.category).or_insert(0) += 1;
    }

    let mut run_on_workday_count = 0;
    let mut max_run_streak = 0;
    let mut current_streak = 0;
    for day in days {
        if day.is_run() {
            if day.is_workday {
                run_on_workday_count += 1;
            }
            current_streak += 1;
            max_run_streak = max_run_streak.max(current_streak);
        } else {
            current_streak = 0;
        }
    }

    let mut phase_ranges: BTreeMap<Phase, PhaseRange> = BTreeMap::new();
    for day in days {
        phase_ranges
            .entry(day.phase)
            .and_modify(|range| range.end = day.date)
            .or_insert(PhaseRange {
                start: day.date,
                end: day.date,
            });
    }

    PlanStats {
        daily_load,
        rolling_load,
        category_counts,
        quality_days: days.iter().filter(|d| d.is_quality_day).count(),
        long_efforts: days.iter().filter(|d| d.is_long_effort).count(),
        total_run_distance: crate::types::round_distance(days.iter().map(|d| d.run_distance).sum()),
        run_on_workday_count,
        max_run_streak,
        phase_ranges,
    }
}

/// A broken plan rule
#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    LengthMismatch { expected: usize, actual: usize },
    RunOnWorkday(NaiveDate),
    MultipleRestDays { week: usize, count: usize },
    MultipleLongEfforts { window_end: NaiveDate, count: usize },
    QualityCapExceeded { window_end: NaiveDate, count: usize, cap: usize },
    NegativeLoad(NaiveDate),
    LoadMismatch(NaiveDate),
    PhaseRegression(NaiveDate),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, actual } => {
                write!(f, "plan has {} days, expected {}", actual, expected)
            }
            Self::RunOnWorkday(date) => write!(f, "{}: run scheduled on a workday", date),
            Self::MultipleRestDays { week, count } => {
                write!(f, "week {}: {} rest days", week + 1, count)
            }
            Self::MultipleLongEfforts { window_end, count } => {
                write!(f, "{}: {} long efforts in 7 days", window_end, count)
            }
            Self::QualityCapExceeded {
                window_end,
                count,
                cap,
            } => write!(f, "{}: {} quality days in 7 days (cap {})", window_end, count, cap),
            Self::NegativeLoad(date) => write!(f, "{}: negative or non-finite load", date),
            Self::LoadMismatch(date) => write!(f, "{}: total load is not run + cross-train", date),
            Self::PhaseRegression(date) => write!(f, "{}: phase moved backwards", date),
        }
    }
}

/// Check a finished plan against the scheduling rules.
///
/// Workday runs are only reported when the policy forbids the fallback.
pub fn validate_plan(plan: &Plan, policy: &PlanPolicy) -> Vec<Violation> {
    let mut violations = Vec::new();
    let days = &plan.days;

    let expected = usize::try_from((plan.goal - plan.start).num_days() + 1).unwrap_or(0);
    if days.len() != expected {
        violations.push(Violation::LengthMismatch {
            expected,
            actual: days.len(),
        });
    }

    for (week, chunk) in days.chunks(WEEK_LEN).enumerate() {
        let count = chunk
            .iter()
            .filter(|d| d.category == WorkoutCategory::Rest)
            .count();
        if count > 1 {
            violations.push(Violation::MultipleRestDays { week, count });
        }
    }

    for (index, day) in days.iter().enumerate() {
        if day.is_run() && day.is_workday && !policy.allow_workday_run_fallback {
            violations.push(Violation::RunOnWorkday(day.date));
        }

        let loads = [day.run_distance, day.run_load, day.cross_train_load, day.total_load];
        if loads.iter().any(|v| !v.is_finite() || *v < 0.0) {
            violations.push(Violation::NegativeLoad(day.date));
        }
        if (day.total_load - (day.run_load + day.cross_train_load)).abs() > 1e-9 {
            violations.push(Violation::LoadMismatch(day.date));
        }

        if index > 0 && day.phase < days[index - 1].phase {
            violations.push(Violation::PhaseRegression(day.date));
        }

        let window = &days[index.saturating_sub(LOOKBACK)..=index];
        let longs = window.iter().filter(|d| d.is_long_effort).count();
        if longs > 1 {
            violations.push(Violation::MultipleLongEfforts {
                window_end: day.date,
                count: longs,
            });
        }
        let quality = window.iter().filter(|d| d.is_quality_day).count();
        let cap = policy.quality_cap(day.phase);
        if quality > cap {
            violations.push(Violation::QualityCapExceeded {
                window_end: day.date,
                count: quality,
                cap,
            });
        }
    }

    violations
}
