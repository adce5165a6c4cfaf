//! Core domain types for the shiftrun plan generator.
//!
//! This module defines the fundamental types used throughout the system:
//! - Training phases and workout categories
//! - Segments and plan days
//! - The finished plan and its enforcement report
//! - Load-equivalent constants and numeric normalization

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Phase and Category Types
// ============================================================================

/// Training phase, ordered from plan start to goal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Base,
    Build,
    Peak,
    Taper,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "BASE"),
            Self::Build => write!(f, "BUILD"),
            Self::Peak => write!(f, "PEAK"),
            Self::Taper => write!(f, "TAPER"),
        }
    }
}

/// Kind of workout assigned to a day. Exactly one per day.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutCategory {
    Run,
    CrossTrain,
    Strength,
    Rest,
}

impl fmt::Display for WorkoutCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "run"),
            Self::CrossTrain => write!(f, "cross-train"),
            Self::Strength => write!(f, "strength"),
            Self::Rest => write!(f, "rest"),
        }
    }
}

/// Intensity of a cross-training session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrossTrainIntensity {
    #[default]
    None,
    Easy,
    Quality,
}

/// Stimulus of a run or cross-training session.
///
/// `Long` only ever appears on runs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Easy,
    Threshold,
    Interval,
    Long,
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Threshold => write!(f, "threshold"),
            Self::Interval => write!(f, "intervals"),
            Self::Long => write!(f, "long"),
        }
    }
}

// ============================================================================
// Load-equivalent constants
// ============================================================================

/// Load-equivalent of an easy cross-training session
pub const CROSS_TRAIN_EASY_LOAD: f64 = 2.5;

/// Load-equivalent of a threshold cross-training session
pub const CROSS_TRAIN_THRESHOLD_LOAD: f64 = 4.5;

/// Load-equivalent of an interval cross-training session
pub const CROSS_TRAIN_INTERVAL_LOAD: f64 = 5.5;

/// Cross-training load-equivalent for a given effort
pub fn cross_train_load_eq(effort: Effort) -> f64 {
    match effort {
        Effort::Easy => CROSS_TRAIN_EASY_LOAD,
        Effort::Threshold => CROSS_TRAIN_THRESHOLD_LOAD,
        Effort::Interval | Effort::Long => CROSS_TRAIN_INTERVAL_LOAD,
    }
}

// ============================================================================
// Numeric normalization
// ============================================================================

/// Replace a non-finite value with `fallback`
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Round a distance to one decimal, mapping non-finite and negative values to 0
pub fn round_distance(value: f64) -> f64 {
    let value = finite_or(value, 0.0).max(0.0);
    (value * 10.0).round() / 10.0
}

// ============================================================================
// Segment and PlanDay
// ============================================================================

/// One entry of a day's workout breakdown
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u32>,
}

impl Segment {
    /// A distance segment with an optional pace annotation
    pub fn distance(label: impl Into<String>, miles: f64, pace: Option<&str>) -> Self {
        Self {
            label: label.into(),
            distance: Some(round_distance(miles)),
            pace: pace.map(str::to_string),
            duration_min: None,
        }
    }

    /// A time-boxed segment without distance
    pub fn timed(label: impl Into<String>, minutes: u32) -> Self {
        Self {
            label: label.into(),
            distance: None,
            pace: None,
            duration_min: Some(minutes),
        }
    }
}

/// A single day of the plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlanDay {
    pub date: NaiveDate,
    pub phase: Phase,
    pub category: WorkoutCategory,
    /// Stimulus for runs and cross-training, `None` for rest and strength
    pub effort: Option<Effort>,
    pub cross_train_intensity: CrossTrainIntensity,
    pub is_workday: bool,
    pub segments: Vec<Segment>,
    pub run_distance: f64,
    pub run_load: f64,
    pub cross_train_load: f64,
    pub total_load: f64,
    pub is_long_effort: bool,
    pub is_quality_day: bool,
}

impl PlanDay {
    fn blank(date: NaiveDate, phase: Phase, is_workday: bool, category: WorkoutCategory) -> Self {
        Self {
            date,
            phase,
            category,
            effort: None,
            cross_train_intensity: CrossTrainIntensity::None,
            is_workday,
            segments: Vec::new(),
            run_distance: 0.0,
            run_load: 0.0,
            cross_train_load: 0.0,
            total_load: 0.0,
            is_long_effort: false,
            is_quality_day: false,
        }
    }

    pub fn rest(date: NaiveDate, phase: Phase, is_workday: bool) -> Self {
        Self::blank(date, phase, is_workday, WorkoutCategory::Rest)
    }

    pub fn strength(date: NaiveDate, phase: Phase, is_workday: bool) -> Self {
        let mut day = Self::blank(date, phase, is_workday, WorkoutCategory::Strength);
        day.segments = vec![Segment::timed("Strength", 30)];
        day
    }

    pub fn cross_train(date: NaiveDate, phase: Phase, is_workday: bool, effort: Effort) -> Self {
        let mut day = Self::blank(date, phase, is_workday, WorkoutCategory::CrossTrain);
        day.set_cross_train_effort(effort);
        day
    }

    pub fn run(
        date: NaiveDate,
        phase: Phase,
        is_workday: bool,
        effort: Effort,
        segments: Vec<Segment>,
    ) -> Self {
        let mut day = Self::blank(date, phase, is_workday, WorkoutCategory::Run);
        day.effort = Some(effort);
        day.segments = segments;
        day.is_long_effort = effort == Effort::Long;
        day.is_quality_day = effort != Effort::Easy;
        day.recompute_loads();
        day
    }

    fn set_cross_train_effort(&mut self, effort: Effort) {
        let effort = if effort == Effort::Long {
            Effort::Interval
        } else {
            effort
        };
        let minutes = if effort == Effort::Easy { 45 } else { 40 };
        let label = match effort {
            Effort::Easy => "Easy ride",
            Effort::Threshold => "Threshold ride",
            _ => "Interval ride",
        };
        self.effort = Some(effort);
        self.cross_train_intensity = if effort == Effort::Easy {
            CrossTrainIntensity::Easy
        } else {
            CrossTrainIntensity::Quality
        };
        self.is_quality_day = effort != Effort::Easy;
        self.is_long_effort = false;
        self.segments = vec![Segment::timed(label, minutes)];
        self.recompute_loads();
    }

    pub fn is_run(&self) -> bool {
        self.category == WorkoutCategory::Run
    }

    /// Threshold or interval run (quality work that is not the long effort)
    pub fn is_threshold_type_run(&self) -> bool {
        self.is_run() && matches!(self.effort, Some(Effort::Threshold | Effort::Interval))
    }

    /// Sum of segment distances, ignoring non-finite entries
    pub fn segment_distance(&self) -> f64 {
        let total: f64 = self
            .segments
            .iter()
            .filter_map(|s| s.distance)
            .map(|d| finite_or(d, 0.0).max(0.0))
            .sum();
        round_distance(total)
    }

    /// Recompute run distance and loads from segments and category.
    ///
    /// Must be called after every mutation; `total_load` is always
    /// `run_load + cross_train_load`.
    pub fn recompute_loads(&mut self) {
        self.run_distance = if self.is_run() {
            self.segment_distance()
        } else {
            0.0
        };
        self.run_load = self.run_distance;
        self.cross_train_load = match (self.category, self.effort) {
            (WorkoutCategory::CrossTrain, Some(effort)) => cross_train_load_eq(effort),
            _ => 0.0,
        };
        self.total_load = finite_or(self.run_load, 0.0) + finite_or(self.cross_train_load, 0.0);
    }

    /// Downgrade a quality day to easy work.
    ///
    /// Runs collapse to a single "Easy" segment no longer than the previous
    /// distance; cross-training drops to easy intensity.
    pub fn demote_to_easy(&mut self, easy_distance: f64, easy_pace: Option<&str>) {
        match self.category {
            WorkoutCategory::Run => {
                let miles = self.run_distance.min(finite_or(easy_distance, 0.0));
                self.effort = Some(Effort::Easy);
                self.segments = vec![Segment::distance("Easy", miles, easy_pace)];
                self.is_long_effort = false;
                self.is_quality_day = false;
                self.recompute_loads();
            }
            WorkoutCategory::CrossTrain => self.set_cross_train_effort(Effort::Easy),
            WorkoutCategory::Strength | WorkoutCategory::Rest => {}
        }
    }

    /// Scale run segments down so the run distance does not exceed `limit`
    pub fn cap_run_distance(&mut self, limit: f64) {
        let limit = round_distance(limit);
        if !self.is_run() || self.run_distance <= limit {
            return;
        }
        let factor = if self.run_distance > 0.0 {
            limit / self.run_distance
        } else {
            0.0
        };
        for segment in &mut self.segments {
            if let Some(d) = segment.distance {
                segment.distance = Some(round_distance(d * factor));
            }
        }

        // Per-segment rounding can overshoot by a tenth or two
        let excess = round_distance(self.segment_distance() - limit);
        if excess > 0.0 {
            if let Some(largest) = self
                .segments
                .iter_mut()
                .filter(|s| s.distance.is_some())
                .max_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal))
            {
                largest.distance = largest.distance.map(|d| round_distance(d - excess));
            }
        }
        self.recompute_loads();
    }
}

// ============================================================================
// Plan and Enforcement Report
// ============================================================================

/// Why the consistency pass downgraded a day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DemotionReason {
    DuplicateLongEffort,
    ThresholdWithoutLongEffort,
    TaperLongEffort,
    QualityCap,
}

/// A downgrade applied by the consistency pass
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Demotion {
    pub date: NaiveDate,
    pub reason: DemotionReason,
}

/// A rule violation the consistency pass could not repair
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Anomaly {
    pub window_end: NaiveDate,
    pub description: String,
}

/// Outcome of the consistency pass
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct EnforcementReport {
    pub demotions: Vec<Demotion>,
    pub capped_runs: usize,
    pub anomalies: Vec<Anomaly>,
}

/// A complete generated plan, one day per date from start to goal inclusive
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub start: NaiveDate,
    pub goal: NaiveDate,
    pub event_distance: f64,
    pub days: Vec<PlanDay>,
    #[serde(default)]
    pub report: EnforcementReport,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&PlanDay> {
        let offset = (date - self.start).num_days();
        usize::try_from(offset).ok().and_then(|i| self.days.get(i))
    }
}
