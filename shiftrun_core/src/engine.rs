//! Day assignment engine.
//!
//! Walks the plan one date at a time and assigns exactly one workout per day:
//!
//! 1. **Rest**: the week's designated rest day (workday nearest the week
//!    start, else the week's first day; never the goal day)
//! 2. **Workdays**: strength on the fixed strength slots, otherwise
//!    cross-training, promoted to quality when the trailing window allows it
//! 3. **Free days**: a run. Goal day gets the event-distance long effort,
//!    the goal week gets short easy runs, otherwise long effort → quality
//!    run → easy run, in that order of preference
//! 4. **Guards**: no back-to-back quality days, and the trailing 7-day
//!    quality count stays within the phase cap (long efforts are protected)
//!
//! Weekly counters live in an explicit [`WeekState`] threaded through each
//! step. Retroactive fixes to earlier days go through explicit indices on the
//! builder's day array. The consistency pass runs once the array is complete.

use crate::{
    enforcement::enforce_consistency,
    paces::PaceSet,
    phase::phase_for,
    progression::{
        demotion_distance, easy_run_distance, goal_week_easy_distance, long_effort_distance,
        quality_run_distance, target_rolling_load, weekly_target,
    },
    types::finite_or,
    Effort, Error, Phase, Plan, PlanDay, PlanPolicy, RestDayPolicy, Result, Segment,
    WorkdayMap,
};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;
use std::ops::Range;

/// Length of a plan week; weeks are counted from the plan start
pub const WEEK_LEN: usize = 7;

/// Days before the current one that complete a 7-day trailing window
pub const LOOKBACK: usize = 6;

/// Long-run scale used until the first long effort is committed
pub const DEFAULT_LONG_SCALE: f64 = 5.0;

/// Inputs for plan generation
#[derive(Clone, Debug)]
pub struct PlanRequest {
    pub start: NaiveDate,
    pub goal: NaiveDate,
    /// Event distance run on the goal date
    pub event_distance: f64,
    /// Rolling 10-day load at plan start
    pub starting_load: f64,
    /// Rolling 10-day load targeted at the goal date
    pub peak_load: f64,
    /// Optional pace annotations for run segments
    pub paces: Option<PaceSet>,
}

impl PlanRequest {
    /// Reject degenerate ranges before any day is assigned
    pub fn validate(&self) -> Result<()> {
        if self.goal <= self.start {
            return Err(Error::InvalidInput(format!(
                "Goal date {} must be after start date {}",
                self.goal, self.start
            )));
        }
        Ok(())
    }

    /// Inclusive number of days between start and goal
    pub fn day_count(&self) -> usize {
        usize::try_from((self.goal - self.start).num_days() + 1).unwrap_or(0)
    }

    fn normalized(&self, policy: &PlanPolicy) -> Self {
        let mut request = self.clone();
        request.starting_load = normalize_load("starting load", self.starting_load);
        request.peak_load = normalize_load("peak load", self.peak_load);
        let distance = finite_or(self.event_distance, 0.0);
        if distance <= 0.0 {
            tracing::warn!(
                "Event distance {} is unusable, falling back to {}",
                self.event_distance,
                policy.min_long_distance
            );
            request.event_distance = policy.min_long_distance;
        }
        request
    }
}

fn normalize_load(name: &str, value: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        tracing::warn!("Invalid {} {}, using 0", name, value);
        0.0
    } else {
        value
    }
}

/// Weekly counters carried from one day to the next.
///
/// Reset at every week boundary except `last_long_distance` and `rotation`,
/// which persist for the whole plan.
#[derive(Clone, Debug, PartialEq)]
pub struct WeekState {
    pub week_index: usize,
    pub long_effort_scheduled: bool,
    pub quality_count: usize,
    /// Distance of the most recent long effort, used to scale other runs
    pub last_long_distance: f64,
    /// Rotation index over BUILD-phase quality types
    pub rotation: usize,
}

impl WeekState {
    pub fn new(initial_long_distance: f64) -> Self {
        Self {
            week_index: 0,
            long_effort_scheduled: false,
            quality_count: 0,
            last_long_distance: finite_or(initial_long_distance, DEFAULT_LONG_SCALE),
            rotation: 0,
        }
    }

    /// State at the start of `week_index`
    pub fn start_week(self, week_index: usize) -> Self {
        Self {
            week_index,
            long_effort_scheduled: false,
            quality_count: 0,
            ..self
        }
    }

    fn week_start(&self) -> usize {
        self.week_index * WEEK_LEN
    }
}

/// BUILD alternates quality types to avoid monotony
const BUILD_ROTATION: [Effort; 2] = [Effort::Threshold, Effort::Interval];

/// Quality type for the next quality day. The rotation only advances in
/// `commit`, once the day survives the guards.
fn next_quality_effort(phase: Phase, state: &WeekState) -> Effort {
    match phase {
        Phase::Build => BUILD_ROTATION[state.rotation % BUILD_ROTATION.len()],
        Phase::Peak => Effort::Interval,
        Phase::Base | Phase::Taper => Effort::Threshold,
    }
}

/// Per-day facts computed once before assignment
struct DayContext {
    index: usize,
    date: NaiveDate,
    phase: Phase,
    is_workday: bool,
    days_to_goal: i64,
    week_offset: usize,
    weekly: f64,
}

impl DayContext {
    fn is_goal_day(&self) -> bool {
        self.days_to_goal == 0
    }

    /// The final seven days of the plan, goal day included
    fn in_goal_week(&self) -> bool {
        self.days_to_goal <= LOOKBACK as i64
    }
}

/// Mutable day array plus the precomputed calendar facts
struct PlanBuilder<'a> {
    request: &'a PlanRequest,
    policy: &'a PlanPolicy,
    dates: Vec<NaiveDate>,
    workday_flags: Vec<bool>,
    rest_days: BTreeSet<usize>,
    fallback_run_days: BTreeSet<usize>,
    days: Vec<PlanDay>,
}

impl<'a> PlanBuilder<'a> {
    fn new(request: &'a PlanRequest, workdays: &WorkdayMap, policy: &'a PlanPolicy) -> Self {
        let dates: Vec<NaiveDate> = (0..request.day_count())
            .map(|offset| request.start + Duration::days(offset as i64))
            .collect();
        let workday_flags: Vec<bool> = dates.iter().map(|d| workdays.is_workday(*d)).collect();
        let goal_index = dates.len().saturating_sub(1);
        let rest_days = designate_rest_days(&workday_flags, goal_index, policy.rest_day);
        let fallback_run_days = if policy.allow_workday_run_fallback {
            designate_fallback_run_days(&workday_flags, &rest_days, policy)
        } else {
            BTreeSet::new()
        };

        Self {
            request,
            policy,
            workday_flags,
            rest_days,
            fallback_run_days,
            days: Vec::with_capacity(dates.len()),
            dates,
        }
    }

    fn context(&self, index: usize) -> DayContext {
        let date = self.dates[index];
        let rolling = target_rolling_load(
            date,
            self.request.start,
            self.request.goal,
            self.request.starting_load,
            self.request.peak_load,
        );
        DayContext {
            index,
            date,
            phase: phase_for(date, self.request.start, self.request.goal),
            is_workday: self.workday_flags[index],
            days_to_goal: (self.request.goal - date).num_days(),
            week_offset: index % WEEK_LEN,
            weekly: weekly_target(rolling),
        }
    }

    fn easy_pace(&self) -> Option<&str> {
        self.request.paces.as_ref().map(|p| p.easy.as_str())
    }

    fn quality_pace(&self, effort: Effort) -> Option<&str> {
        self.request.paces.as_ref().map(|p| match effort {
            Effort::Interval => p.interval.as_str(),
            _ => p.threshold.as_str(),
        })
    }

    // ------------------------------------------------------------------
    // Trailing window queries over already-assigned days
    // ------------------------------------------------------------------

    fn window(&self, index: usize) -> Range<usize> {
        index.saturating_sub(LOOKBACK)..index.min(self.days.len())
    }

    fn recent_quality_count(&self, index: usize) -> usize {
        self.days[self.window(index)]
            .iter()
            .filter(|d| d.is_quality_day)
            .count()
    }

    fn recent_long_count(&self, index: usize) -> usize {
        self.days[self.window(index)]
            .iter()
            .filter(|d| d.is_long_effort)
            .count()
    }

    fn recent_non_long_quality_count(&self, index: usize) -> usize {
        self.days[self.window(index)]
            .iter()
            .filter(|d| d.is_quality_day && !d.is_long_effort)
            .count()
    }

    fn recent_threshold_count(&self, index: usize) -> usize {
        self.days[self.window(index)]
            .iter()
            .filter(|d| d.is_threshold_type_run())
            .count()
    }

    fn previous_is_quality(&self, index: usize) -> bool {
        index
            .checked_sub(1)
            .and_then(|prev| self.days.get(prev))
            .map_or(false, |d| d.is_quality_day)
    }

    /// Any free (non-workday, non-rest) date later in the current plan week
    fn has_later_free_day_this_week(&self, ctx: &DayContext, state: &WeekState) -> bool {
        let week_end = (state.week_start() + WEEK_LEN).min(self.dates.len());
        (ctx.index + 1..week_end).any(|i| !self.workday_flags[i] && !self.rest_days.contains(&i))
    }

    // ------------------------------------------------------------------
    // Eligibility rules
    // ------------------------------------------------------------------

    /// Shared rule for promoting cross-training and scheduling quality runs
    fn quality_allowed(&self, ctx: &DayContext, state: &WeekState) -> bool {
        let cap = self.policy.quality_cap(ctx.phase);
        ctx.phase != Phase::Base
            && !self.previous_is_quality(ctx.index)
            && self.recent_quality_count(ctx.index) < cap
            && state.quality_count < cap
            && ctx.days_to_goal > self.policy.taper_guard_days
            && self.recent_non_long_quality_count(ctx.index) == 0
    }

    fn taper_threshold_allowed(&self, ctx: &DayContext) -> bool {
        ctx.phase != Phase::Taper
            || self.recent_threshold_count(ctx.index) < self.policy.taper_threshold_cap
    }

    fn long_effort_allowed(&self, ctx: &DayContext, state: &WeekState) -> bool {
        !state.long_effort_scheduled
            && !ctx.in_goal_week()
            && self.recent_long_count(ctx.index) == 0
            && !self.previous_is_quality(ctx.index)
    }

    // ------------------------------------------------------------------
    // Day construction
    // ------------------------------------------------------------------

    fn easy_run(&self, ctx: &DayContext, miles: f64) -> PlanDay {
        PlanDay::run(
            ctx.date,
            ctx.phase,
            ctx.is_workday,
            Effort::Easy,
            vec![Segment::distance("Easy run", miles, self.easy_pace())],
        )
    }

    fn long_run(&self, ctx: &DayContext, label: &str, miles: f64) -> PlanDay {
        PlanDay::run(
            ctx.date,
            ctx.phase,
            ctx.is_workday,
            Effort::Long,
            vec![Segment::distance(label, miles, self.easy_pace())],
        )
    }

    fn quality_run(&self, ctx: &DayContext, effort: Effort, miles: f64) -> PlanDay {
        let main_label = if effort == Effort::Interval {
            "Intervals"
        } else {
            "Threshold"
        };
        PlanDay::run(
            ctx.date,
            ctx.phase,
            ctx.is_workday,
            effort,
            vec![
                Segment::distance("Warmup", miles * 0.25, self.easy_pace()),
                Segment::distance(main_label, miles * 0.55, self.quality_pace(effort)),
                Segment::distance("Cooldown", miles * 0.20, self.easy_pace()),
            ],
        )
    }

    fn demote(&mut self, index: usize) {
        let distance = demotion_distance(
            self.days[index].date,
            self.days[index].phase,
            self.request.start,
            self.request.goal,
            self.request.starting_load,
            self.request.peak_load,
            self.policy,
        );
        let request = self.request;
        let pace = request.paces.as_ref().map(|p| p.easy.as_str());
        self.days[index].demote_to_easy(distance, pace);
    }

    fn demote_current(&self, ctx: &DayContext, day: &mut PlanDay) {
        let distance = demotion_distance(
            ctx.date,
            ctx.phase,
            self.request.start,
            self.request.goal,
            self.request.starting_load,
            self.request.peak_load,
            self.policy,
        );
        day.demote_to_easy(distance, self.easy_pace());
    }

    /// Demote an earlier day and keep the weekly counter honest
    fn demote_earlier(&mut self, index: usize, state: &mut WeekState) {
        if self.days[index].is_quality_day && index >= state.week_start() {
            state.quality_count = state.quality_count.saturating_sub(1);
        }
        self.demote(index);
    }

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------

    fn assign_day(&mut self, index: usize, mut state: WeekState) -> WeekState {
        let ctx = self.context(index);

        if self.rest_days.contains(&index) {
            tracing::debug!("{}: rest ({})", ctx.date, ctx.phase);
            self.days.push(PlanDay::rest(ctx.date, ctx.phase, ctx.is_workday));
            return state;
        }

        let mut day = if ctx.is_workday {
            self.assign_workday(&ctx, &state)
        } else {
            self.assign_free_day(&ctx, &mut state)
        };

        if day.is_quality_day && self.previous_is_quality(index) {
            tracing::debug!("{}: back-to-back quality, demoting to easy", ctx.date);
            self.demote_current(&ctx, &mut day);
        }

        self.apply_window_guard(&ctx, &mut day, &mut state);
        self.commit(&ctx, day, state)
    }

    fn assign_workday(&self, ctx: &DayContext, state: &WeekState) -> PlanDay {
        if self.policy.is_strength_slot(ctx.week_offset) {
            return PlanDay::strength(ctx.date, ctx.phase, true);
        }

        if self.fallback_run_days.contains(&ctx.index) {
            tracing::warn!(
                "{}: no free day this week, scheduling an easy run on a workday",
                ctx.date
            );
            let miles = easy_run_distance(ctx.weekly, state.last_long_distance, self.policy);
            return self.easy_run(ctx, miles);
        }

        let effort = if self.quality_allowed(ctx, state) {
            next_quality_effort(ctx.phase, state)
        } else {
            Effort::Easy
        };
        PlanDay::cross_train(ctx.date, ctx.phase, true, effort)
    }

    fn assign_free_day(&mut self, ctx: &DayContext, state: &mut WeekState) -> PlanDay {
        self.release_previous_quality(ctx, state);

        let long_scale = state.last_long_distance;

        if ctx.is_goal_day() {
            return self.assign_goal_day(ctx, state);
        }

        if ctx.in_goal_week() {
            let miles = goal_week_easy_distance(ctx.weekly, long_scale, self.policy);
            return self.easy_run(ctx, miles);
        }

        if self.long_effort_allowed(ctx, state) {
            let miles = long_effort_distance(ctx.phase, ctx.weekly, self.policy);
            return self.long_run(ctx, "Long run", miles);
        }

        if self.quality_allowed(ctx, state) && self.taper_threshold_allowed(ctx) {
            let effort = next_quality_effort(ctx.phase, state);
            let miles = quality_run_distance(ctx.weekly, long_scale, self.policy);
            return self.quality_run(ctx, effort, miles);
        }

        let miles = easy_run_distance(ctx.weekly, long_scale, self.policy);
        self.easy_run(ctx, miles)
    }

    fn assign_goal_day(&self, ctx: &DayContext, state: &WeekState) -> PlanDay {
        let previous_quality = self.previous_is_quality(ctx.index);

        if !previous_quality && self.recent_long_count(ctx.index) == 0 {
            return self.long_run(ctx, "Goal run", self.request.event_distance);
        }

        if !previous_quality
            && self.recent_non_long_quality_count(ctx.index) == 0
            && self.taper_threshold_allowed(ctx)
        {
            let miles = quality_run_distance(ctx.weekly, state.last_long_distance, self.policy)
                .min(self.request.event_distance);
            return self.quality_run(ctx, Effort::Threshold, miles);
        }

        let miles = goal_week_easy_distance(ctx.weekly, state.last_long_distance, self.policy);
        self.easy_run(ctx, miles)
    }

    /// Free up the previous day when today is the week's last chance at a
    /// long effort and yesterday's quality work would block it.
    fn release_previous_quality(&mut self, ctx: &DayContext, state: &mut WeekState) {
        let Some(prev) = ctx.index.checked_sub(1) else {
            return;
        };
        let previous = &self.days[prev];
        if !previous.is_quality_day || previous.is_long_effort {
            return;
        }
        if !ctx.is_goal_day() && (ctx.in_goal_week() || state.long_effort_scheduled) {
            return;
        }
        if self.recent_long_count(ctx.index) > 0 || self.has_later_free_day_this_week(ctx, state) {
            return;
        }

        tracing::debug!(
            "{}: releasing quality work on {} to make room for the long effort",
            ctx.date,
            previous.date
        );
        self.demote_earlier(prev, state);
    }

    /// Keep the trailing quality count within the phase cap, protecting long efforts
    fn apply_window_guard(&mut self, ctx: &DayContext, day: &mut PlanDay, state: &mut WeekState) {
        if !day.is_quality_day {
            return;
        }
        let cap = self.policy.quality_cap(ctx.phase);
        if self.recent_quality_count(ctx.index) + 1 <= cap {
            return;
        }

        if day.is_long_effort {
            let earlier = self
                .window(ctx.index)
                .find(|&i| self.days[i].is_quality_day && !self.days[i].is_long_effort);
            if let Some(index) = earlier {
                tracing::debug!(
                    "{}: quality cap {} reached, demoting {} to protect the long effort",
                    ctx.date,
                    cap,
                    self.days[index].date
                );
                self.demote_earlier(index, state);
                return;
            }
        }

        tracing::debug!("{}: quality cap {} reached, demoting to easy", ctx.date, cap);
        self.demote_current(ctx, day);
    }

    fn commit(&mut self, ctx: &DayContext, day: PlanDay, mut state: WeekState) -> WeekState {
        if day.is_long_effort {
            state.long_effort_scheduled = true;
            if day.run_distance > 0.0 {
                state.last_long_distance = finite_or(day.run_distance, DEFAULT_LONG_SCALE);
            }
        }
        if day.is_quality_day {
            state.quality_count += 1;
            if ctx.phase == Phase::Build && !day.is_long_effort {
                state.rotation += 1;
            }
        }

        tracing::debug!(
            "{}: {} {:?} {:.1} mi ({})",
            ctx.date,
            day.category,
            day.effort,
            day.run_distance,
            ctx.phase
        );
        self.days.push(day);
        state
    }
}

/// Choose one rest day per plan week. The goal day is never a rest day.
fn designate_rest_days(
    workday_flags: &[bool],
    goal_index: usize,
    policy: RestDayPolicy,
) -> BTreeSet<usize> {
    let mut rest_days = BTreeSet::new();
    for week_start in (0..workday_flags.len()).step_by(WEEK_LEN) {
        let week_end = (week_start + WEEK_LEN).min(workday_flags.len());
        let candidates: Vec<usize> = (week_start..week_end).filter(|&i| i != goal_index).collect();

        let chosen = match policy {
            RestDayPolicy::NearestWorkday => candidates
                .iter()
                .copied()
                .find(|&i| workday_flags[i])
                .or_else(|| candidates.first().copied()),
            RestDayPolicy::WeekStart => candidates.first().copied(),
        };

        if let Some(index) = chosen {
            rest_days.insert(index);
        }
    }
    rest_days
}

/// Last-resort run slots for weeks without a single free day
fn designate_fallback_run_days(
    workday_flags: &[bool],
    rest_days: &BTreeSet<usize>,
    policy: &PlanPolicy,
) -> BTreeSet<usize> {
    let mut fallback = BTreeSet::new();
    for week_start in (0..workday_flags.len()).step_by(WEEK_LEN) {
        let week_end = (week_start + WEEK_LEN).min(workday_flags.len());
        let has_free_day =
            (week_start..week_end).any(|i| !workday_flags[i] && !rest_days.contains(&i));
        if has_free_day {
            continue;
        }

        let slot = (week_start..week_end).rev().find(|&i| {
            !rest_days.contains(&i) && !policy.is_strength_slot(i - week_start)
        });
        if let Some(index) = slot {
            fallback.insert(index);
        }
    }
    fallback
}

/// Generate a complete plan: greedy day assignment, then the consistency pass.
///
/// Fails only when the date range is degenerate (goal not after start).
/// Bad numbers are normalized and logged instead of aborting.
pub fn generate_plan(
    request: &PlanRequest,
    workdays: &WorkdayMap,
    policy: &PlanPolicy,
) -> Result<Plan> {
    request.validate()?;
    let policy = policy.normalized();
    let request = request.normalized(&policy);

    tracing::info!(
        "Generating plan {} → {} ({} days, load {:.1} → {:.1})",
        request.start,
        request.goal,
        request.day_count(),
        request.starting_load,
        request.peak_load
    );

    let mut builder = PlanBuilder::new(&request, workdays, &policy);
    let mut state = WeekState::new(DEFAULT_LONG_SCALE);
    for index in 0..builder.dates.len() {
        if index % WEEK_LEN == 0 {
            state = state.start_week(index / WEEK_LEN);
        }
        state = builder.assign_day(index, state);
    }

    let mut days = builder.days;
    let report = enforce_consistency(&mut days, &request, &policy);

    for anomaly in &report.anomalies {
        tracing::warn!("Unresolved plan anomaly ending {}: {}", anomaly.window_end, anomaly.description);
    }
    tracing::info!(
        "Plan ready: {} days, {} demotions, {} capped runs",
        days.len(),
        report.demotions.len(),
        report.capped_runs
    );

    Ok(Plan {
        start: request.start,
        goal: request.goal,
        event_distance: request.event_distance,
        days,
        report,
    })
}
