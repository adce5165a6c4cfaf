//! Consistency enforcement over a completed plan.
//!
//! The greedy day-by-day pass cannot see later days, so a second pass walks
//! fixed 7-day windows across the finished sequence and repairs what it
//! finds. It only ever demotes or shortens work; days are never removed and
//! the pass never fails. Violations it cannot repair are returned as
//! anomalies.
//!
//! Order matters: the taper guard runs first so the goal-day long effort is
//! the only long effort left near the goal before duplicates are resolved.

use crate::{
    engine::{PlanRequest, LOOKBACK},
    progression::demotion_distance,
    Anomaly, Demotion, DemotionReason, Effort, EnforcementReport, PlanDay, PlanPolicy,
    WorkoutCategory,
};
use std::ops::RangeInclusive;

/// Run every repair step over `days` in place
pub fn enforce_consistency(
    days: &mut [PlanDay],
    request: &PlanRequest,
    policy: &PlanPolicy,
) -> EnforcementReport {
    let mut pass = ConsistencyPass {
        days,
        request,
        policy,
        report: EnforcementReport::default(),
    };

    pass.protect_taper();
    pass.resolve_duplicate_long_efforts();
    pass.cap_threshold_runs();
    pass.enforce_quality_caps();

    pass.report
}

/// Lower value = demoted first when a window holds too much quality work
fn demotion_priority(day: &PlanDay) -> u8 {
    match (day.category, day.effort) {
        (WorkoutCategory::CrossTrain, _) => 0,
        (WorkoutCategory::Run, Some(Effort::Interval)) => 1,
        (WorkoutCategory::Run, Some(Effort::Threshold)) => 2,
        (WorkoutCategory::Run, Some(Effort::Long)) => 3,
        _ => 4,
    }
}

struct ConsistencyPass<'a> {
    days: &'a mut [PlanDay],
    request: &'a PlanRequest,
    policy: &'a PlanPolicy,
    report: EnforcementReport,
}

impl ConsistencyPass<'_> {
    fn window(&self, end: usize) -> RangeInclusive<usize> {
        end.saturating_sub(LOOKBACK)..=end
    }

    fn days_to_goal(&self, index: usize) -> i64 {
        (self.request.goal - self.days[index].date).num_days()
    }

    fn demote(&mut self, index: usize, reason: DemotionReason) {
        let day = &self.days[index];
        let distance = demotion_distance(
            day.date,
            day.phase,
            self.request.start,
            self.request.goal,
            self.request.starting_load,
            self.request.peak_load,
            self.policy,
        );
        let request = self.request;
        let pace = request.paces.as_ref().map(|p| p.easy.as_str());

        tracing::debug!("{}: demoted to easy ({:?})", day.date, reason);
        let date = day.date;
        self.days[index].demote_to_easy(distance, pace);
        self.report.demotions.push(Demotion { date, reason });
    }

    fn cap_run(&mut self, index: usize, limit: f64) {
        if self.days[index].run_distance > limit {
            tracing::debug!(
                "{}: capping run at {:.1} mi (was {:.1})",
                self.days[index].date,
                limit,
                self.days[index].run_distance
            );
            self.days[index].cap_run_distance(limit);
            self.report.capped_runs += 1;
        }
    }

    /// No long effort in the six days leading into the goal
    fn protect_taper(&mut self) {
        for index in 0..self.days.len() {
            let days_to_goal = self.days_to_goal(index);
            if (1..=LOOKBACK as i64).contains(&days_to_goal) && self.days[index].is_long_effort {
                self.demote(index, DemotionReason::TaperLongEffort);
            }
        }
    }

    /// Keep the earliest long effort per window and cap the window's other runs to it
    fn resolve_duplicate_long_efforts(&mut self) {
        for end in 0..self.days.len() {
            let longs: Vec<usize> = self
                .window(end)
                .filter(|&i| self.days[i].is_long_effort)
                .collect();
            if longs.len() < 2 {
                continue;
            }

            let keep = longs[0];
            for &index in &longs[1..] {
                self.demote(index, DemotionReason::DuplicateLongEffort);
            }

            let limit = self.days[keep].run_distance;
            for index in self.window(end) {
                if index != keep && self.days[index].is_run() {
                    self.cap_run(index, limit);
                }
            }
        }
    }

    /// Threshold-type runs stay within a share of the nearest long effort
    fn cap_threshold_runs(&mut self) {
        let longs: Vec<usize> = (0..self.days.len())
            .filter(|&i| self.days[i].is_long_effort)
            .collect();

        for index in 0..self.days.len() {
            if !self.days[index].is_threshold_type_run() {
                continue;
            }

            // Ties go to the earlier long effort
            let nearest = longs
                .iter()
                .copied()
                .min_by_key(|&long| (long.abs_diff(index), long));

            match nearest {
                Some(long) => {
                    let limit = self.days[long].run_distance * self.policy.threshold_long_ratio;
                    self.cap_run(index, limit);
                }
                None => self.demote(index, DemotionReason::ThresholdWithoutLongEffort),
            }
        }
    }

    /// Trailing 7-day quality count stays within the cap of the window's last day
    fn enforce_quality_caps(&mut self) {
        for end in 0..self.days.len() {
            let cap = self.policy.quality_cap(self.days[end].phase);

            loop {
                let quality: Vec<usize> = self
                    .window(end)
                    .filter(|&i| self.days[i].is_quality_day)
                    .collect();
                if quality.len() <= cap {
                    break;
                }

                // The goal-day effort is the event itself and is never demoted
                let candidate = quality
                    .iter()
                    .copied()
                    .filter(|&i| self.days_to_goal(i) != 0)
                    .min_by_key(|&i| (demotion_priority(&self.days[i]), i));

                match candidate {
                    Some(index) => self.demote(index, DemotionReason::QualityCap),
                    None => {
                        let anomaly = Anomaly {
                            window_end: self.days[end].date,
                            description: format!(
                                "{} quality days exceed cap {} with nothing left to demote",
                                quality.len(),
                                cap
                            ),
                        };
                        tracing::warn!("{}: {}", anomaly.window_end, anomaly.description);
                        self.report.anomalies.push(anomaly);
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Phase, QualityCaps, Segment};
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 6).unwrap()
    }

    fn request(days: i64) -> PlanRequest {
        PlanRequest {
            start: start(),
            goal: start() + Duration::days(days - 1),
            event_distance: 10.0,
            starting_load: 30.0,
            peak_load: 50.0,
            paces: None,
        }
    }

    fn easy(index: i64, phase: Phase) -> PlanDay {
        PlanDay::run(
            start() + Duration::days(index),
            phase,
            false,
            Effort::Easy,
            vec![Segment::distance("Easy run", 4.0, None)],
        )
    }

    fn long(index: i64, phase: Phase, miles: f64) -> PlanDay {
        PlanDay::run(
            start() + Duration::days(index),
            phase,
            false,
            Effort::Long,
            vec![Segment::distance("Long run", miles, None)],
        )
    }

    fn threshold(index: i64, phase: Phase, miles: f64) -> PlanDay {
        PlanDay::run(
            start() + Duration::days(index),
            phase,
            false,
            Effort::Threshold,
            vec![Segment::distance("Threshold", miles, None)],
        )
    }

    fn build_days(count: i64, phase: Phase) -> Vec<PlanDay> {
        (0..count).map(|i| easy(i, phase)).collect()
    }

    #[test]
    fn test_duplicate_long_efforts_keep_earliest() {
        let mut days = build_days(21, Phase::Build);
        days[2] = long(2, Phase::Build, 8.0);
        days[5] = long(5, Phase::Build, 10.0);
        days[4] = PlanDay::run(
            days[4].date,
            Phase::Build,
            false,
            Effort::Easy,
            vec![Segment::distance("Easy run", 9.0, None)],
        );

        let report = enforce_consistency(&mut days, &request(21), &PlanPolicy::default());

        assert!(days[2].is_long_effort);
        assert!(!days[5].is_long_effort);
        assert_eq!(days[5].effort, Some(Effort::Easy));
        assert!(days[4].run_distance <= 8.0);
        assert!(report
            .demotions
            .iter()
            .any(|d| d.reason == DemotionReason::DuplicateLongEffort && d.date == days[5].date));
    }

    #[test]
    fn test_taper_long_effort_demoted_but_goal_kept() {
        let mut days = build_days(21, Phase::Taper);
        days[17] = long(17, Phase::Taper, 9.0);
        days[20] = long(20, Phase::Taper, 10.0);

        let report = enforce_consistency(&mut days, &request(21), &PlanPolicy::default());

        assert!(!days[17].is_long_effort);
        assert!(days[20].is_long_effort);
        assert_eq!(days[20].run_distance, 10.0);
        assert!(report
            .demotions
            .iter()
            .any(|d| d.reason == DemotionReason::TaperLongEffort));
    }

    #[test]
    fn test_threshold_capped_to_nearest_long() {
        let mut days = build_days(21, Phase::Build);
        days[1] = long(1, Phase::Build, 10.0);
        days[10] = long(10, Phase::Build, 5.0);
        // Index 4 is nearer to the 10-mile long effort
        days[4] = threshold(4, Phase::Build, 7.0);
        // Index 13 is nearer to the 5-mile long effort
        days[13] = threshold(13, Phase::Build, 7.0);

        let report = enforce_consistency(&mut days, &request(21), &PlanPolicy::default());

        assert!(days[4].run_distance <= 6.0);
        assert!(days[4].is_quality_day);
        assert!(days[13].run_distance <= 3.0);
        assert!(report.capped_runs >= 2);
    }

    #[test]
    fn test_threshold_tie_uses_earliest_long() {
        let mut days = build_days(21, Phase::Build);
        days[2] = long(2, Phase::Build, 10.0);
        days[10] = long(10, Phase::Build, 5.0);
        days[6] = threshold(6, Phase::Build, 7.0);

        enforce_consistency(&mut days, &request(21), &PlanPolicy::default());

        assert!(days[10].is_long_effort);
        assert!(days[6].run_distance <= 6.0);
        assert!(days[6].run_distance > 3.0);
    }

    #[test]
    fn test_threshold_without_long_effort_demoted() {
        let mut days = build_days(14, Phase::Build);
        days[3] = threshold(3, Phase::Build, 6.0);

        let report = enforce_consistency(&mut days, &request(14), &PlanPolicy::default());

        assert!(!days[3].is_quality_day);
        assert_eq!(days[3].effort, Some(Effort::Easy));
        assert!(report
            .demotions
            .iter()
            .any(|d| d.reason == DemotionReason::ThresholdWithoutLongEffort));
    }

    #[test]
    fn test_quality_cap_demotes_lowest_priority_first() {
        let mut days = build_days(21, Phase::Peak);
        days[1] = long(1, Phase::Peak, 10.0);
        days[3] = threshold(3, Phase::Peak, 5.0);
        days[5] = PlanDay::cross_train(days[5].date, Phase::Peak, true, Effort::Interval);

        let report = enforce_consistency(&mut days, &request(21), &PlanPolicy::default());

        // PEAK cap is 2: the cross-training session goes first
        assert!(days[1].is_long_effort);
        assert!(days[3].is_quality_day);
        assert!(!days[5].is_quality_day);
        assert_eq!(days[5].category, WorkoutCategory::CrossTrain);
        assert_eq!(days[5].total_load, 2.5);
        assert!(report
            .demotions
            .iter()
            .any(|d| d.reason == DemotionReason::QualityCap));
    }

    #[test]
    fn test_unresolvable_cap_recorded_as_anomaly() {
        let policy = PlanPolicy {
            quality_caps: QualityCaps {
                taper: 0,
                ..QualityCaps::default()
            },
            ..PlanPolicy::default()
        };
        let mut days = build_days(14, Phase::Taper);
        days[13] = long(13, Phase::Taper, 10.0);

        let report = enforce_consistency(&mut days, &request(14), &policy);

        assert!(days[13].is_long_effort);
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].window_end, days[13].date);
    }

    #[test]
    fn test_clean_plan_untouched() {
        let mut days = build_days(21, Phase::Build);
        days[1] = long(1, Phase::Build, 8.0);
        days[8] = long(8, Phase::Build, 8.0);
        let before = days.clone();

        let report = enforce_consistency(&mut days, &request(21), &PlanPolicy::default());

        assert_eq!(days, before);
        assert!(report.demotions.is_empty());
        assert!(report.anomalies.is_empty());
    }
}
