//! Phase classification by position within the start → goal window.

use crate::Phase;
use chrono::NaiveDate;

/// Classify `date` into a training phase.
///
/// `pct = days_from_start / total_days` (0 when the window is empty):
/// below 0.35 is BASE, below 0.75 BUILD, below 0.90 PEAK, otherwise TAPER.
pub fn phase_for(date: NaiveDate, start: NaiveDate, goal: NaiveDate) -> Phase {
    let total = (goal - start).num_days();
    let from_start = (date - start).num_days();
    let pct = if total == 0 {
        0.0
    } else {
        from_start as f64 / total as f64
    };

    if pct < 0.35 {
        Phase::Base
    } else if pct < 0.75 {
        Phase::Build
    } else if pct < 0.90 {
        Phase::Peak
    } else {
        Phase::Taper
    }
}
