//! Training pace ranges derived from VO2max.
//!
//! Paces are display annotations on segments only; scheduling never reads
//! them.

use crate::types::finite_or;
use serde::{Deserialize, Serialize};

/// Display pace ranges per intensity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaceSet {
    pub easy: String,
    pub threshold: String,
    pub interval: String,
}

/// Format minutes-per-mile as `M:SS / mi`
fn min_per_mile_to_string(min_per_mile: f64) -> String {
    let total_seconds = (min_per_mile * 60.0).round().max(0.0) as u64;
    format!("{}:{:02} / mi", total_seconds / 60, total_seconds % 60)
}

fn range(low: f64, high: f64) -> String {
    format!("{}–{}", min_per_mile_to_string(low), min_per_mile_to_string(high))
}

/// Regression fit of 10K pace (min/mi) against VDOT
fn ten_k_pace_from_vdot(vdot: f64) -> f64 {
    13.8 - 0.13 * vdot
}

impl PaceSet {
    /// Derive pace ranges from VO2max using a VDOT proxy of `vo2max - 3`
    pub fn from_vo2max(vo2max: f64) -> Self {
        let vdot = finite_or(vo2max, 50.0).clamp(20.0, 85.0) - 3.0;
        let ten_k = ten_k_pace_from_vdot(vdot);

        let threshold = ten_k + 0.25;
        let interval = ten_k - 0.15;

        Self {
            easy: range(threshold + 1.0, threshold + 1.8),
            threshold: range(threshold - 0.1, threshold + 0.1),
            interval: range(interval - 0.1, interval + 0.1),
        }
    }
}
