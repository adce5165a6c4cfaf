//! Workday map construction and loading.
//!
//! A workday is a date with a fixed obligation (a shift). The generator only
//! needs a boolean per date; this module builds that map from ISO-keyed
//! flags or from shift intervals, and loads either form from a JSON file.

use crate::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// A fixed obligation interval
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Shift {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Dates flagged as fixed-obligation days. Missing dates are not workdays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkdayMap {
    days: BTreeMap<NaiveDate, bool>,
}

impl WorkdayMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `YYYY-MM-DD` keyed flags
    pub fn from_iso_map<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut map = Self::new();
        for (key, flag) in entries {
            let date = parse_iso_date(key)?;
            map.days.insert(date, flag);
        }
        Ok(map)
    }

    /// Build from shift intervals.
    ///
    /// Every day touched by `[start, end - 1ms]` is a workday, so a shift
    /// ending exactly at midnight does not claim the following day.
    pub fn from_shifts(shifts: &[Shift]) -> Result<Self> {
        let mut map = Self::new();
        for shift in shifts {
            if shift.end < shift.start {
                return Err(Error::InvalidInput(format!(
                    "Shift ends ({}) before it starts ({})",
                    shift.end, shift.start
                )));
            }
            let last_instant = (shift.end - Duration::milliseconds(1)).max(shift.start);
            let mut day = shift.start.date();
            while day <= last_instant.date() {
                map.days.insert(day, true);
                day += Duration::days(1);
            }
        }
        tracing::debug!("Built workday map with {} days from {} shifts", map.days.len(), shifts.len());
        Ok(map)
    }

    pub fn insert(&mut self, date: NaiveDate, is_workday: bool) {
        self.days.insert(date, is_workday);
    }

    /// Fail-open lookup: unknown dates are not workdays
    pub fn is_workday(&self, date: NaiveDate) -> bool {
        self.days.get(&date).copied().unwrap_or(false)
    }

    /// Number of dates flagged as workdays
    pub fn workday_count(&self) -> usize {
        self.days.values().filter(|flag| **flag).count()
    }
}

impl FromIterator<NaiveDate> for WorkdayMap {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        Self {
            days: iter.into_iter().map(|d| (d, true)).collect(),
        }
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("Invalid date '{}': {}", value, e)))
}

/// On-disk workday formats
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkdayFile {
    Flags(HashMap<String, bool>),
    Shifts(Vec<Shift>),
}

/// Load a workday map from a JSON file.
///
/// Accepts either `{ "YYYY-MM-DD": bool, ... }` or
/// `[{ "start": "...T..", "end": "...T.." }, ...]`.
pub fn load_workdays(path: &Path) -> Result<WorkdayMap> {
    let contents = std::fs::read_to_string(path)?;
    let file: WorkdayFile = serde_json::from_str(&contents).map_err(|e| {
        Error::Workdays(format!("Unrecognized workday file {:?}: {}", path, e))
    })?;

    let map = match file {
        WorkdayFile::Flags(flags) => {
            WorkdayMap::from_iso_map(flags.iter().map(|(k, v)| (k.as_str(), *v)))?
        }
        WorkdayFile::Shifts(shifts) => WorkdayMap::from_shifts(&shifts)?,
    };

    tracing::info!("Loaded {} workdays from {:?}", map.workday_count(), path);
    Ok(map)
}
