//! Configuration file support for shiftrun.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/shiftrun/config.toml`.
//! Every field has a default, so partial files are fine.

use crate::{types::finite_or, Error, Phase, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub plan: PlanPolicy,

    #[serde(default)]
    pub athlete: AthleteConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// How the single rest day of a plan week is chosen
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RestDayPolicy {
    /// The workday closest to the week start, else the week's first day
    #[default]
    NearestWorkday,
    /// Always the week's first day
    WeekStart,
}

/// Per-phase cap on quality days inside any 7-day trailing window
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QualityCaps {
    #[serde(default = "default_base_cap")]
    pub base: usize,
    #[serde(default = "default_build_cap")]
    pub build: usize,
    #[serde(default = "default_peak_cap")]
    pub peak: usize,
    #[serde(default = "default_taper_cap")]
    pub taper: usize,
}

impl Default for QualityCaps {
    fn default() -> Self {
        Self {
            base: default_base_cap(),
            build: default_build_cap(),
            peak: default_peak_cap(),
            taper: default_taper_cap(),
        }
    }
}

/// Scheduling policy constants used by the generator and the consistency pass
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlanPolicy {
    /// 0-based offsets within a plan week where workdays get strength work
    #[serde(default = "default_strength_week_days")]
    pub strength_week_days: Vec<usize>,

    #[serde(default)]
    pub rest_day: RestDayPolicy,

    #[serde(default = "default_min_long_distance")]
    pub min_long_distance: f64,

    #[serde(default = "default_min_quality_distance")]
    pub min_quality_distance: f64,

    #[serde(default = "default_min_easy_distance")]
    pub min_easy_distance: f64,

    /// Threshold-type runs may not exceed this share of the nearest long effort
    #[serde(default = "default_threshold_long_ratio")]
    pub threshold_long_ratio: f64,

    /// No new quality work this many days (or fewer) before the goal
    #[serde(default = "default_taper_guard_days")]
    pub taper_guard_days: i64,

    /// Threshold-type runs allowed per trailing window during TAPER
    #[serde(default = "default_taper_threshold_cap")]
    pub taper_threshold_cap: usize,

    /// Put an easy run on a workday when a week has no free day at all
    #[serde(default)]
    pub allow_workday_run_fallback: bool,

    #[serde(default)]
    pub quality_caps: QualityCaps,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            strength_week_days: default_strength_week_days(),
            rest_day: RestDayPolicy::default(),
            min_long_distance: default_min_long_distance(),
            min_quality_distance: default_min_quality_distance(),
            min_easy_distance: default_min_easy_distance(),
            threshold_long_ratio: default_threshold_long_ratio(),
            taper_guard_days: default_taper_guard_days(),
            taper_threshold_cap: default_taper_threshold_cap(),
            allow_workday_run_fallback: false,
            quality_caps: QualityCaps::default(),
        }
    }
}

impl PlanPolicy {
    /// Quality-day cap for a 7-day window ending in `phase`
    pub fn quality_cap(&self, phase: Phase) -> usize {
        match phase {
            Phase::Base => self.quality_caps.base,
            Phase::Build => self.quality_caps.build,
            Phase::Peak => self.quality_caps.peak,
            Phase::Taper => self.quality_caps.taper,
        }
    }

    /// Whether a 0-based offset within the plan week is a strength slot
    pub fn is_strength_slot(&self, week_offset: usize) -> bool {
        self.strength_week_days.contains(&week_offset)
    }

    /// Replace non-finite, zero or negative distances and ratios with their defaults
    pub fn normalized(&self) -> Self {
        let mut policy = self.clone();
        policy.min_long_distance =
            positive_or(policy.min_long_distance, default_min_long_distance());
        policy.min_quality_distance =
            positive_or(policy.min_quality_distance, default_min_quality_distance());
        policy.min_easy_distance =
            positive_or(policy.min_easy_distance, default_min_easy_distance());
        policy.threshold_long_ratio =
            positive_or(policy.threshold_long_ratio, default_threshold_long_ratio());
        policy.taper_guard_days = policy.taper_guard_days.max(0);
        policy
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    let value = finite_or(value, fallback);
    if value <= 0.0 {
        tracing::warn!("Policy value {} must be positive, using {}", value, fallback);
        fallback
    } else {
        value
    }
}

/// Athlete defaults used when the CLI is not given explicit numbers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AthleteConfig {
    #[serde(default = "default_vo2max")]
    pub vo2max: f64,

    #[serde(default = "default_event_distance")]
    pub event_distance: f64,

    #[serde(default = "default_starting_load")]
    pub starting_load: f64,

    #[serde(default = "default_peak_load")]
    pub peak_load: f64,
}

impl Default for AthleteConfig {
    fn default() -> Self {
        Self {
            vo2max: default_vo2max(),
            event_distance: default_event_distance(),
            starting_load: default_starting_load(),
            peak_load: default_peak_load(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("shiftrun")
}

fn default_strength_week_days() -> Vec<usize> {
    vec![2, 4]
}

fn default_base_cap() -> usize {
    1
}

fn default_build_cap() -> usize {
    3
}

fn default_peak_cap() -> usize {
    2
}

fn default_taper_cap() -> usize {
    2
}

fn default_min_long_distance() -> f64 {
    5.0
}

fn default_min_quality_distance() -> f64 {
    4.0
}

fn default_min_easy_distance() -> f64 {
    3.0
}

fn default_threshold_long_ratio() -> f64 {
    0.6
}

fn default_taper_guard_days() -> i64 {
    3
}

fn default_taper_threshold_cap() -> usize {
    1
}

fn default_vo2max() -> f64 {
    50.0
}

fn default_event_distance() -> f64 {
    13.1
}

fn default_starting_load() -> f64 {
    25.0
}

fn default_peak_load() -> f64 {
    45.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("shiftrun").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
