#![forbid(unsafe_code)]

//! Core domain model and scheduling logic for the shiftrun plan generator.
//!
//! This crate provides:
//! - Domain types (phases, categories, segments, plan days)
//! - Workday map construction and loading
//! - Load progression and pace derivation
//! - The day-by-day plan engine and its consistency pass
//! - Plan statistics, validation, persistence and CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod phase;
pub mod progression;
pub mod workdays;
pub mod paces;
pub mod engine;
pub mod enforcement;
pub mod stats;
pub mod storage;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, PlanPolicy, QualityCaps, RestDayPolicy};
pub use workdays::{load_workdays, Shift, WorkdayMap};
pub use paces::PaceSet;
pub use engine::{generate_plan, PlanRequest, WeekState};
pub use enforcement::enforce_consistency;
pub use stats::{compute_stats, validate_plan, PlanStats, Violation};
pub use storage::{load_plan, save_plan};
pub use export::export_csv;
