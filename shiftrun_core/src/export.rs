//! CSV export of a generated plan.

use crate::{Plan, PlanDay, Result, Segment};
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    phase: String,
    category: String,
    effort: Option<String>,
    workday: bool,
    long_effort: bool,
    quality: bool,
    run_distance: f64,
    cross_train_load: f64,
    total_load: f64,
    segments: String,
}

fn describe_segment(segment: &Segment) -> String {
    let mut text = segment.label.clone();
    if let Some(distance) = segment.distance {
        text.push_str(&format!(" {:.1} mi", distance));
    }
    if let Some(minutes) = segment.duration_min {
        text.push_str(&format!(" {} min", minutes));
    }
    if let Some(pace) = &segment.pace {
        text.push_str(&format!(" @ {}", pace));
    }
    text
}

impl From<&PlanDay> for CsvRow {
    fn from(day: &PlanDay) -> Self {
        CsvRow {
            date: day.date.format("%Y-%m-%d").to_string(),
            phase: day.phase.to_string(),
            category: day.category.to_string(),
            effort: day.effort.map(|e| e.to_string()),
            workday: day.is_workday,
            long_effort: day.is_long_effort,
            quality: day.is_quality_day,
            run_distance: day.run_distance,
            cross_train_load: day.cross_train_load,
            total_load: day.total_load,
            segments: day
                .segments
                .iter()
                .map(describe_segment)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Write one CSV row per plan day, replacing any existing file.
///
/// Returns the number of rows written.
pub fn export_csv(plan: &Plan, csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(csv_path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    for day in &plan.days {
        writer.serialize(CsvRow::from(day))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} plan days to {:?}", plan.len(), csv_path);
    Ok(plan.len())
}
