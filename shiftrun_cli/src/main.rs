use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use shiftrun_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "shiftrun")]
#[command(about = "Shift-aware running plan generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log scheduling decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a plan from start to goal date
    Generate {
        /// First plan day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Goal/event day (YYYY-MM-DD)
        #[arg(long)]
        goal: NaiveDate,

        /// JSON workday file: {"YYYY-MM-DD": true} flags or a list of shifts
        #[arg(long)]
        workdays: Option<PathBuf>,

        /// Event distance in miles
        #[arg(long)]
        event_distance: Option<f64>,

        /// Rolling 10-day load at plan start
        #[arg(long)]
        starting_load: Option<f64>,

        /// Rolling 10-day load targeted at the goal date
        #[arg(long)]
        peak_load: Option<f64>,

        /// VO2max used for pace annotations
        #[arg(long)]
        vo2max: Option<f64>,

        /// Where to save the plan JSON (defaults to <data-dir>/plan.json)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Also export the plan as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Do not print the day table
        #[arg(long)]
        quiet: bool,
    },

    /// Show statistics and rule checks for a saved plan
    Stats {
        /// Plan JSON (defaults to <data-dir>/plan.json)
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Rolling load assumed before the plan start
        #[arg(long)]
        starting_load: Option<f64>,
    },

    /// Show training pace ranges for a VO2max
    Paces {
        #[arg(long)]
        vo2max: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    shiftrun_core::logging::init(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Commands::Generate {
            start,
            goal,
            workdays,
            event_distance,
            starting_load,
            peak_load,
            vo2max,
            out,
            csv,
            quiet,
        } => {
            let request = PlanRequest {
                start,
                goal,
                event_distance: event_distance.unwrap_or(config.athlete.event_distance),
                starting_load: starting_load.unwrap_or(config.athlete.starting_load),
                peak_load: peak_load.unwrap_or(config.athlete.peak_load),
                paces: Some(PaceSet::from_vo2max(vo2max.unwrap_or(config.athlete.vo2max))),
            };
            let out = out.unwrap_or_else(|| data_dir.join("plan.json"));
            cmd_generate(&config, request, workdays.as_deref(), &out, csv.as_deref(), quiet)
        }
        Commands::Stats {
            plan,
            starting_load,
        } => {
            let plan_path = plan.unwrap_or_else(|| data_dir.join("plan.json"));
            let starting_load = starting_load.unwrap_or(config.athlete.starting_load);
            cmd_stats(&config, &plan_path, starting_load)
        }
        Commands::Paces { vo2max } => {
            cmd_paces(vo2max.unwrap_or(config.athlete.vo2max));
            Ok(())
        }
    }
}

fn cmd_generate(
    config: &Config,
    request: PlanRequest,
    workdays_path: Option<&Path>,
    out: &Path,
    csv_path: Option<&Path>,
    quiet: bool,
) -> Result<()> {
    let workdays = match workdays_path {
        Some(path) => load_workdays(path)?,
        None => WorkdayMap::new(),
    };

    let plan = generate_plan(&request, &workdays, &config.plan)?;
    save_plan(&plan, out)?;

    if let Some(path) = csv_path {
        export_csv(&plan, path)?;
    }

    if !quiet {
        display_plan(&plan);
        let stats = compute_stats(&plan.days, request.starting_load);
        display_stats(&stats);
        if !plan.report.anomalies.is_empty() {
            println!();
            for anomaly in &plan.report.anomalies {
                println!("  ! {}: {}", anomaly.window_end, anomaly.description);
            }
        }
    }

    println!("\n✓ Plan saved to {}", out.display());
    if let Some(path) = csv_path {
        println!("  CSV: {}", path.display());
    }
    Ok(())
}

fn cmd_stats(config: &Config, plan_path: &Path, starting_load: f64) -> Result<()> {
    let plan = load_plan(plan_path)?;
    let stats = compute_stats(&plan.days, starting_load);

    println!("Plan {} → {} ({} days)", plan.start, plan.goal, plan.len());
    display_stats(&stats);

    let violations = validate_plan(&plan, &config.plan);
    if violations.is_empty() {
        println!("\n✓ No rule violations");
    } else {
        println!("\n{} rule violations:", violations.len());
        for violation in &violations {
            println!("  - {}", violation);
        }
    }
    Ok(())
}

fn cmd_paces(vo2max: f64) {
    let paces = PaceSet::from_vo2max(vo2max);
    println!("Paces for VO2max {:.0}", vo2max);
    println!("  Easy:      {}", paces.easy);
    println!("  Threshold: {}", paces.threshold);
    println!("  Interval:  {}", paces.interval);
}

fn display_plan(plan: &Plan) {
    println!(
        "{:<10}  {:<5}  {:<11}  {:<9}  {:>6}  {:>6}  Workout",
        "Date", "Phase", "Category", "Effort", "Miles", "Load"
    );
    println!("{}", "─".repeat(72));
    for day in &plan.days {
        let effort = day.effort.map(|e| e.to_string()).unwrap_or_default();
        let marker = if day.is_workday { "*" } else { " " };
        let workout = day
            .segments
            .iter()
            .map(|s| match (s.distance, s.duration_min) {
                (Some(d), _) => format!("{} {:.1}", s.label, d),
                (None, Some(m)) => format!("{} {}m", s.label, m),
                (None, None) => s.label.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{}{:<9}  {:<5}  {:<11}  {:<9}  {:>6.1}  {:>6.1}  {}",
            marker,
            day.date,
            day.phase.to_string(),
            day.category.to_string(),
            effort,
            day.run_distance,
            day.total_load,
            workout
        );
    }
    println!("(* = workday)");
}

fn display_stats(stats: &PlanStats) {
    println!();
    println!("  Runs:          {}", stats.count(WorkoutCategory::Run));
    println!("  Cross-train:   {}", stats.count(WorkoutCategory::CrossTrain));
    println!("  Strength:      {}", stats.count(WorkoutCategory::Strength));
    println!("  Rest:          {}", stats.count(WorkoutCategory::Rest));
    println!("  Quality days:  {}", stats.quality_days);
    println!("  Long efforts:  {}", stats.long_efforts);
    println!("  Run miles:     {:.1}", stats.total_run_distance);
    println!("  Workday runs:  {}", stats.run_on_workday_count);
    println!("  Longest run streak: {}", stats.max_run_streak);

    if let (Some(first), Some(peak)) = (
        stats.rolling_load.first(),
        stats.rolling_load.iter().copied().reduce(f64::max),
    ) {
        println!("  Rolling load:  {:.1} → peak {:.1}", first, peak);
    }

    for (phase, range) in &stats.phase_ranges {
        println!("  {:<5}  {} → {}", phase.to_string(), range.start, range.end);
    }
}
