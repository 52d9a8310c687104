use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{error, info, warn, Level};

use activelog::aggregate::{
    aggregate_day, aggregate_day_for_kind, compute_streak, current_streak, duration_by_kind,
    month_view, summarize, DateRange, GoalProgress,
};
use activelog::badges::compute_badges_with;
use activelog::config::AppConfig;
use activelog::error::ActivityLogError;
use activelog::estimator::MetricsEstimator;
use activelog::export::{self, ExportFormat};
use activelog::import::{ImportManager, ImportMode};
use activelog::logging::{init_logging, LogLevel};
use activelog::models::{ActivityKind, DailyAggregate, Entry, Goals, PartialMetrics, Profile};
use activelog::sample::DEFAULT_SAMPLE_DAYS;
use activelog::store::FileStore;
use activelog::tracker::Tracker;

/// activelog - Personal Activity Log CLI
///
/// Log walking, jogging, cycling and swimming sessions, let the estimator fill
/// in steps, distance, calories and heart rate, and review daily totals,
/// streaks and badges.
#[derive(Parser)]
#[command(name = "activelog")]
#[command(author = "activelog contributors")]
#[command(version)]
#[command(about = "Personal activity log CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log an activity, estimating whatever is not given
    Add {
        /// walking, jogging, cycling or swimming
        activity: String,

        /// Date (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<String>,

        /// Step count
        #[arg(short, long)]
        steps: Option<u32>,

        /// Duration in minutes
        #[arg(short = 'm', long)]
        duration: Option<f64>,

        /// Distance in kilometres
        #[arg(short = 'k', long)]
        distance: Option<f64>,

        /// Free-text notes
        #[arg(short, long, default_value = "")]
        notes: String,

        /// Estimate from duration alone, using the configured default duration if none given
        #[arg(short, long, conflicts_with_all = ["steps", "distance"])]
        quick: bool,
    },

    /// List logged activities
    List {
        /// Date range start (YYYY-MM-DD)
        #[arg(short, long)]
        from: Option<String>,

        /// Date range end (YYYY-MM-DD)
        #[arg(short, long)]
        to: Option<String>,

        /// Number of most recent activities to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one day's activities, totals and goal progress
    Day {
        /// Date (YYYY-MM-DD, default today)
        date: Option<String>,

        /// Only show one activity kind
        #[arg(short, long)]
        activity: Option<String>,
    },

    /// Per-day totals over a date range
    Summary {
        /// Date range start (YYYY-MM-DD)
        #[arg(short, long)]
        from: Option<String>,

        /// Date range end (YYYY-MM-DD)
        #[arg(short, long)]
        to: Option<String>,

        /// Trailing window ending today, overrides --from/--to
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Month calendar with active days highlighted
    Calendar {
        /// Month (YYYY-MM, default current month)
        month: Option<String>,
    },

    /// Show unlocked badges
    Badges,

    /// Show the current streak
    Streak {
        /// Window to check (default from config)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Replace the notes of an entry
    Notes {
        /// Date of the entry (YYYY-MM-DD)
        date: String,

        /// Entry id
        id: String,

        /// New notes
        text: String,
    },

    /// Delete an entry
    Delete {
        /// Date of the entry (YYYY-MM-DD)
        date: String,

        /// Entry id
        id: String,
    },

    /// Import activities from CSV or a JSON backup
    Import {
        /// Input file path (CSV, JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// File format (auto-detect if not specified)
        #[arg(short = 'F', long)]
        format: Option<String>,

        /// Add to the existing log instead of replacing it
        #[arg(short, long)]
        append: bool,
    },

    /// Export the log to CSV or the full state to JSON
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (csv, json; default from extension)
        #[arg(short = 'F', long)]
        format: Option<String>,
    },

    /// Generate random sample activities
    Sample {
        /// Number of days ending today (1-3650)
        #[arg(
            short,
            long,
            default_value_t = DEFAULT_SAMPLE_DAYS,
            value_parser = clap::value_parser!(u32).range(1..=3650)
        )]
        days: u32,
    },

    /// Erase the activity log
    Reset {
        /// Confirm erasing every logged activity
        #[arg(long)]
        yes: bool,
    },

    /// Show or update the profile
    Profile {
        #[arg(long)]
        name: Option<String>,

        /// Age in years
        #[arg(long)]
        age: Option<u32>,

        /// Weight in kilograms
        #[arg(long)]
        weight: Option<f64>,

        /// Resting heart rate in bpm
        #[arg(long)]
        resting_hr: Option<u32>,
    },

    /// Show or update daily goals
    Goals {
        #[arg(long)]
        steps: Option<u32>,

        #[arg(long)]
        calories: Option<u32>,

        /// Minutes per day
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Configure application settings
    Config {
        /// Write the current settings to the config file
        #[arg(long)]
        init: bool,

        /// Print the config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Activity")]
    activity: ActivityKind,
    #[tabled(rename = "Steps")]
    steps: u32,
    #[tabled(rename = "Min")]
    duration: f64,
    #[tabled(rename = "Km")]
    distance: f64,
    #[tabled(rename = "Kcal")]
    calories: u32,
    #[tabled(rename = "HR")]
    heart_rate: String,
    #[tabled(rename = "Notes")]
    notes: String,
    #[tabled(rename = "Id")]
    id: String,
}

impl EntryRow {
    fn new(date: NaiveDate, entry: &Entry) -> Self {
        EntryRow {
            date,
            activity: entry.activity_kind,
            steps: entry.steps,
            duration: entry.duration_minutes,
            distance: entry.distance_km,
            calories: entry.calories,
            heart_rate: if entry.heart_rate > 0 {
                entry.heart_rate.to_string()
            } else {
                "-".to_string()
            },
            notes: entry.notes.clone(),
            id: entry.id.clone(),
        }
    }
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Steps")]
    steps: u64,
    #[tabled(rename = "Min")]
    duration: f64,
    #[tabled(rename = "Km")]
    distance: f64,
    #[tabled(rename = "Kcal")]
    calories: u64,
    #[tabled(rename = "Avg HR")]
    heart_rate: u32,
}

impl DayRow {
    fn new(date: NaiveDate, day: &DailyAggregate) -> Self {
        DayRow {
            date,
            steps: day.steps,
            duration: day.duration_minutes,
            distance: day.distance_km,
            calories: day.calories,
            heart_rate: day.average_heart_rate,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        report_error(&err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    let mut log_config = config.logging.clone();
    log_config.level = LogLevel::from_verbosity(log_config.level, cli.verbose);
    init_logging(&log_config).context("Failed to initialize logging")?;

    if cli.verbose > 0 {
        eprintln!(
            "{}",
            format!("Log level: {}", log_config.level.to_filter()).dimmed()
        );
    }

    let store = FileStore::open(&config.storage.data_dir).with_context(|| {
        format!(
            "Failed to open data directory: {}",
            config.storage.data_dir.display()
        )
    })?;
    let mut tracker = Tracker::open(store, MetricsEstimator::new(config.estimator.clone()))?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Add {
            activity,
            date,
            steps,
            duration,
            distance,
            notes,
            quick,
        } => {
            let date = parse_date_or(date.as_deref(), today)?;
            let entry = if quick {
                let kind = activity.parse::<ActivityKind>()?;
                tracker.add_activity_auto(date, kind, duration, &notes)?
            } else {
                let partial = PartialMetrics {
                    steps,
                    duration_minutes: duration,
                    distance_km: distance,
                };
                tracker.add_activity(date, &activity, partial, &notes)?
            };

            println!(
                "{}",
                format!("✓ Logged {} on {}", entry.activity_kind, date).green().bold()
            );
            print_table(vec![EntryRow::new(date, &entry)]);
        }

        Commands::List { from, to, limit } => {
            let range = DateRange::new(
                parse_optional_date(from.as_deref())?,
                parse_optional_date(to.as_deref())?,
            );
            let mut rows: Vec<EntryRow> = tracker
                .log()
                .iter()
                .filter(|(date, _)| range.contains(date))
                .map(|(date, entry)| EntryRow::new(date, entry))
                .collect();
            rows.reverse();
            if let Some(limit) = limit {
                rows.truncate(limit);
            }

            if rows.is_empty() {
                println!("{}", "No activities logged".yellow());
            } else {
                print_table(rows);
            }
        }

        Commands::Day { date, activity } => {
            let date = parse_date_or(date.as_deref(), today)?;
            let kind = activity
                .as_deref()
                .map(str::parse::<ActivityKind>)
                .transpose()?;
            println!("{}", format!("Activities on {}", date).blue().bold());

            let rows: Vec<EntryRow> = tracker
                .log()
                .entries_for(date)
                .iter()
                .filter(|e| kind.map_or(true, |k| e.activity_kind == k))
                .map(|e| EntryRow::new(date, e))
                .collect();
            if rows.is_empty() {
                println!("{}", "  Nothing logged".yellow());
            } else {
                print_table(rows);
            }

            match kind {
                Some(kind) => {
                    let day = aggregate_day_for_kind(tracker.log(), date, kind);
                    print_goal_progress(&day, tracker.goals());
                }
                None => {
                    let day = aggregate_day(tracker.log(), date);
                    print_goal_progress(&day, tracker.goals());

                    let minutes = duration_by_kind(tracker.log(), date);
                    if !day.is_zero() {
                        println!("{}", "Minutes by activity".blue().bold());
                        for (kind, total) in minutes.iter().filter(|(_, m)| **m > 0.0) {
                            println!("  {:<9}{}", kind.label(), total);
                        }
                    }
                }
            }
        }

        Commands::Summary { from, to, days } => {
            let range = match days {
                Some(days) => DateRange::trailing(today, days),
                None => DateRange::new(
                    parse_optional_date(from.as_deref())?,
                    parse_optional_date(to.as_deref())?,
                ),
            };
            let summary = summarize(tracker.log(), &range);

            if summary.per_day.is_empty() {
                println!("{}", "No activities in range".yellow());
                return Ok(());
            }

            print_table(
                summary
                    .per_day
                    .iter()
                    .map(|(date, day)| DayRow::new(*date, day))
                    .collect(),
            );

            let totals = &summary.totals;
            println!("{}", "Totals".blue().bold());
            println!("  Steps:    {}", totals.steps);
            println!("  Minutes:  {}", totals.duration_minutes);
            println!("  Distance: {} km", totals.distance_km);
            println!("  Calories: {}", totals.calories);
            println!("  Avg HR:   {}", totals.average_heart_rate_across_days);
        }

        Commands::Calendar { month } => {
            let first = match month {
                Some(month) => NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
                    .with_context(|| format!("Invalid month '{}', expected YYYY-MM", month))?,
                None => today.with_day(1).unwrap_or(today),
            };
            print_calendar(&tracker, first.year(), first.month(), today)?;
        }

        Commands::Badges => {
            let badges = compute_badges_with(tracker.log(), today, &config.badges);
            if badges.is_empty() {
                println!("{}", "No badges yet. Log an activity to get started.".yellow());
            }
            for badge in badges {
                println!("{} {}", "★".yellow().bold(), badge.title.bold());
                println!("    {}", badge.description.dimmed());
            }
        }

        Commands::Streak { days } => {
            let window = days.unwrap_or(config.badges.streak_days);
            let current = current_streak(tracker.log(), today);
            println!("Current streak: {} day(s)", current.to_string().bold());

            if compute_streak(tracker.log(), today, window) {
                println!("{}", format!("✓ Active each of the last {} days", window).green());
            } else {
                println!("{}", format!("✗ Not active each of the last {} days", window).yellow());
            }
        }

        Commands::Notes { date, id, text } => {
            let date = parse_date(&date)?;
            tracker.edit_notes(date, &id, &text)?;
            println!("{}", "✓ Notes updated".green());
        }

        Commands::Delete { date, id } => {
            let date = parse_date(&date)?;
            let removed = tracker.delete_entry(date, &id)?;
            println!(
                "{}",
                format!("✓ Deleted {} on {}", removed.activity_kind, date).green()
            );
        }

        Commands::Import {
            file,
            format,
            append,
        } => {
            println!("{}", "Importing activity data...".green().bold());
            println!("  File: {}", file.display());

            let mode = if append {
                ImportMode::Append
            } else {
                ImportMode::Replace
            };
            let summary = match format {
                Some(format) => {
                    println!("  Format: {}", format);
                    let data = ImportManager::new().import_file_as(&file, &format)?;
                    tracker.apply_import(data, mode)?
                }
                None => tracker.import_file(&file, mode)?,
            };

            println!(
                "{}",
                format!("✓ Imported {} activities", summary.entries).green()
            );
            if summary.profile_replaced {
                println!("  Profile replaced");
            }
            if summary.goals_replaced {
                println!("  Goals replaced");
            }
        }

        Commands::Export { output, format } => {
            let format = match format {
                Some(format) => format.parse::<ExportFormat>().map_err(ActivityLogError::from)?,
                None => ExportFormat::from_path(&output).with_context(|| {
                    format!(
                        "Cannot infer export format from {}, pass --format",
                        output.display()
                    )
                })?,
            };

            export::export_to_path(format, &tracker.export_bundle(), &output)?;
            println!(
                "{}",
                format!("✓ Exported to {}", output.display()).green()
            );
        }

        Commands::Sample { days } => {
            let count = tracker.load_sample_data(today, days, &mut rand::thread_rng())?;
            println!(
                "{}",
                format!("✓ Generated {} sample activities over {} days", count, days).green()
            );
        }

        Commands::Reset { yes } => {
            if !yes {
                bail!("Refusing to erase the activity log without --yes");
            }
            tracker.reset()?;
            println!("{}", "✓ Activity log cleared".green());
        }

        Commands::Profile {
            name,
            age,
            weight,
            resting_hr,
        } => {
            if name.is_some() || age.is_some() || weight.is_some() || resting_hr.is_some() {
                let current = tracker.profile().clone();
                let profile = Profile {
                    name: name.unwrap_or(current.name),
                    age: age.unwrap_or(current.age),
                    weight: weight.unwrap_or(current.weight),
                    resting_heart_rate: resting_hr.unwrap_or(current.resting_heart_rate),
                };
                tracker.update_profile(profile)?;
                println!("{}", "✓ Profile updated".green());
            }

            let profile = tracker.profile();
            println!("{}", "Profile".blue().bold());
            println!("  Name:       {}", profile.name);
            println!("  Age:        {}", profile.age);
            println!("  Weight:     {} kg", profile.weight);
            println!("  Resting HR: {} bpm", profile.resting_heart_rate);
        }

        Commands::Goals {
            steps,
            calories,
            duration,
        } => {
            if steps.is_some() || calories.is_some() || duration.is_some() {
                let current = tracker.goals().clone();
                let goals = Goals {
                    steps: steps.unwrap_or(current.steps),
                    calories: calories.unwrap_or(current.calories),
                    duration_minutes: duration.unwrap_or(current.duration_minutes),
                };
                tracker.update_goals(goals)?;
                println!("{}", "✓ Goals updated".green());
            }

            let goals = tracker.goals();
            println!("{}", "Daily goals".blue().bold());
            println!("  Steps:    {}", goals.steps);
            println!("  Calories: {}", goals.calories);
            println!("  Minutes:  {}", goals.duration_minutes);
        }

        Commands::Config { init, path } => handle_config(&mut config, &config_path, init, path)?,
    }

    Ok(())
}

fn handle_config(config: &mut AppConfig, config_path: &Path, init: bool, path: bool) -> Result<()> {
    if path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        config.save_to_file(config_path)?;
        info!(path = %config_path.display(), "Wrote configuration");
        println!(
            "{}",
            format!("✓ Configuration written to {}", config_path.display()).green()
        );
        return Ok(());
    }

    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

fn print_goal_progress(day: &DailyAggregate, goals: &Goals) {
    let progress = GoalProgress::evaluate(day, goals);
    println!("{}", "Goals".blue().bold());

    let lines = [
        (
            "Steps",
            day.steps.to_string(),
            goals.steps.to_string(),
            progress.steps_fraction,
            progress.steps_met(),
        ),
        (
            "Calories",
            day.calories.to_string(),
            goals.calories.to_string(),
            progress.calories_fraction,
            progress.calories_met(),
        ),
        (
            "Minutes",
            day.duration_minutes.to_string(),
            goals.duration_minutes.to_string(),
            progress.duration_fraction,
            progress.duration_met(),
        ),
    ];

    for (label, value, target, fraction, met) in lines {
        let line = format!(
            "  {:<9}{} / {} ({:.0}%)",
            label,
            value,
            target,
            fraction * 100.0
        );
        if met {
            println!("{}", line.green());
        } else {
            println!("{}", line);
        }
    }

    if day.average_heart_rate > 0 {
        println!("  Avg HR:  {} bpm", day.average_heart_rate);
    }
}

fn print_calendar<S: activelog::store::KeyValueStore>(
    tracker: &Tracker<S>,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<()> {
    let view = month_view(tracker.log(), year, month)
        .with_context(|| format!("Invalid month {}-{:02}", year, month))?;

    println!("{}", format!("{}-{:02}", view.year, view.month).blue().bold());
    println!(" Su  Mo  Tu  We  Th  Fr  Sa");

    let mut line = "    ".repeat(view.leading_blanks as usize);
    let mut column = view.leading_blanks;
    for day in &view.days {
        let cell = format!("{:>3} ", day.date.day());
        let cell = if day.has_entries {
            cell.green().bold().to_string()
        } else if day.date == today {
            cell.underline().to_string()
        } else {
            cell
        };
        line.push_str(&cell);

        column += 1;
        if column == 7 {
            println!("{}", line.trim_end());
            line.clear();
            column = 0;
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }

    let active = view.days.iter().filter(|d| d.has_entries).count();
    println!("{}", format!("{} active day(s)", active).dimmed());
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(parse_date).transpose()
}

fn parse_date_or(raw: Option<&str>, default: NaiveDate) -> Result<NaiveDate> {
    Ok(parse_optional_date(raw)?.unwrap_or(default))
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<ActivityLogError>() {
        Some(app_err) => {
            if app_err.severity().to_tracing_level() == Level::WARN {
                warn!(error = %app_err, "Command rejected");
            } else {
                error!(error = %app_err, "Command failed");
            }
            eprintln!("{} {}", "Error:".red().bold(), app_err.user_message());
        }
        None => {
            error!(error = %err, "Command failed");
            eprintln!("{} {:#}", "Error:".red().bold(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_add_rejects_explicit_metrics() {
        assert!(Cli::try_parse_from(["activelog", "add", "walking", "--quick", "--steps", "500"]).is_err());
        assert!(Cli::try_parse_from(["activelog", "add", "walking", "-q", "-k", "2.5"]).is_err());

        let cli = Cli::try_parse_from(["activelog", "add", "walking", "-q", "-m", "20", "-n", "park"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Add { quick: true, ref notes, .. } if notes == "park"
        ));
    }

    #[test]
    fn test_sample_days_are_bounded() {
        assert!(Cli::try_parse_from(["activelog", "sample", "--days", "200000000"]).is_err());
        assert!(Cli::try_parse_from(["activelog", "sample", "--days", "30"]).is_ok());
    }
}
