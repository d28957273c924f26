//! RustFit - Progress and achievement engine
//!
//! Command-line entry point. Every command prints its result as JSON.
//!
//! ```bash
//! rustfit log-workout --user <id> --file run.json
//! rustfit goal create --user <id> --kind weekly_workouts --target 4 --end 2025-01-31T00:00:00Z
//! rustfit leaderboard --user <id> --scope friends --metric distance --period this_month
//! rustfit plan generate --user <id> --plan-type 5k --difficulty beginner --weeks 8 --start 2025-01-06
//! rustfit init-config --data-dir ./data
//! ```

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use rustfit::goals::{GoalKind, GoalStatus};
use rustfit::leaderboards::{LeaderboardMetric, LeaderboardScope};
use rustfit::plans::{Difficulty, PlanType};
use rustfit::storage::config::{self, load_config_from};
use rustfit::workouts::{TimeRange, WorkoutPayload, WorkoutRecord};
use rustfit::ProgressEngine;

#[derive(Parser)]
#[command(
    name = "rustfit",
    version,
    about = "Workout progress and achievement engine",
    long_about = "Logs workouts and computes goals, badges, personal records, leaderboards and training plans."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Data directory override (holds config.toml and the database)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Log a workout from a JSON file
    LogWorkout {
        #[arg(long)]
        user: Uuid,

        /// JSON file with performed_at, duration_seconds and payload
        #[arg(long)]
        file: PathBuf,
    },

    /// Goal commands
    Goal {
        #[command(subcommand)]
        action: GoalCommand,
    },

    /// Badge commands
    Badges {
        #[command(subcommand)]
        action: BadgeCommand,
    },

    /// List personal records
    Records {
        #[arg(long)]
        user: Uuid,
    },

    /// Print a leaderboard
    Leaderboard {
        #[arg(long)]
        user: Uuid,

        /// friends or global
        #[arg(long, default_value = "friends", value_parser = parse_scope)]
        scope: LeaderboardScope,

        /// workouts, distance or duration
        #[arg(long, default_value = "distance", value_parser = parse_metric)]
        metric: LeaderboardMetric,

        /// this_week, this_month, this_year or all_time
        #[arg(long, default_value = "this_week", value_parser = parse_period)]
        period: TimeRange,
    },

    /// Follow another user
    Follow {
        #[arg(long)]
        user: Uuid,

        #[arg(long)]
        followee: Uuid,
    },

    /// Training plan commands
    Plan {
        #[command(subcommand)]
        action: PlanCommand,
    },

    /// Write the active configuration to config.toml
    InitConfig,
}

#[derive(Subcommand)]
enum GoalCommand {
    /// Create a goal
    Create {
        #[arg(long)]
        user: Uuid,

        /// weekly_workouts, monthly_workouts, weekly_distance, monthly_distance,
        /// duration, streak or distance_milestone
        #[arg(long)]
        kind: String,

        #[arg(long)]
        target: f64,

        /// End of the goal window (RFC 3339)
        #[arg(long)]
        end: DateTime<Utc>,
    },

    /// Evaluate one goal
    Evaluate {
        #[arg(long)]
        user: Uuid,

        #[arg(long)]
        id: Uuid,
    },

    /// Evaluate and list goals
    List {
        #[arg(long)]
        user: Uuid,

        /// Only goals with this status
        #[arg(long, value_parser = parse_goal_status)]
        status: Option<GoalStatus>,
    },

    /// Delete a goal
    Delete {
        #[arg(long)]
        user: Uuid,

        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum BadgeCommand {
    /// Award badges the user qualifies for
    Sync {
        #[arg(long)]
        user: Uuid,
    },

    /// List all badges with earned status
    List {
        #[arg(long)]
        user: Uuid,
    },
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Generate a training plan
    Generate {
        #[arg(long)]
        user: Uuid,

        /// 5k, 10k, half_marathon, marathon or strength
        #[arg(long, value_parser = parse_plan_type)]
        plan_type: PlanType,

        /// beginner, intermediate or advanced
        #[arg(long, value_parser = parse_difficulty)]
        difficulty: Difficulty,

        #[arg(long)]
        weeks: u32,

        /// First day of the plan (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
    },

    /// Show a plan
    Show {
        #[arg(long)]
        user: Uuid,

        #[arg(long)]
        plan: Uuid,
    },

    /// Mark a plan workout as done
    Complete {
        #[arg(long)]
        user: Uuid,

        #[arg(long)]
        plan: Uuid,

        #[arg(long)]
        week: u32,

        /// Day of week (mon, tue, ...)
        #[arg(long, value_parser = parse_weekday)]
        day: Weekday,
    },

    /// Move the plan's current week
    Week {
        #[arg(long)]
        user: Uuid,

        #[arg(long)]
        plan: Uuid,

        #[arg(long)]
        week: u32,
    },
}

/// Workout file contents.
#[derive(Debug, Deserialize)]
struct WorkoutInput {
    performed_at: DateTime<Utc>,
    duration_seconds: u32,
    #[serde(default)]
    rpe: Option<u8>,
    #[serde(default)]
    notes: Option<String>,
    payload: WorkoutPayload,
}

fn parse_scope(s: &str) -> Result<LeaderboardScope, String> {
    LeaderboardScope::from_str(s).ok_or_else(|| format!("unknown scope '{s}'"))
}

fn parse_metric(s: &str) -> Result<LeaderboardMetric, String> {
    LeaderboardMetric::from_str(s).ok_or_else(|| format!("unknown metric '{s}'"))
}

fn parse_period(s: &str) -> Result<TimeRange, String> {
    TimeRange::from_str(s).ok_or_else(|| format!("unknown period '{s}'"))
}

fn parse_goal_status(s: &str) -> Result<GoalStatus, String> {
    GoalStatus::from_str(s).ok_or_else(|| format!("unknown goal status '{s}'"))
}

fn parse_plan_type(s: &str) -> Result<PlanType, String> {
    PlanType::from_str(s).ok_or_else(|| format!("unknown plan type '{s}'"))
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(s).ok_or_else(|| format!("unknown difficulty '{s}'"))
}

fn parse_weekday(s: &str) -> Result<Weekday, String> {
    s.parse::<Weekday>().map_err(|_| format!("unknown day '{s}'"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app_config = match &cli.data_dir {
        Some(dir) => load_config_from(&dir.join("config.toml"), dir.clone()),
        None => config::load_config(),
    }
    .context("failed to load configuration")?;

    if let Command::InitConfig = cli.command {
        match &cli.data_dir {
            Some(dir) => config::save_config_to(&app_config, &dir.join("config.toml")),
            None => config::save_config(&app_config),
        }
        .context("failed to write configuration")?;
        tracing::info!(data_dir = %app_config.data_dir.display(), "Configuration written");
        return Ok(());
    }

    tracing::debug!(database = %app_config.database_path().display(), "Opening database");
    let engine = ProgressEngine::open(&app_config)?;
    let now = Utc::now();

    match cli.command {
        Command::LogWorkout { user, file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let input: WorkoutInput =
                serde_json::from_str(&content).context("invalid workout file")?;

            let mut workout =
                WorkoutRecord::new(user, input.performed_at, input.duration_seconds, input.payload);
            workout.rpe = input.rpe;
            workout.notes = input.notes;

            print_json(&engine.log_workout(workout, now)?)
        }
        Command::Goal { action } => match action {
            GoalCommand::Create {
                user,
                kind,
                target,
                end,
            } => print_json(&engine.create_goal(user, GoalKind::parse(&kind), target, end, now)?),
            GoalCommand::Evaluate { user, id } => print_json(&engine.evaluate_goal(id, user, now)?),
            GoalCommand::List { user, status } => print_json(&engine.list_goals(user, status, now)?),
            GoalCommand::Delete { user, id } => {
                engine.delete_goal(id, user)?;
                print_json(&serde_json::json!({ "deleted": id }))
            }
        },
        Command::Badges { action } => match action {
            BadgeCommand::Sync { user } => print_json(&engine.sync_badges(user, now)?),
            BadgeCommand::List { user } => print_json(&engine.list_badges(user)?),
        },
        Command::Records { user } => print_json(&engine.list_records(user)?),
        Command::Leaderboard {
            user,
            scope,
            metric,
            period,
        } => print_json(&engine.get_leaderboard(scope, metric, period, user, now)?),
        Command::Follow { user, followee } => {
            let outcome = engine.follow(user, followee, now)?;
            print_json(&serde_json::json!({
                "follower": user,
                "followee": followee,
                "new": outcome == rustfit::WriteOutcome::Applied,
            }))
        }
        Command::Plan { action } => match action {
            PlanCommand::Generate {
                user,
                plan_type,
                difficulty,
                weeks,
                start,
            } => print_json(&engine.generate_plan(user, plan_type, difficulty, weeks, start, now)?),
            PlanCommand::Show { user, plan } => print_json(&engine.get_plan(plan, user, now)?),
            PlanCommand::Complete {
                user,
                plan,
                week,
                day,
            } => print_json(&engine.complete_workout(plan, user, week, day, now)?),
            PlanCommand::Week { user, plan, week } => {
                print_json(&engine.set_current_week(plan, user, week, now)?)
            }
        },
        Command::InitConfig => Ok(()),
    }
}
