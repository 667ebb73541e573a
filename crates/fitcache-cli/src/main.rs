//! fitcache - a command-line front end for the fitness-tracking backend.
//!
//! Shows the home dashboard, the meal diary, community challenges and the
//! workout program, and runs the onboarding calorie calculator.

mod app;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fitcache_core::cache::{ChallengesSnapshot, MealMonth, MonthKey};
use fitcache_core::calc::{self, Profile};
use fitcache_core::config::Config;
use fitcache_core::models::{MealEntry, MealType};
use fitcache_core::utils::{format_calories, truncate_string};

use app::App;

// ============================================================================
// Constants
// ============================================================================

/// Environment variable holding a bearer token, read before prompting
const TOKEN_ENV: &str = "FITCACHE_TOKEN";

/// Maximum width of a challenge title in list output
const TITLE_WIDTH: usize = 32;

const USAGE: &str = "\
Usage: fitcache <command> [args] [--refresh]

Commands:
  login <user_id> [email]       Sign in with a bearer token (prompted, or FITCACHE_TOKEN)
  logout                        Sign out and clear cached data
  dashboard                     Challenges, this month's diary and the workout program
  challenges                    Community challenges and your progress
  join <challenge_id>           Join a challenge
  meals [year month]            Food diary for a month (default: current month)
  log-meal <date> <meal> <kcal> <name...>
                                Log a meal, e.g. log-meal 2025-01-05 lunch 450 Chicken salad
  workout                       Your workout program
  tdee <sex> <age> <height_cm> <weight_kg> <activity> <goal>
                                Daily calorie goal, e.g. tdee female 30 165 60 moderate lose";

/// Initialize the tracing subscriber: stderr plus a daily log file when a
/// log directory is available.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "fitcache.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config_result = Config::load();
    let config = config_result.as_ref().cloned().unwrap_or_default();
    let _guard = init_tracing(config.log_dir().ok());
    if let Err(e) = config_result {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let force = args.iter().any(|a| a == "--refresh");
    let positional: Vec<&str> = args
        .iter()
        .map(String::as_str)
        .filter(|a| !a.starts_with("--"))
        .collect();

    let Some((&command, rest)) = positional.split_first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    // The calculator needs neither a session nor the network
    if command == "tdee" {
        return run_tdee(rest);
    }

    info!(command, force, "fitcache starting");
    let mut app = App::new(config)?;

    match command {
        "login" => {
            let user_id = rest
                .first()
                .ok_or_else(|| anyhow::anyhow!("login needs a user id\n\n{}", USAGE))?;
            let email = rest.get(1).map(|e| e.to_string());
            let token = match std::env::var(TOKEN_ENV) {
                Ok(token) if !token.trim().is_empty() => token,
                _ => rpassword::prompt_password("Bearer token: ")
                    .context("Failed to read token")?,
            };
            app.login(user_id, email, token.trim().to_string())?;
            println!("Signed in as {}", user_id);
        }
        "logout" => {
            app.logout()?;
            println!("Signed out");
        }
        "dashboard" => {
            let dashboard = app.dashboard(force).await?;
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        }
        "challenges" => {
            let snapshot = app.challenges(force).await?;
            print_challenges(&snapshot);
        }
        "join" => {
            let challenge_id = rest
                .first()
                .ok_or_else(|| anyhow::anyhow!("join needs a challenge id\n\n{}", USAGE))?;
            let snapshot = app.join_challenge(challenge_id).await?;
            print_challenges(&snapshot);
        }
        "meals" => {
            let month = match rest {
                [year, month, ..] => MonthKey::new(
                    year.parse().context("Invalid year")?,
                    month.parse().context("Invalid month")?,
                ),
                _ => MonthKey::current(),
            };
            let entry = app.meals(month, force).await?;
            print_month(&entry);
        }
        "log-meal" => {
            let entry = app.log_meal(parse_meal_date(rest)?, parse_meal(rest)?).await?;
            print_month(&entry);
        }
        "workout" => {
            let snapshot = app.workout(force).await?;
            println!("{}", serde_json::to_string_pretty(&*snapshot)?);
        }
        other => {
            anyhow::bail!("Unknown command: {}\n\n{}", other, USAGE);
        }
    }

    Ok(())
}

fn run_tdee(args: &[&str]) -> Result<()> {
    let [sex, age, height, weight, activity, goal] = args else {
        anyhow::bail!("tdee needs six arguments\n\n{}", USAGE);
    };
    let profile = Profile {
        sex: sex.parse()?,
        age_years: age.parse().context("Invalid age")?,
        height_cm: height.parse().context("Invalid height")?,
        weight_kg: weight.parse().context("Invalid weight")?,
        activity: activity.parse()?,
        goal: goal.parse()?,
    };

    let bmr = calc::bmr(&profile)?;
    let tdee = calc::tdee(&profile)?;
    let target = calc::daily_calorie_goal(&profile)?;
    let macros = calc::macro_split(target);

    println!("BMR:        {}", format_calories(bmr.round() as u32));
    println!("TDEE:       {}", format_calories(tdee.round() as u32));
    println!("Daily goal: {}", format_calories(target));
    println!(
        "Macros:     {}g protein / {}g carbs / {}g fat",
        macros.protein_g, macros.carbs_g, macros.fat_g
    );
    Ok(())
}

fn parse_meal_date(args: &[&str]) -> Result<NaiveDate> {
    let raw = args
        .first()
        .ok_or_else(|| anyhow::anyhow!("log-meal needs a date\n\n{}", USAGE))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("Invalid date: {}", raw))
}

fn parse_meal(args: &[&str]) -> Result<MealEntry> {
    let [_, meal_type, calories, name @ ..] = args else {
        anyhow::bail!("log-meal needs a date, meal type, calories and name\n\n{}", USAGE);
    };
    if name.is_empty() {
        anyhow::bail!("log-meal needs a meal name\n\n{}", USAGE);
    }
    let meal_type: MealType = meal_type.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    Ok(MealEntry {
        // The server assigns the real id
        id: format!("local-{}", Utc::now().timestamp_millis()),
        name: name.join(" "),
        meal_type,
        calories: calories.parse().context("Invalid calories")?,
        protein_g: 0.0,
        carbs_g: 0.0,
        fat_g: 0.0,
    })
}

fn print_challenges(snapshot: &ChallengesSnapshot) {
    for challenge in &snapshot.challenges {
        let marker = if snapshot.active_challenge_id.as_deref() == Some(challenge.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<width$}  {:<26}  {} joined",
            marker,
            truncate_string(&challenge.title, TITLE_WIDTH),
            challenge.date_label(),
            challenge.participant_count,
            width = TITLE_WIDTH
        );
    }
    if let Some(progress) = &snapshot.progress {
        println!(
            "\nStreak: {} days, {} days completed{}",
            progress.current_streak,
            progress.days_completed,
            if snapshot.completed_today { ", done today" } else { "" }
        );
    }
    if let Some(err) = &snapshot.progress_error {
        println!("\nProgress unavailable: {}", err);
    }
}

fn print_month(entry: &MealMonth) {
    let key = entry.key();
    println!("{}", key.label());
    for day in &entry.diary.days {
        println!(
            "  {}  {:>12}  ({} meals)",
            day.date.format("%a %b %-d"),
            format_calories(day.total_calories()),
            day.meals.len()
        );
    }
    println!("Month total: {}", format_calories(entry.diary.total_calories()));
    if let Some(avg) = entry.diary.average_logged_calories() {
        println!("Daily average: {}", format_calories(avg));
    }
    if entry.health.goal_calories > 0 {
        println!("Goal: {}", format_calories(entry.health.goal_calories));
    }
    if let Some(err) = &entry.health_error {
        println!("Health data unavailable: {}", err);
    }
}
