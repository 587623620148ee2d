//! Terminal front-end for the Quadrant store.
//!
//! # Responsibility
//! - Map subcommands onto `TaskStore` operations.
//! - Resolve short id prefixes to full task/habit ids.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use log::warn;
use quadrant_core::{
    display_order, init_logging, tasks_planned_for, Category, CoreConfig, DurationEstimate,
    HttpClassifier, InlineQueue, KvStore, Language, MemoryKvStore, NewTask, SqliteKvStore,
    TaskStore,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use uuid::Uuid;

type CliStore = TaskStore<Box<dyn KvStore>>;

#[derive(Parser)]
#[command(name = "quadrant", version, about = "Eisenhower matrix tasks and daily habits")]
struct Cli {
    /// Slot database; overrides QUADRANT_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a task (inbox unless a category is given)
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        #[arg(long, short, value_parser = parse_category)]
        category: Option<Category>,
        /// Planned day, YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
        /// Estimate such as 45m, 2h or 1d
        #[arg(long, value_parser = parse_duration)]
        duration: Option<DurationEstimate>,
    },
    /// List active tasks in display order
    List {
        #[arg(long, short, value_parser = parse_category)]
        category: Option<Category>,
        /// Only triaged tasks planned for this day
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Toggle completion of a task
    Done { id: String },
    /// Move a task to another category
    Move {
        id: String,
        #[arg(value_parser = parse_category)]
        category: Category,
        /// Position among the category's active tasks
        #[arg(long)]
        index: Option<usize>,
    },
    /// Delete a task
    Delete { id: String },
    #[command(subcommand)]
    Habit(HabitCommand),
    /// Print all tasks and habits as JSON
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Restore tasks/habits from an export file
    Import { path: PathBuf },
    /// Remove every task and habit
    Clear {
        #[arg(long)]
        yes: bool,
    },
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
enum HabitCommand {
    /// Add a habit
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        #[arg(long, default_value = "blue")]
        color: String,
        #[arg(long, default_value = "1d")]
        frequency: String,
    },
    /// Check or uncheck a habit for a day (today by default)
    Toggle {
        id: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// List habits with streaks
    List,
    /// Delete a habit
    Delete { id: String },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Show current settings
    Show,
    /// Toggle hardcore mode
    Hardcore,
    /// Turn automatic inbox classification on or off
    Ai {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Set the display language
    Language {
        #[arg(value_parser = parse_language)]
        language: Language,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = config.log_dir.as_deref().and_then(|dir| dir.to_str()) {
        init_logging(config.log_level, log_dir).map_err(|err| err.to_string())?;
    }
    let mut store = open_store(&config, cli.db)?;

    match cli.command {
        Command::Add {
            title,
            category,
            date,
            description,
            duration,
        } => {
            let mut new_task = NewTask::new(title.join(" "));
            if let Some(category) = category {
                new_task = new_task.in_category(category);
            }
            if let Some(date) = date {
                new_task = new_task.planned_on(date);
            }
            if let Some(description) = description {
                new_task = new_task.with_description(description);
            }
            if let Some(duration) = duration {
                new_task = new_task.with_duration(duration);
            }
            let id = store
                .add_task(new_task)
                .ok_or_else(|| "title cannot be empty".to_string())?;
            store.pump_classifications();
            let task = store.task(id).ok_or_else(|| "task vanished".to_string())?;
            println!("added {} [{}] {}", short_id(id), task.category, task.title);
        }
        Command::List {
            category,
            date,
            all,
        } => {
            let tasks = match date {
                Some(date) => tasks_planned_for(store.tasks(), date),
                None => display_order(store.tasks()),
            };
            for task in tasks {
                if category.is_some_and(|c| c != task.category) || (!all && task.completed) {
                    continue;
                }
                let mark = if task.completed { "x" } else { " " };
                let mut line = format!(
                    "[{mark}] {} {:<5} {}",
                    short_id(task.id),
                    task.category,
                    task.title
                );
                if let Some(duration) = task.duration {
                    line.push_str(&format!(" ({duration})"));
                }
                if let Some(planned) = task.planned_date {
                    line.push_str(&format!(" @{planned}"));
                }
                println!("{line}");
            }
        }
        Command::Done { id } => {
            let id = resolve_task(&store, &id)?;
            store.complete_task(id);
            let done = store.task(id).is_some_and(|task| task.completed);
            println!("{} {}", short_id(id), if done { "done" } else { "reopened" });
        }
        Command::Move {
            id,
            category,
            index,
        } => {
            let id = resolve_task(&store, &id)?;
            match index {
                Some(index) => store.reorder_task(id, category, index),
                None => store.move_task(id, category),
            }
            println!("{} -> {category}", short_id(id));
        }
        Command::Delete { id } => {
            let id = resolve_task(&store, &id)?;
            store.delete_task(id);
            println!("deleted {}", short_id(id));
        }
        Command::Habit(command) => run_habit(&mut store, command)?,
        Command::Export { output } => {
            let json = store.export_json().map_err(|err| err.to_string())?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .map_err(|err| format!("failed to write `{}`: {err}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::Import { path } => {
            let json = std::fs::read_to_string(&path)
                .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
            store.restore_from_json(&json).map_err(|err| err.to_string())?;
            println!(
                "imported: {} tasks, {} habits",
                store.tasks().len(),
                store.habits().len()
            );
        }
        Command::Clear { yes } => {
            if !yes {
                return Err("refusing to clear without --yes".to_string());
            }
            store.clear_all_tasks();
            println!("cleared all tasks and habits");
        }
        Command::Settings(command) => run_settings(&mut store, command),
    }
    Ok(())
}

fn run_habit(store: &mut CliStore, command: HabitCommand) -> Result<(), String> {
    match command {
        HabitCommand::Add {
            title,
            color,
            frequency,
        } => {
            let id = store
                .add_habit(title.join(" "), color, frequency)
                .ok_or_else(|| "title cannot be empty".to_string())?;
            println!("added habit {}", short_id(id));
        }
        HabitCommand::Toggle { id, date } => {
            let id = resolve_habit(store, &id)?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            store.toggle_habit(id, date);
            if let Some(habit) = store.habit(id) {
                let state = if habit.is_done_on(date) { "checked" } else { "unchecked" };
                println!("{} {state} {date} streak={}", habit.title, habit.streak);
            }
        }
        HabitCommand::List => {
            let today = Local::now().date_naive();
            for habit in store.habits() {
                let mark = if habit.is_done_on(today) { "x" } else { " " };
                println!(
                    "[{mark}] {} {} ({}) streak={}",
                    short_id(habit.id),
                    habit.title,
                    habit.frequency,
                    habit.streak
                );
            }
        }
        HabitCommand::Delete { id } => {
            let id = resolve_habit(store, &id)?;
            store.delete_habit(id);
            println!("deleted habit {}", short_id(id));
        }
    }
    Ok(())
}

fn run_settings(store: &mut CliStore, command: SettingsCommand) {
    match command {
        SettingsCommand::Show => {}
        SettingsCommand::Hardcore => store.toggle_hardcore_mode(),
        SettingsCommand::Ai { state } => store.set_ai_mode(matches!(state, Switch::On)),
        SettingsCommand::Language { language } => store.set_language(language),
    }
    let settings = store.settings();
    println!("hardcore={}", settings.hardcore_mode);
    println!("ai={}", settings.ai_mode);
    println!("language={}", settings.language.code());
    println!("duration_unit={}", settings.last_duration_unit.code());
}

fn open_store(config: &CoreConfig, db: Option<PathBuf>) -> Result<CliStore, String> {
    let path = db.unwrap_or_else(|| config.db_path.clone());
    let kv: Box<dyn KvStore> = match SqliteKvStore::open(&path) {
        Ok(kv) => Box::new(kv),
        Err(err) => {
            warn!("event=open_store module=cli status=error path={} error={err}", path.display());
            eprintln!("warning: {err}; changes will not be saved");
            Box::new(MemoryKvStore::new())
        }
    };

    let builder = TaskStore::builder(kv);
    let Some(classifier_config) = config.classifier.clone() else {
        return Ok(builder.build());
    };
    let classifier = HttpClassifier::new(classifier_config).map_err(|err| err.to_string())?;
    Ok(builder
        .with_classification_queue(InlineQueue::new(classifier))
        .build())
}

fn resolve_task(store: &CliStore, raw: &str) -> Result<Uuid, String> {
    resolve_prefix(store.tasks().iter().map(|task| task.id), raw, "task")
}

fn resolve_habit(store: &CliStore, raw: &str) -> Result<Uuid, String> {
    resolve_prefix(store.habits().iter().map(|habit| habit.id), raw, "habit")
}

/// Accepts a full id or a unique prefix of one.
fn resolve_prefix(
    ids: impl Iterator<Item = Uuid>,
    raw: &str,
    kind: &str,
) -> Result<Uuid, String> {
    let needle = raw.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return Err(format!("{kind} id cannot be empty"));
    }
    let matches: Vec<Uuid> = ids
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(format!("no {kind} matches `{raw}`")),
        _ => Err(format!("`{raw}` matches {} {kind}s; use more characters", matches.len())),
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::from_str(raw).map_err(|err| err.to_string())
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| err.to_string())
}

fn parse_duration(raw: &str) -> Result<DurationEstimate, String> {
    DurationEstimate::from_str(raw).map_err(|err| err.to_string())
}

fn parse_language(raw: &str) -> Result<Language, String> {
    Language::from_code(raw).ok_or_else(|| format!("unsupported language `{raw}`; expected en|zh"))
}
