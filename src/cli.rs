use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::actions::{ActionError, ChoreActions};
use crate::database::{ChoreStore, Database, DatabaseError};
use crate::models::{ChoreDraft, ChoreEdit, ChoreRecord};
use crate::notifications::{AuthorizationState, NotificationCenter, NotificationError, SqliteNotificationCenter};
use crate::reminders::{ReminderDispatcher, ReminderError};
use crate::scheduler::Scheduler;
use crate::utils::parse_date;

#[derive(Parser)]
#[command(name = "chorely")]
#[command(about = "Recurring chores with day intervals and local reminders")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// Also write log output to stderr
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Add a chore
    Add {
        name: String,
        /// Repeat every N days
        #[arg(long, default_value_t = crate::models::DEFAULT_INTERVAL_DAYS)]
        every: i64,
        /// First due date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        due: Option<String>,
    },
    /// List chores: overdue, then due today, then upcoming
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Mark a chore done today
    Complete {
        /// Chore id or unique id prefix
        id: String,
    },
    /// Move a chore's next due date
    Reschedule {
        id: String,
        /// New due date (YYYY-MM-DD)
        date: String,
    },
    /// Shift a chore's due date by a number of days
    Postpone {
        id: String,
        /// Days to shift; negative brings the chore forward
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        days: i64,
    },
    /// Change a chore's name, interval or due date
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        every: Option<i64>,
        #[arg(long)]
        due: Option<String>,
    },
    /// Delete a chore and its reminder
    Delete { id: String },
    /// Rebuild every pending reminder from the stored chores
    Resync,
    /// Print and clear the reminders whose time has come
    Remind,
    /// Inspect or change notification permission
    Notifications {
        #[command(subcommand)]
        action: NotificationsCommand,
    },
}

#[derive(Subcommand, Clone, Copy)]
pub enum NotificationsCommand {
    /// Show the permission state and pending reminders
    Status,
    /// Grant permission and schedule reminders
    Allow,
    /// Deny permission and drop pending reminders
    Deny,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("{0}")]
    ActionError(#[from] ActionError),
    #[error("Reminder error: {0}")]
    ReminderError(#[from] ReminderError),
    #[error("Notification error: {0}")]
    NotificationError(#[from] NotificationError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Failed to serialize output: {0}")]
    SerializeError(#[from] serde_json::Error),
}

impl Commands {
    /// Commands that queue or replace reminders
    pub fn schedules_reminders(&self) -> bool {
        matches!(
            self,
            Commands::Add { .. }
                | Commands::Complete { .. }
                | Commands::Reschedule { .. }
                | Commands::Postpone { .. }
                | Commands::Edit { .. }
                | Commands::Resync
        )
    }
}

/// Shown when reminders cannot be scheduled because nobody answered the
/// permission question yet (it is asked on the first TUI launch)
pub fn permission_hint(state: &AuthorizationState) -> Option<&'static str> {
    match state {
        AuthorizationState::NotDetermined => Some(
            "Reminders are not enabled yet. Run `chorely notifications allow` or open the TUI once.",
        ),
        _ => None,
    }
}

fn parse_date_arg(raw: &str) -> Result<chrono::NaiveDate, CliError> {
    parse_date(raw).map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", raw, e)))
}

/// One line of `list --json`
#[derive(Debug, Serialize)]
pub struct ChoreListing<'a> {
    #[serde(flatten)]
    pub chore: &'a ChoreRecord,
    pub status: String,
    pub overdue: bool,
}

pub fn handle_add(
    name: String,
    every: i64,
    due: Option<String>,
    actions: &ChoreActions<'_, Database>,
) -> Result<(), CliError> {
    let mut draft = ChoreDraft::new(actions.scheduler().today());
    draft.name = name;
    draft.interval_days = every;
    if let Some(due) = due {
        draft.next_due = parse_date_arg(&due)?;
    }

    let record = actions.create(draft)?;
    println!(
        "Chore created (ID: {}), due {}",
        record.id.short(),
        record.next_due
    );
    Ok(())
}

pub fn handle_list(json: bool, actions: &ChoreActions<'_, Database>) -> Result<(), CliError> {
    let scheduler = actions.scheduler();
    let chores = actions.load_sorted()?;

    if json {
        let listing: Vec<ChoreListing> = chores
            .iter()
            .map(|chore| ChoreListing {
                chore,
                status: scheduler.status_label(chore),
                overdue: scheduler.is_overdue(chore),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if chores.is_empty() {
        println!("No chores yet. Add one with `chorely add <name>`.");
        return Ok(());
    }

    let buckets = scheduler.bucketize(&chores);
    for (title, group) in [
        ("Overdue", &buckets.overdue),
        ("Today", &buckets.today),
        ("Upcoming", &buckets.upcoming),
    ] {
        if group.is_empty() {
            continue;
        }
        println!("{}:", title);
        for chore in group.iter() {
            println!("  {}", format_chore_line(chore, scheduler));
        }
    }
    Ok(())
}

pub fn format_chore_line(chore: &ChoreRecord, scheduler: &Scheduler) -> String {
    format!(
        "{}  {:<24} every {:>3}d  due {} ({})",
        chore.id.short(),
        chore.name,
        chore.interval_days,
        chore.next_due,
        scheduler.status_label(chore)
    )
}

pub fn handle_complete(id: &str, db: &Database, actions: &ChoreActions<'_, Database>) -> Result<(), CliError> {
    let mut chore = db.find_by_prefix(id)?;
    actions.complete(&mut chore)?;
    println!("Completed '{}', next due {}", chore.name, chore.next_due);
    Ok(())
}

pub fn handle_reschedule(
    id: &str,
    date: &str,
    db: &Database,
    actions: &ChoreActions<'_, Database>,
) -> Result<(), CliError> {
    let day = parse_date_arg(date)?;
    let mut chore = db.find_by_prefix(id)?;
    actions.reschedule(&mut chore, day)?;
    println!("'{}' now due {}", chore.name, chore.next_due);
    Ok(())
}

pub fn handle_postpone(
    id: &str,
    days: i64,
    db: &Database,
    actions: &ChoreActions<'_, Database>,
) -> Result<(), CliError> {
    let mut chore = db.find_by_prefix(id)?;
    actions.adjust(&mut chore, days)?;
    println!("'{}' now due {}", chore.name, chore.next_due);
    Ok(())
}

pub fn handle_edit(
    id: &str,
    name: Option<String>,
    every: Option<i64>,
    due: Option<String>,
    db: &Database,
    actions: &ChoreActions<'_, Database>,
) -> Result<(), CliError> {
    let mut chore = db.find_by_prefix(id)?;
    let mut edit = ChoreEdit::new(&chore);
    if let Some(name) = name {
        edit.name = name;
    }
    if let Some(every) = every {
        edit.interval_days = every;
    }
    if let Some(due) = due {
        edit.next_due = parse_date_arg(&due)?;
    }

    if !edit.has_changes() {
        println!("Nothing to change");
        return Ok(());
    }

    actions.apply_edit(&mut chore, &mut edit)?;
    println!(
        "Updated '{}': every {} days, due {}",
        chore.name, chore.interval_days, chore.next_due
    );
    Ok(())
}

pub fn handle_delete(id: &str, db: &Database, actions: &ChoreActions<'_, Database>) -> Result<(), CliError> {
    let chore = db.find_by_prefix(id)?;
    actions.delete(&chore)?;
    println!("Deleted '{}'", chore.name);
    Ok(())
}

/// Runs inline so the summary reflects what was scheduled
pub fn handle_resync(db: &Database, dispatcher: &ReminderDispatcher) -> Result<(), CliError> {
    let chores = db.load_all_chores()?;
    let report = dispatcher.resync_all(&chores)?;
    println!(
        "Reminders scheduled: {}, past due: {}, failed: {}",
        report.scheduled, report.skipped_past_due, report.failed
    );
    Ok(())
}

pub fn handle_remind(dispatcher: &ReminderDispatcher) -> Result<usize, CliError> {
    let delivered = dispatcher.deliver_due()?;
    for notification in &delivered {
        println!("{}: {}", notification.title, notification.body);
    }
    Ok(delivered.len())
}

pub fn handle_notifications(
    action: NotificationsCommand,
    center: &SqliteNotificationCenter,
    db: &Database,
    dispatcher: &ReminderDispatcher,
) -> Result<(), CliError> {
    match action {
        NotificationsCommand::Status => {
            println!("Permission: {}", center.authorization_state()?);
            let pending = center.pending()?;
            println!("Pending reminders: {}", pending.len());
            for notification in pending {
                println!("  {}  {}", notification.fire_at.format("%Y-%m-%d %H:%M"), notification.body);
            }
        }
        NotificationsCommand::Allow => {
            center.set_authorization(&AuthorizationState::Granted)?;
            println!("Notifications allowed");
            handle_resync(db, dispatcher)?;
        }
        NotificationsCommand::Deny => {
            center.set_authorization(&AuthorizationState::Denied)?;
            center.cancel_all()?;
            println!("Notifications denied, pending reminders removed");
        }
    }
    Ok(())
}
