use chorely::cli::{self, Cli, Commands};
use chorely::notifications::SqliteNotificationCenter;
use chorely::{
    ChoreActions, Clock, Config, Database, Profile, ReminderDispatcher, ReminderQueue, Scheduler,
    StartupCoordinator, SystemClock, logging, utils,
};
use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use std::sync::Arc;
use tracing::info;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(&utils::expand_path(&path.to_string_lossy()), profile)?,
        None => Config::load_with_profile(profile)?,
    };

    let db_path = config.get_database_path();
    let log_dir = utils::get_data_dir(profile)
        .or_else(|| db_path.parent().map(|p| p.to_path_buf()))
        .ok_or_else(|| eyre!("Could not determine a directory for log files"))?;
    let _log_guard = logging::init(&log_dir.join("logs"), &config.log_level, cli.verbose)?;

    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| eyre!("Database path contains invalid UTF-8"))?,
    )?;
    info!(path = %db_path.display(), "database opened");

    let center = Arc::new(SqliteNotificationCenter::open(&db_path, config.reminders.enabled)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let scheduler = Scheduler::new(Arc::clone(&clock));
    let dispatcher = Arc::new(ReminderDispatcher::new(
        center.clone(),
        Arc::clone(&clock),
        config.reminders.time(),
    ));

    let command = cli.command.unwrap_or(Commands::Tui);

    // one-shot commands are not app launches; only the TUI runs the startup sequence
    if matches!(command, Commands::Tui) {
        let report = StartupCoordinator::new(&db, Arc::clone(&dispatcher), clock.now_utc()).run();
        for error in &report.errors {
            tracing::warn!(%error, "startup step failed");
        }
    }

    if command.schedules_reminders() {
        match dispatcher.authorization_state() {
            Ok(state) => {
                if let Some(hint) = cli::permission_hint(&state) {
                    eprintln!("{}", hint);
                }
            }
            Err(error) => tracing::warn!(%error, "could not read notification permission"),
        }
    }

    let queue = ReminderQueue::start(Arc::clone(&dispatcher));
    let result = {
        let actions = ChoreActions::new(&db, &scheduler, &queue);
        match command {
            Commands::Tui => {
                let app = chorely::tui::App::new(config, &actions)?;
                chorely::tui::run_event_loop(app).map_err(color_eyre::Report::from)
            }
            Commands::Add { name, every, due } => {
                cli::handle_add(name, every, due, &actions).map_err(Into::into)
            }
            Commands::List { json } => cli::handle_list(json, &actions).map_err(Into::into),
            Commands::Complete { id } => cli::handle_complete(&id, &db, &actions).map_err(Into::into),
            Commands::Reschedule { id, date } => {
                cli::handle_reschedule(&id, &date, &db, &actions).map_err(Into::into)
            }
            Commands::Postpone { id, days } => {
                cli::handle_postpone(&id, days, &db, &actions).map_err(Into::into)
            }
            Commands::Edit { id, name, every, due } => {
                cli::handle_edit(&id, name, every, due, &db, &actions).map_err(Into::into)
            }
            Commands::Delete { id } => cli::handle_delete(&id, &db, &actions).map_err(Into::into),
            Commands::Resync => cli::handle_resync(&db, &dispatcher).map_err(Into::into),
            Commands::Remind => cli::handle_remind(&dispatcher).map(|_| ()).map_err(Into::into),
            Commands::Notifications { action } => {
                cli::handle_notifications(action, &center, &db, &dispatcher).map_err(Into::into)
            }
        }
    };

    // reminder jobs queued by the command finish before exit
    queue.shutdown();
    result
}
