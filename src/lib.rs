pub mod actions;
pub mod cli;
pub mod clock;
pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod reminders;
pub mod scheduler;
pub mod startup;
pub mod tui;
pub mod utils;

pub use actions::{ActionError, ChoreActions};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use database::{ChoreStore, Database};
pub use models::{ChoreDraft, ChoreEdit, ChoreId, ChoreRecord};
pub use reminders::{ReminderDispatcher, ReminderQueue};
pub use scheduler::Scheduler;
pub use startup::StartupCoordinator;
pub use utils::Profile;
