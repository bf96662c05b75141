use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::database::{ChoreStore, DatabaseError};
use crate::models::{ChoreDraft, ChoreEdit, ChoreRecord, EditOutcome, ValidationError};
use crate::reminders::ReminderQueue;
use crate::scheduler::Scheduler;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{}", format_validation(.0))]
    Invalid(Vec<ValidationError>),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Record mutations shared by the CLI and the TUI.
///
/// Each one changes the record through the scheduler, queues the matching
/// reminder update and then persists. Reminder failures never surface here.
pub struct ChoreActions<'a, S: ChoreStore> {
    store: &'a S,
    scheduler: &'a Scheduler,
    reminders: &'a ReminderQueue,
}

impl<'a, S: ChoreStore> ChoreActions<'a, S> {
    pub fn new(store: &'a S, scheduler: &'a Scheduler, reminders: &'a ReminderQueue) -> Self {
        Self {
            store,
            scheduler,
            reminders,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        self.scheduler
    }

    pub fn load_sorted(&self) -> Result<Vec<ChoreRecord>, ActionError> {
        let mut chores = self.store.load_all_chores()?;
        self.scheduler.sort_for_display(&mut chores);
        Ok(chores)
    }

    pub fn create(&self, draft: ChoreDraft) -> Result<ChoreRecord, ActionError> {
        let errors = draft.validation_errors();
        if !errors.is_empty() {
            return Err(ActionError::Invalid(errors));
        }

        let record = draft.into_record(self.scheduler.now_utc());
        self.reminders.schedule(&record);
        self.store.save(&record)?;
        info!(chore = %record.id, name = %record.name, next_due = %record.next_due, "chore created");
        Ok(record)
    }

    pub fn complete(&self, record: &mut ChoreRecord) -> Result<(), ActionError> {
        self.scheduler.mark_completed(record);
        self.reminders.schedule(record);
        self.store.save(record)?;
        info!(chore = %record.id, next_due = %record.next_due, "chore completed");
        Ok(())
    }

    pub fn reschedule(&self, record: &mut ChoreRecord, day: NaiveDate) -> Result<(), ActionError> {
        self.scheduler.reschedule(record, day);
        self.reminders.schedule(record);
        self.store.save(record)?;
        Ok(())
    }

    /// Shift the due date by `delta_days` (negative brings it forward)
    pub fn adjust(&self, record: &mut ChoreRecord, delta_days: i64) -> Result<(), ActionError> {
        let before = record.next_due;
        self.scheduler.adjust_due_date(record, delta_days);
        if record.next_due == before {
            return Ok(());
        }
        self.reminders.schedule(record);
        self.store.save(record)?;
        Ok(())
    }

    pub fn apply_edit(&self, record: &mut ChoreRecord, edit: &mut ChoreEdit) -> Result<EditOutcome, ActionError> {
        let errors = edit.validation_errors();
        if !errors.is_empty() {
            return Err(ActionError::Invalid(errors));
        }

        let outcome = edit.apply(record, self.scheduler);
        if outcome.applied {
            // the body carries the name, so any edit refreshes the reminder
            self.reminders.schedule(record);
            self.store.save(record)?;
        }
        Ok(outcome)
    }

    /// Cancel the reminder, then remove the chore
    pub fn delete(&self, record: &ChoreRecord) -> Result<(), ActionError> {
        self.reminders.cancel(record.id);
        self.store.delete(record)?;
        info!(chore = %record.id, name = %record.name, "chore deleted");
        Ok(())
    }

    pub fn resync(&self) -> Result<usize, ActionError> {
        let chores = self.store.load_all_chores()?;
        let count = chores.len();
        self.reminders.resync(chores);
        Ok(count)
    }
}
