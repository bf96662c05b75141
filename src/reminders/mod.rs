//! One pending reminder per chore, keyed by the chore id.

pub mod queue;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::models::{ChoreId, ChoreRecord};
use crate::notifications::{AuthorizationState, NotificationCenter, NotificationError, PendingNotification};

pub use queue::{ReminderJob, ReminderQueue};

pub const REMINDER_TITLE: &str = "Chore reminder";

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Invalid reminder time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

/// Wall-clock time a reminder fires on the due day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTime {
    pub hour: u32,
    pub minute: u32,
}

impl Default for ReminderTime {
    fn default() -> Self {
        Self { hour: 9, minute: 0 }
    }
}

impl ReminderTime {
    pub fn to_naive_time(self) -> Result<NaiveTime, ReminderError> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).ok_or(ReminderError::InvalidTime {
            hour: self.hour,
            minute: self.minute,
        })
    }
}

/// Outcome of a full resync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResyncReport {
    pub scheduled: usize,
    /// Chores already past due, left without a reminder
    pub skipped_past_due: usize,
    pub failed: usize,
}

pub struct ReminderDispatcher {
    center: Arc<dyn NotificationCenter>,
    clock: Arc<dyn Clock>,
    time: ReminderTime,
}

impl ReminderDispatcher {
    pub fn new(center: Arc<dyn NotificationCenter>, clock: Arc<dyn Clock>, time: ReminderTime) -> Self {
        Self { center, clock, time }
    }

    pub fn center(&self) -> &Arc<dyn NotificationCenter> {
        &self.center
    }

    pub fn reminder_time(&self) -> ReminderTime {
        self.time
    }

    /// Ask the platform for permission and return its answer.
    ///
    /// Callers check `authorization_state` first; a recorded answer must not
    /// be asked again.
    pub fn request_permission(&self) -> Result<bool, ReminderError> {
        let granted = self.center.request_authorization()?;
        info!(granted, "notification permission requested");
        Ok(granted)
    }

    pub fn authorization_state(&self) -> Result<AuthorizationState, ReminderError> {
        Ok(self.center.authorization_state()?)
    }

    /// Schedule at the configured reminder time
    pub fn schedule_reminder(&self, record: &ChoreRecord) -> Result<(), ReminderError> {
        self.schedule_reminder_at(record, self.time.hour, self.time.minute)
    }

    /// Replace the chore's reminder with one firing at `hour:minute` on its due day.
    ///
    /// A chore due before today only loses its old reminder.
    pub fn schedule_reminder_at(&self, record: &ChoreRecord, hour: u32, minute: u32) -> Result<(), ReminderError> {
        let time = ReminderTime { hour, minute }.to_naive_time()?;

        let key = record.reminder_key();
        self.center.cancel(&key)?;

        if record.next_due < self.clock.today() {
            debug!(chore = %record.id, due = %record.next_due, "past due, no reminder");
            return Ok(());
        }

        let state = self.center.authorization_state()?;
        if !state.allows_scheduling() {
            return Err(NotificationError::PermissionDenied(state).into());
        }

        let notification = PendingNotification {
            key,
            fire_at: NaiveDateTime::new(record.next_due, time),
            title: REMINDER_TITLE.to_string(),
            body: format!("{} is due today", record.name),
            chore_id: record.id,
        };
        debug!(chore = %record.id, fire_at = %notification.fire_at, "scheduling reminder");
        self.center.schedule_one_shot(notification)?;
        Ok(())
    }

    pub fn cancel_reminder(&self, record: &ChoreRecord) -> Result<(), ReminderError> {
        self.cancel_reminder_for(&record.id)
    }

    pub fn cancel_reminder_for(&self, id: &ChoreId) -> Result<(), ReminderError> {
        self.center.cancel(&id.reminder_key())?;
        Ok(())
    }

    /// Drop every pending reminder, then schedule one for each chore due today or later.
    ///
    /// The global cancel finishes before the first schedule. Individual
    /// failures are logged and counted; the batch goes on. A failing global
    /// cancel aborts the resync, since scheduling on top of stale entries could
    /// leave two reminders for one chore.
    pub fn resync_all(&self, records: &[ChoreRecord]) -> Result<ResyncReport, ReminderError> {
        self.center.cancel_all()?;

        let today = self.clock.today();
        let mut report = ResyncReport::default();
        for record in records {
            if record.next_due < today {
                report.skipped_past_due += 1;
                continue;
            }
            match self.schedule_reminder(record) {
                Ok(()) => report.scheduled += 1,
                Err(e) => {
                    warn!(chore = %record.id, name = %record.name, error = %e, "failed to schedule reminder");
                    report.failed += 1;
                }
            }
        }

        info!(
            scheduled = report.scheduled,
            skipped = report.skipped_past_due,
            failed = report.failed,
            "reminders resynced"
        );
        Ok(report)
    }

    /// Remove and return the reminders whose fire time has passed
    pub fn deliver_due(&self) -> Result<Vec<PendingNotification>, ReminderError> {
        let now = self.clock.now().naive_local();
        Ok(self.center.take_due(now)?)
    }
}
