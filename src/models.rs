use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::scheduler::Scheduler;

/// Prefix for the notification key of every chore reminder
pub const REMINDER_KEY_PREFIX: &str = "chore-reminder-";

/// Name given to chores whose stored name turned out blank
pub const PLACEHOLDER_NAME: &str = "Untitled chore";

pub const DEFAULT_INTERVAL_DAYS: i64 = 7;

/// Interval presets offered by the add and edit forms
pub const FREQUENCY_PRESETS: &[(&str, i64)] = &[
    ("Daily", 1),
    ("Every 2 days", 2),
    ("Every 3 days", 3),
    ("Weekly", 7),
    ("Every 2 weeks", 14),
    ("Monthly", 30),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoreId(Uuid);

impl ChoreId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Deterministic notification key for this chore
    pub fn reminder_key(&self) -> String {
        format!("{}{}", REMINDER_KEY_PREFIX, self.0)
    }

    /// First eight hex digits, enough to address a chore from the CLI
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ChoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ChoreId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoreRecord {
    pub id: ChoreId,
    pub name: String,
    /// Repeat cadence in days. Signed so that a corrupt stored value can be
    /// loaded and repaired instead of failing the whole load.
    pub interval_days: i64,
    pub last_completed: Option<NaiveDate>,
    pub next_due: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChoreRecord {
    pub fn new(name: String, interval_days: i64, next_due: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: ChoreId::new(),
            name,
            interval_days,
            last_completed: None,
            next_due,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn reminder_key(&self) -> String {
        self.id.reminder_key()
    }

    /// Name with surrounding whitespace removed
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter a name for the chore")]
    BlankName,
    #[error("Interval must be at least 1 day")]
    NonPositiveInterval,
}

fn validate(name: &str, interval_days: i64) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push(ValidationError::BlankName);
    }
    if interval_days <= 0 {
        errors.push(ValidationError::NonPositiveInterval);
    }
    errors
}

/// Input of the add form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoreDraft {
    pub name: String,
    pub interval_days: i64,
    pub next_due: NaiveDate,
}

impl ChoreDraft {
    /// Empty draft due today with the weekly default interval
    pub fn new(today: NaiveDate) -> Self {
        Self {
            name: String::new(),
            interval_days: DEFAULT_INTERVAL_DAYS,
            next_due: today,
        }
    }

    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }

    pub fn validation_errors(&self) -> Vec<ValidationError> {
        validate(&self.name, self.interval_days)
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Build the record; callers check `validation_errors` first
    pub fn into_record(self, now: DateTime<Utc>) -> ChoreRecord {
        let name = self.trimmed_name().to_string();
        ChoreRecord::new(name, self.interval_days, self.next_due, now)
    }

    pub fn reset(&mut self, today: NaiveDate) {
        *self = Self::new(today);
    }
}

/// Edit session over an existing chore.
///
/// Holds the values the chore had when the session started so the form can
/// tell whether anything changed and revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoreEdit {
    original_name: String,
    original_interval_days: i64,
    original_next_due: NaiveDate,
    pub name: String,
    pub interval_days: i64,
    pub next_due: NaiveDate,
}

/// What `ChoreEdit::apply` changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditOutcome {
    pub applied: bool,
    pub rescheduled: bool,
}

impl ChoreEdit {
    pub fn new(record: &ChoreRecord) -> Self {
        Self {
            original_name: record.name.clone(),
            original_interval_days: record.interval_days,
            original_next_due: record.next_due,
            name: record.name.clone(),
            interval_days: record.interval_days,
            next_due: record.next_due,
        }
    }

    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }

    pub fn has_changes(&self) -> bool {
        self.name != self.original_name
            || self.interval_days != self.original_interval_days
            || self.due_date_changed()
    }

    pub fn due_date_changed(&self) -> bool {
        self.next_due != self.original_next_due
    }

    pub fn validation_errors(&self) -> Vec<ValidationError> {
        validate(&self.name, self.interval_days)
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    pub fn can_save(&self) -> bool {
        self.has_changes() && self.is_valid()
    }

    pub fn revert(&mut self) {
        self.name = self.original_name.clone();
        self.interval_days = self.original_interval_days;
        self.next_due = self.original_next_due;
    }

    pub fn postpone_one_day(&mut self) {
        if let Some(day) = self.next_due.checked_add_days(Days::new(1)) {
            self.next_due = day;
        }
    }

    pub fn bring_forward_one_day(&mut self) {
        if let Some(day) = self.next_due.checked_sub_days(Days::new(1)) {
            self.next_due = day;
        }
    }

    pub fn set_due_today(&mut self, today: NaiveDate) {
        self.next_due = today;
    }

    pub fn set_due_tomorrow(&mut self, today: NaiveDate) {
        if let Some(day) = today.checked_add_days(Days::new(1)) {
            self.next_due = day;
        }
    }

    /// Write the edited values into `record`.
    ///
    /// A due date change goes through `Scheduler::reschedule`, so it only
    /// moves the pending occurrence. Returns without touching the record when
    /// the input is invalid.
    pub fn apply(&mut self, record: &mut ChoreRecord, scheduler: &Scheduler) -> EditOutcome {
        if !self.is_valid() {
            return EditOutcome::default();
        }

        if self.name != self.original_name {
            record.name = self.trimmed_name().to_string();
        }
        if self.interval_days != self.original_interval_days {
            record.interval_days = self.interval_days;
        }

        let rescheduled = self.due_date_changed();
        if rescheduled {
            scheduler.reschedule(record, self.next_due);
        }
        record.updated_at = scheduler.now_utc();

        self.original_name = record.name.clone();
        self.original_interval_days = record.interval_days;
        self.original_next_due = record.next_due;
        self.name = record.name.clone();

        EditOutcome {
            applied: true,
            rescheduled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use std::sync::Arc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample(next_due: NaiveDate) -> ChoreRecord {
        ChoreRecord::new("Vacuum".to_string(), 7, next_due, Utc::now())
    }

    #[test]
    fn test_reminder_key_is_derived_from_id() {
        let record = sample(day(2026, 2, 15));
        assert_eq!(record.reminder_key(), format!("chore-reminder-{}", record.id));
        assert_eq!(record.reminder_key(), record.id.reminder_key());
    }

    #[test]
    fn test_chore_id_round_trips_through_string() {
        let id = ChoreId::new();
        let parsed: ChoreId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn test_draft_validation_messages() {
        let mut draft = ChoreDraft::new(day(2026, 2, 15));
        draft.name = "   ".to_string();
        draft.interval_days = 0;

        let errors = draft.validation_errors();
        assert_eq!(errors, vec![ValidationError::BlankName, ValidationError::NonPositiveInterval]);
        assert_eq!(errors[0].to_string(), "Enter a name for the chore");
        assert_eq!(errors[1].to_string(), "Interval must be at least 1 day");
        assert!(!draft.is_valid());
    }

    #[test]
    fn test_draft_into_record_trims_name() {
        let mut draft = ChoreDraft::new(day(2026, 2, 15));
        draft.name = "  Laundry ".to_string();
        assert!(draft.is_valid());

        let record = draft.into_record(Utc::now());
        assert_eq!(record.name, "Laundry");
        assert_eq!(record.interval_days, DEFAULT_INTERVAL_DAYS);
        assert_eq!(record.next_due, day(2026, 2, 15));
        assert!(record.last_completed.is_none());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_edit_tracks_changes_and_reverts() {
        let record = sample(day(2026, 2, 15));
        let mut edit = ChoreEdit::new(&record);
        assert!(!edit.has_changes());
        assert!(!edit.can_save());

        edit.postpone_one_day();
        assert!(edit.due_date_changed());
        assert_eq!(edit.next_due, day(2026, 2, 16));
        assert!(edit.can_save());

        edit.revert();
        assert!(!edit.has_changes());

        edit.bring_forward_one_day();
        assert_eq!(edit.next_due, day(2026, 2, 14));
        edit.set_due_tomorrow(day(2026, 2, 20));
        assert_eq!(edit.next_due, day(2026, 2, 21));
        edit.set_due_today(day(2026, 2, 20));
        assert_eq!(edit.next_due, day(2026, 2, 20));
    }

    #[test]
    fn test_edit_apply_reschedules_only_when_date_changed() {
        let clock = Arc::new(FixedClock::at_day(day(2026, 2, 10)));
        let scheduler = Scheduler::new(clock);
        let mut record = sample(day(2026, 2, 15));
        record.last_completed = Some(day(2026, 2, 8));

        let mut edit = ChoreEdit::new(&record);
        edit.name = " Mop floors ".to_string();
        edit.interval_days = 3;
        let outcome = edit.apply(&mut record, &scheduler);
        assert!(outcome.applied);
        assert!(!outcome.rescheduled);
        assert_eq!(record.name, "Mop floors");
        assert_eq!(record.interval_days, 3);
        assert_eq!(record.next_due, day(2026, 2, 15));
        assert!(!edit.has_changes());

        edit.next_due = day(2026, 3, 1);
        let outcome = edit.apply(&mut record, &scheduler);
        assert!(outcome.rescheduled);
        assert_eq!(record.next_due, day(2026, 3, 1));
        assert_eq!(record.last_completed, Some(day(2026, 2, 8)));
    }

    #[test]
    fn test_edit_apply_rejects_invalid_input() {
        let clock = Arc::new(FixedClock::at_day(day(2026, 2, 10)));
        let scheduler = Scheduler::new(clock);
        let mut record = sample(day(2026, 2, 15));
        let before = record.clone();

        let mut edit = ChoreEdit::new(&record);
        edit.interval_days = -1;
        let outcome = edit.apply(&mut record, &scheduler);
        assert!(!outcome.applied);
        assert_eq!(record, before);
    }

    #[test]
    fn test_presets_are_positive() {
        assert!(FREQUENCY_PRESETS.iter().all(|(_, days)| *days >= 1));
        assert!(FREQUENCY_PRESETS.iter().any(|(_, days)| *days == 7));
    }
}
