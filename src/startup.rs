//! One-shot launch sequence, run before the UI accepts input.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::database::ChoreStore;
use crate::models::{ChoreRecord, PLACEHOLDER_NAME};
use crate::notifications::AuthorizationState;
use crate::reminders::{ReminderDispatcher, ResyncReport};

/// What happened at each step of the launch sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// Authorization state after the permission step, if it could be read
    pub authorization: Option<AuthorizationState>,
    pub permission_requested: bool,
    /// `None` when the resync step was skipped
    pub resync: Option<ResyncReport>,
    pub repaired: usize,
    /// One line per failed step or record, already logged
    pub errors: Vec<String>,
}

/// Repair invariants on a loaded record.
///
/// A non-positive interval becomes 1 and a blank name becomes the
/// placeholder; each fix bumps `updated_at`. Returns whether anything changed.
pub fn repair_record(record: &mut ChoreRecord, now: DateTime<Utc>) -> bool {
    let mut changed = false;
    if record.interval_days <= 0 {
        warn!(chore = %record.id, interval_days = record.interval_days, "repairing non-positive interval");
        record.interval_days = 1;
        record.updated_at = now;
        changed = true;
    }
    if record.name.trim().is_empty() {
        warn!(chore = %record.id, "repairing blank name");
        record.name = PLACEHOLDER_NAME.to_string();
        record.updated_at = now;
        changed = true;
    }
    changed
}

pub struct StartupCoordinator<'a, S: ChoreStore> {
    store: &'a S,
    dispatcher: Arc<ReminderDispatcher>,
    now: DateTime<Utc>,
}

impl<'a, S: ChoreStore> StartupCoordinator<'a, S> {
    pub fn new(store: &'a S, dispatcher: Arc<ReminderDispatcher>, now: DateTime<Utc>) -> Self {
        Self { store, dispatcher, now }
    }

    /// Permission, then resync, then repair. A failing step is logged and
    /// the next one still runs.
    pub fn run(&self) -> StartupReport {
        let mut report = StartupReport::default();
        self.ensure_permission(&mut report);
        self.resync_reminders(&mut report);
        self.repair_records(&mut report);
        info!(
            repaired = report.repaired,
            errors = report.errors.len(),
            "startup sequence finished"
        );
        report
    }

    fn ensure_permission(&self, report: &mut StartupReport) {
        let state = match self.dispatcher.authorization_state() {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "failed to read notification permission");
                report.errors.push(format!("permission: {}", e));
                return;
            }
        };

        if state != AuthorizationState::NotDetermined {
            report.authorization = Some(state);
            return;
        }

        report.permission_requested = true;
        match self.dispatcher.request_permission() {
            Ok(granted) => {
                report.authorization = Some(if granted {
                    AuthorizationState::Granted
                } else {
                    AuthorizationState::Denied
                });
            }
            Err(e) => {
                error!(error = %e, "notification permission request failed");
                report.errors.push(format!("permission: {}", e));
            }
        }
    }

    fn resync_reminders(&self, report: &mut StartupReport) {
        let chores = match self.store.load_all_chores() {
            Ok(chores) => chores,
            Err(e) => {
                error!(error = %e, "failed to load chores for reminder resync");
                report.errors.push(format!("resync: {}", e));
                return;
            }
        };

        match self.dispatcher.resync_all(&chores) {
            Ok(resync) => report.resync = Some(resync),
            Err(e) => {
                error!(error = %e, "reminder resync failed");
                report.errors.push(format!("resync: {}", e));
            }
        }
    }

    fn repair_records(&self, report: &mut StartupReport) {
        let chores = match self.store.load_all_chores() {
            Ok(chores) => chores,
            Err(e) => {
                error!(error = %e, "failed to load chores for repair");
                report.errors.push(format!("repair: {}", e));
                return;
            }
        };

        for mut chore in chores {
            if !repair_record(&mut chore, self.now) {
                continue;
            }
            match self.store.save(&chore) {
                Ok(()) => report.repaired += 1,
                Err(e) => {
                    error!(chore = %chore.id, error = %e, "failed to save repaired chore");
                    report.errors.push(format!("repair {}: {}", chore.id, e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::{Database, DatabaseError};
    use crate::notifications::{MemoryNotificationCenter, NotificationCenter};
    use crate::reminders::ReminderTime;
    use chrono::{NaiveDate, TimeZone};
    use std::cell::Cell;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn dispatcher(center: Arc<MemoryNotificationCenter>) -> Arc<ReminderDispatcher> {
        let clock = Arc::new(FixedClock::at_day(day(2026, 2, 15)));
        Arc::new(ReminderDispatcher::new(center, clock, ReminderTime::default()))
    }

    /// Store whose loads fail; saves are counted
    struct BrokenStore {
        saves: Cell<usize>,
    }

    impl ChoreStore for BrokenStore {
        fn load_all_chores(&self) -> Result<Vec<ChoreRecord>, DatabaseError> {
            Err(DatabaseError::NotFound("table".to_string()))
        }

        fn save(&self, _record: &ChoreRecord) -> Result<(), DatabaseError> {
            self.saves.set(self.saves.get() + 1);
            Ok(())
        }

        fn delete(&self, _record: &ChoreRecord) -> Result<(), DatabaseError> {
            Ok(())
        }
    }

    #[test]
    fn test_repair_record_fixes_interval_and_name() {
        let now = Utc.with_ymd_and_hms(2026, 2, 15, 9, 0, 0).unwrap();
        let mut record = ChoreRecord::new("   ".to_string(), 0, day(2026, 2, 15), created());

        assert!(repair_record(&mut record, now));
        assert_eq!(record.interval_days, 1);
        assert_eq!(record.name, PLACEHOLDER_NAME);
        assert_eq!(record.updated_at, now);

        let later = Utc.with_ymd_and_hms(2026, 2, 16, 9, 0, 0).unwrap();
        assert!(!repair_record(&mut record, later));
        assert_eq!(record.updated_at, now);
    }

    #[test]
    fn test_repair_negative_interval() {
        let mut record = ChoreRecord::new("Dust".to_string(), -4, day(2026, 2, 15), created());
        assert!(repair_record(&mut record, Utc::now()));
        assert_eq!(record.interval_days, 1);
        assert_eq!(record.name, "Dust");
    }

    #[test]
    fn test_run_requests_permission_only_when_undetermined() {
        let db = Database::open_in_memory().unwrap();
        let center = Arc::new(MemoryNotificationCenter::new(true));
        let coordinator = StartupCoordinator::new(&db, dispatcher(center.clone()), Utc::now());

        let report = coordinator.run();
        assert!(report.permission_requested);
        assert_eq!(report.authorization, Some(AuthorizationState::Granted));

        let report = coordinator.run();
        assert!(!report.permission_requested);
        assert_eq!(center.request_count(), 1);
    }

    #[test]
    fn test_run_never_reprompts_after_denial() {
        let db = Database::open_in_memory().unwrap();
        let center = Arc::new(MemoryNotificationCenter::with_state(AuthorizationState::Denied));
        let report = StartupCoordinator::new(&db, dispatcher(center.clone()), Utc::now()).run();

        assert!(!report.permission_requested);
        assert_eq!(report.authorization, Some(AuthorizationState::Denied));
        assert_eq!(center.request_count(), 0);
    }

    #[test]
    fn test_run_resyncs_and_repairs() {
        let db = Database::open_in_memory().unwrap();
        let valid = ChoreRecord::new("Laundry".to_string(), 3, day(2026, 2, 16), created());
        let broken = ChoreRecord::new("".to_string(), 0, day(2026, 2, 20), created());
        let past = ChoreRecord::new("Windows".to_string(), 30, day(2026, 2, 1), created());
        for record in [&valid, &broken, &past] {
            db.save(record).unwrap();
        }

        let center = Arc::new(MemoryNotificationCenter::new(true));
        let now = Utc.with_ymd_and_hms(2026, 2, 15, 8, 0, 0).unwrap();
        let report = StartupCoordinator::new(&db, dispatcher(center.clone()), now).run();

        assert!(report.errors.is_empty());
        assert_eq!(report.repaired, 1);
        let resync = report.resync.unwrap();
        assert_eq!(resync.scheduled, 2);
        assert_eq!(resync.skipped_past_due, 1);

        let repaired = db.get_chore(&broken.id).unwrap();
        assert_eq!(repaired.interval_days, 1);
        assert_eq!(repaired.name, PLACEHOLDER_NAME);
        assert_eq!(repaired.updated_at, now);
        assert_eq!(db.get_chore(&valid.id).unwrap(), valid);

        let pending = center.list_pending().unwrap();
        assert!(pending.contains(&valid.reminder_key()));
        assert!(!pending.contains(&past.reminder_key()));
    }

    #[test]
    fn test_repair_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let broken = ChoreRecord::new(" ".to_string(), -1, day(2026, 2, 20), created());
        db.save(&broken).unwrap();
        let center = Arc::new(MemoryNotificationCenter::new(true));

        let first_now = Utc.with_ymd_and_hms(2026, 2, 15, 8, 0, 0).unwrap();
        let first = StartupCoordinator::new(&db, dispatcher(center.clone()), first_now).run();
        let after_first = db.get_chore(&broken.id).unwrap();

        let second_now = Utc.with_ymd_and_hms(2026, 2, 16, 8, 0, 0).unwrap();
        let second = StartupCoordinator::new(&db, dispatcher(center), second_now).run();
        let after_second = db.get_chore(&broken.id).unwrap();

        assert_eq!(first.repaired, 1);
        assert_eq!(second.repaired, 0);
        assert_eq!(after_first, after_second);
        assert_eq!(after_second.updated_at, first_now);
    }

    #[test]
    fn test_load_failures_are_logged_and_skipped() {
        let store = BrokenStore { saves: Cell::new(0) };
        let center = Arc::new(MemoryNotificationCenter::new(true));
        let report = StartupCoordinator::new(&store, dispatcher(center), Utc::now()).run();

        assert_eq!(report.authorization, Some(AuthorizationState::Granted));
        assert!(report.resync.is_none());
        assert_eq!(report.repaired, 0);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(store.saves.get(), 0);
    }
}
