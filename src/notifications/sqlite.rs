use chrono::{Days, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{AuthorizationState, NotificationCenter, NotificationError, PendingNotification};
use crate::models::ChoreId;

/// How long delivered reminders are remembered
const DELIVERED_RETENTION_DAYS: u64 = 30;

/// Pending notifications persisted next to the chores.
///
/// There is no OS prompt on a terminal: the permission "answer" comes from
/// the `reminders.enabled` config switch and is stored the first time it is
/// requested. The `remind` command drains due rows. A reminder that was
/// already delivered is not delivered again if it gets rescheduled for the
/// same instant.
pub struct SqliteNotificationCenter {
    conn: Mutex<Connection>,
    enabled: bool,
}

impl SqliteNotificationCenter {
    /// Open a dedicated connection to the database at `path`
    pub fn open(path: &Path, enabled: bool) -> Result<Self, NotificationError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, enabled)
    }

    pub fn open_in_memory(enabled: bool) -> Result<Self, NotificationError> {
        Self::with_connection(Connection::open_in_memory()?, enabled)
    }

    fn with_connection(conn: Connection, enabled: bool) -> Result<Self, NotificationError> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS pending_notifications (
                key             TEXT PRIMARY KEY,
                fire_at         TEXT NOT NULL,
                title           TEXT NOT NULL,
                body            TEXT NOT NULL,
                chore_id        TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS notification_settings (
                name            TEXT PRIMARY KEY,
                value           TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS delivered_notifications (
                key             TEXT NOT NULL,
                fire_at         TEXT NOT NULL,
                PRIMARY KEY (key, fire_at)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_pending_notifications_fire_at ON pending_notifications(fire_at)",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            enabled,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, NotificationError> {
        self.conn.lock().map_err(|_| NotificationError::Poisoned)
    }

    /// Overwrite the stored permission answer (`notifications allow|deny`)
    pub fn set_authorization(&self, state: &AuthorizationState) -> Result<(), NotificationError> {
        self.conn()?.execute(
            "INSERT INTO notification_settings (name, value) VALUES ('authorization', ?1)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![state.as_str()],
        )?;
        Ok(())
    }

    /// Every pending notification, earliest first
    pub fn pending(&self) -> Result<Vec<PendingNotification>, NotificationError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, fire_at, title, body, chore_id
             FROM pending_notifications ORDER BY fire_at ASC, key ASC",
        )?;
        let rows = stmt.query_map([], row_to_notification)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(NotificationError::from)
    }
}

fn row_to_notification(row: &rusqlite::Row) -> Result<PendingNotification, rusqlite::Error> {
    let chore_id: String = row.get(4)?;
    let chore_id = chore_id.parse::<ChoreId>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(PendingNotification {
        key: row.get(0)?,
        fire_at: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        chore_id,
    })
}

impl NotificationCenter for SqliteNotificationCenter {
    fn request_authorization(&self) -> Result<bool, NotificationError> {
        let state = if self.enabled {
            AuthorizationState::Granted
        } else {
            AuthorizationState::Denied
        };
        self.set_authorization(&state)?;
        Ok(self.enabled)
    }

    fn authorization_state(&self) -> Result<AuthorizationState, NotificationError> {
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "SELECT value FROM notification_settings WHERE name = 'authorization'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw
            .map(|r| AuthorizationState::parse(&r))
            .unwrap_or(AuthorizationState::NotDetermined))
    }

    fn schedule_one_shot(&self, notification: PendingNotification) -> Result<(), NotificationError> {
        self.conn()?.execute(
            "INSERT INTO pending_notifications (key, fire_at, title, body, chore_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
                fire_at = excluded.fire_at,
                title = excluded.title,
                body = excluded.body,
                chore_id = excluded.chore_id",
            params![
                notification.key,
                notification.fire_at,
                notification.title,
                notification.body,
                notification.chore_id.to_string()
            ],
        )?;
        Ok(())
    }

    fn cancel(&self, key: &str) -> Result<(), NotificationError> {
        self.conn()?
            .execute("DELETE FROM pending_notifications WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), NotificationError> {
        self.conn()?.execute("DELETE FROM pending_notifications", [])?;
        Ok(())
    }

    fn list_pending(&self) -> Result<Vec<String>, NotificationError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM pending_notifications ORDER BY key ASC")?;
        let keys = stmt.query_map([], |row| row.get(0))?;
        keys.collect::<Result<Vec<String>, _>>().map_err(NotificationError::from)
    }

    fn take_due(&self, now: NaiveDateTime) -> Result<Vec<PendingNotification>, NotificationError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let due = {
            let mut stmt = tx.prepare(
                "SELECT p.key, p.fire_at, p.title, p.body, p.chore_id
                 FROM pending_notifications p
                 WHERE p.fire_at <= ?1
                   AND NOT EXISTS (
                       SELECT 1 FROM delivered_notifications d
                       WHERE d.key = p.key AND d.fire_at = p.fire_at
                   )
                 ORDER BY p.fire_at ASC, p.key ASC",
            )?;
            let rows = stmt.query_map(params![now], row_to_notification)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        for notification in &due {
            tx.execute(
                "INSERT OR IGNORE INTO delivered_notifications (key, fire_at) VALUES (?1, ?2)",
                params![notification.key, notification.fire_at],
            )?;
        }
        tx.execute("DELETE FROM pending_notifications WHERE fire_at <= ?1", params![now])?;
        if let Some(cutoff) = now.checked_sub_days(Days::new(DELIVERED_RETENTION_DAYS)) {
            tx.execute("DELETE FROM delivered_notifications WHERE fire_at < ?1", params![cutoff])?;
        }
        tx.commit()?;
        Ok(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn notification(key: &str, fire_at: NaiveDateTime) -> PendingNotification {
        PendingNotification {
            key: key.to_string(),
            fire_at,
            title: "Chore reminder".to_string(),
            body: "Vacuum is due today".to_string(),
            chore_id: ChoreId::new(),
        }
    }

    #[test]
    fn test_authorization_follows_config_switch() {
        let center = SqliteNotificationCenter::open_in_memory(true).unwrap();
        assert_eq!(center.authorization_state().unwrap(), AuthorizationState::NotDetermined);
        assert!(center.request_authorization().unwrap());
        assert_eq!(center.authorization_state().unwrap(), AuthorizationState::Granted);

        let center = SqliteNotificationCenter::open_in_memory(false).unwrap();
        assert!(!center.request_authorization().unwrap());
        assert_eq!(center.authorization_state().unwrap(), AuthorizationState::Denied);
    }

    #[test]
    fn test_schedule_replaces_same_key() {
        let center = SqliteNotificationCenter::open_in_memory(true).unwrap();
        center.schedule_one_shot(notification("k1", at(15, 9))).unwrap();
        center.schedule_one_shot(notification("k1", at(16, 9))).unwrap();
        center.schedule_one_shot(notification("k2", at(17, 9))).unwrap();

        assert_eq!(center.list_pending().unwrap(), vec!["k1", "k2"]);
        let pending = center.pending().unwrap();
        assert_eq!(pending[0].fire_at, at(16, 9));
    }

    #[test]
    fn test_cancel_and_cancel_all() {
        let center = SqliteNotificationCenter::open_in_memory(true).unwrap();
        center.schedule_one_shot(notification("k1", at(15, 9))).unwrap();
        center.schedule_one_shot(notification("k2", at(16, 9))).unwrap();

        center.cancel("k1").unwrap();
        center.cancel("missing").unwrap();
        assert_eq!(center.list_pending().unwrap(), vec!["k2"]);

        center.cancel_all().unwrap();
        assert!(center.list_pending().unwrap().is_empty());
    }

    #[test]
    fn test_take_due_removes_only_fired() {
        let center = SqliteNotificationCenter::open_in_memory(true).unwrap();
        center.schedule_one_shot(notification("early", at(14, 9))).unwrap();
        center.schedule_one_shot(notification("now", at(15, 9))).unwrap();
        center.schedule_one_shot(notification("later", at(16, 9))).unwrap();

        let due = center.take_due(at(15, 9)).unwrap();
        let keys: Vec<&str> = due.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["early", "now"]);
        assert_eq!(center.list_pending().unwrap(), vec!["later"]);
    }

    #[test]
    fn test_take_due_does_not_redeliver_same_instant() {
        let center = SqliteNotificationCenter::open_in_memory(true).unwrap();
        center.schedule_one_shot(notification("k1", at(15, 9))).unwrap();
        assert_eq!(center.take_due(at(15, 10)).unwrap().len(), 1);

        // rescheduled for the instant it already fired at
        center.schedule_one_shot(notification("k1", at(15, 9))).unwrap();
        assert!(center.take_due(at(15, 11)).unwrap().is_empty());
        assert!(center.list_pending().unwrap().is_empty());

        center.schedule_one_shot(notification("k1", at(16, 9))).unwrap();
        assert_eq!(center.take_due(at(16, 9)).unwrap().len(), 1);
    }
}
