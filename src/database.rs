use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{ChoreId, ChoreRecord};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Chore not found: {0}")]
    NotFound(String),
    #[error("Chore id prefix '{0}' matches more than one chore")]
    AmbiguousId(String),
}

/// Durable storage for chores, as seen by the core
pub trait ChoreStore {
    /// Every chore, ordered by due date
    fn load_all_chores(&self) -> Result<Vec<ChoreRecord>, DatabaseError>;

    /// Insert or update
    fn save(&self, record: &ChoreRecord) -> Result<(), DatabaseError>;

    fn delete(&self, record: &ChoreRecord) -> Result<(), DatabaseError>;
}

pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let db = Database { conn, path: Some(db_path) };
        db.initialize_schema()?;

        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// File backing this database; `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS chores (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                interval_days   INTEGER NOT NULL DEFAULT 7,
                last_completed  TEXT,
                next_due        TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chores_next_due ON chores(next_due)",
            [],
        )?;

        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn row_to_chore(row: &rusqlite::Row) -> Result<ChoreRecord, rusqlite::Error> {
        let id: String = row.get(0)?;
        let id = id.parse::<ChoreId>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(ChoreRecord {
            id,
            name: row.get(1)?,
            interval_days: row.get(2)?,
            last_completed: row.get(3)?,
            next_due: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    pub fn get_chore(&self, id: &ChoreId) -> Result<ChoreRecord, DatabaseError> {
        self.conn
            .query_row(
                "SELECT id, name, interval_days, last_completed, next_due, created_at, updated_at
                 FROM chores WHERE id = ?1",
                rusqlite::params![id.to_string()],
                Self::row_to_chore,
            )
            .optional()?
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))
    }

    /// Resolve a full id or a unique prefix of one (as printed by `list`)
    pub fn find_by_prefix(&self, prefix: &str) -> Result<ChoreRecord, DatabaseError> {
        let prefix = prefix.trim().to_lowercase();
        if let Ok(id) = prefix.parse::<ChoreId>() {
            return self.get_chore(&id);
        }
        let hex = prefix.replace('-', "");
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DatabaseError::NotFound(prefix));
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, name, interval_days, last_completed, next_due, created_at, updated_at
             FROM chores WHERE replace(id, '-', '') LIKE ?1 || '%'",
        )?;
        let mut matches = stmt
            .query_map(rusqlite::params![hex], Self::row_to_chore)?
            .collect::<Result<Vec<_>, _>>()?;

        match matches.len() {
            0 => Err(DatabaseError::NotFound(prefix)),
            1 => Ok(matches.remove(0)),
            _ => Err(DatabaseError::AmbiguousId(prefix)),
        }
    }

    /// Chores due between `start` and `end` inclusive, ordered by due date
    pub fn get_chores_due_between(
        &self,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    ) -> Result<Vec<ChoreRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, interval_days, last_completed, next_due, created_at, updated_at
             FROM chores WHERE next_due >= ?1 AND next_due <= ?2
             ORDER BY next_due ASC, name ASC",
        )?;
        let chores = stmt.query_map(rusqlite::params![start, end], Self::row_to_chore)?;
        chores.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
    }

    pub fn count_chores(&self) -> Result<i64, DatabaseError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM chores", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl ChoreStore for Database {
    fn load_all_chores(&self) -> Result<Vec<ChoreRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, interval_days, last_completed, next_due, created_at, updated_at
             FROM chores ORDER BY next_due ASC, name ASC",
        )?;
        let chores = stmt.query_map([], Self::row_to_chore)?;
        chores.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
    }

    fn save(&self, record: &ChoreRecord) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO chores (id, name, interval_days, last_completed, next_due, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                interval_days = excluded.interval_days,
                last_completed = excluded.last_completed,
                next_due = excluded.next_due,
                updated_at = excluded.updated_at",
            rusqlite::params![
                record.id.to_string(),
                record.name,
                record.interval_days,
                record.last_completed,
                record.next_due,
                record.created_at,
                record.updated_at
            ],
        )?;
        Ok(())
    }

    fn delete(&self, record: &ChoreRecord) -> Result<(), DatabaseError> {
        self.conn.execute(
            "DELETE FROM chores WHERE id = ?1",
            rusqlite::params![record.id.to_string()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn chore(name: &str, next_due: NaiveDate) -> ChoreRecord {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 10, 0, 0).unwrap();
        ChoreRecord::new(name.to_string(), 7, next_due, now)
    }

    #[test]
    fn test_save_and_load_preserves_fields() {
        let db = Database::open_in_memory().unwrap();
        let mut record = chore("Vacuum", day(2026, 2, 20));
        record.last_completed = Some(day(2026, 2, 13));
        db.save(&record).unwrap();

        let loaded = db.load_all_chores().unwrap();
        assert_eq!(loaded, vec![record.clone()]);
        assert_eq!(db.get_chore(&record.id).unwrap(), record);
    }

    #[test]
    fn test_save_upserts() {
        let db = Database::open_in_memory().unwrap();
        let mut record = chore("Vacuum", day(2026, 2, 20));
        db.save(&record).unwrap();

        record.name = "Vacuum upstairs".to_string();
        record.next_due = day(2026, 2, 27);
        db.save(&record).unwrap();

        let loaded = db.load_all_chores().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Vacuum upstairs");
        assert_eq!(loaded[0].next_due, day(2026, 2, 27));
    }

    #[test]
    fn test_load_orders_by_next_due() {
        let db = Database::open_in_memory().unwrap();
        db.save(&chore("late", day(2026, 3, 1))).unwrap();
        db.save(&chore("early", day(2026, 2, 1))).unwrap();
        db.save(&chore("middle", day(2026, 2, 15))).unwrap();

        let names: Vec<String> = db.load_all_chores().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_delete_removes_record() {
        let db = Database::open_in_memory().unwrap();
        let record = chore("Vacuum", day(2026, 2, 20));
        db.save(&record).unwrap();
        db.delete(&record).unwrap();

        assert_eq!(db.count_chores().unwrap(), 0);
        assert!(matches!(db.get_chore(&record.id), Err(DatabaseError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_interval_is_loadable() {
        let db = Database::open_in_memory().unwrap();
        let mut record = chore("Broken", day(2026, 2, 20));
        record.interval_days = 0;
        db.save(&record).unwrap();

        assert_eq!(db.load_all_chores().unwrap()[0].interval_days, 0);
    }

    #[test]
    fn test_find_by_prefix() {
        let db = Database::open_in_memory().unwrap();
        let record = chore("Vacuum", day(2026, 2, 20));
        db.save(&record).unwrap();

        assert_eq!(db.find_by_prefix(&record.id.short()).unwrap().id, record.id);
        assert_eq!(db.find_by_prefix(&record.id.to_string()).unwrap().id, record.id);
        assert!(matches!(db.find_by_prefix("zzzz"), Err(DatabaseError::NotFound(_))));
    }

    #[test]
    fn test_find_by_prefix_treats_wildcards_literally() {
        let db = Database::open_in_memory().unwrap();
        db.save(&chore("Vacuum", day(2026, 2, 20))).unwrap();

        for input in ["%", "_", "a%", "", "  "] {
            assert!(
                matches!(db.find_by_prefix(input), Err(DatabaseError::NotFound(_))),
                "{input:?} should not match"
            );
        }
    }

    #[test]
    fn test_chores_due_between_inclusive() {
        let db = Database::open_in_memory().unwrap();
        db.save(&chore("before", day(2026, 2, 9))).unwrap();
        db.save(&chore("start", day(2026, 2, 10))).unwrap();
        db.save(&chore("end", day(2026, 2, 14))).unwrap();
        db.save(&chore("after", day(2026, 2, 15))).unwrap();

        let names: Vec<String> = db
            .get_chores_due_between(day(2026, 2, 10), day(2026, 2, 14))
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["start", "end"]);
    }
}
