//! Local notification platform.
//!
//! A [`NotificationCenter`] keeps pending one-shot notifications keyed by a
//! string and the user's authorization answer. The reminder layer only talks
//! to this trait; the SQLite center is what the binary uses, the in-memory
//! one backs tests.

pub mod memory;
pub mod sqlite;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::ChoreId;

pub use memory::MemoryNotificationCenter;
pub use sqlite::SqliteNotificationCenter;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification permission not granted ({0})")]
    PermissionDenied(AuthorizationState),
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Notification store lock poisoned")]
    Poisoned,
    #[error("Notification platform error: {0}")]
    Platform(String),
}

/// The user's answer to the notification permission prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationState {
    NotDetermined,
    Granted,
    Denied,
    Provisional,
    /// A state this build does not know about, kept verbatim
    Other(String),
}

impl AuthorizationState {
    /// Whether reminders may be scheduled in this state
    pub fn allows_scheduling(&self) -> bool {
        matches!(self, AuthorizationState::Granted | AuthorizationState::Provisional)
    }

    pub fn as_str(&self) -> &str {
        match self {
            AuthorizationState::NotDetermined => "not_determined",
            AuthorizationState::Granted => "granted",
            AuthorizationState::Denied => "denied",
            AuthorizationState::Provisional => "provisional",
            AuthorizationState::Other(raw) => raw.as_str(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "not_determined" => AuthorizationState::NotDetermined,
            "granted" => AuthorizationState::Granted,
            "denied" => AuthorizationState::Denied,
            "provisional" => AuthorizationState::Provisional,
            other => AuthorizationState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A one-shot notification waiting for its fire time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub key: String,
    /// Local wall-clock time
    pub fire_at: NaiveDateTime,
    pub title: String,
    pub body: String,
    pub chore_id: ChoreId,
}

pub trait NotificationCenter: Send + Sync {
    /// Ask for permission and record the answer
    fn request_authorization(&self) -> Result<bool, NotificationError>;

    fn authorization_state(&self) -> Result<AuthorizationState, NotificationError>;

    /// Add or replace the notification stored under `notification.key`
    fn schedule_one_shot(&self, notification: PendingNotification) -> Result<(), NotificationError>;

    /// Remove the pending notification for `key`, if any
    fn cancel(&self, key: &str) -> Result<(), NotificationError>;

    fn cancel_all(&self) -> Result<(), NotificationError>;

    /// Keys of every pending notification, sorted
    fn list_pending(&self) -> Result<Vec<String>, NotificationError>;

    /// Remove and return the notifications whose fire time is at or before `now`
    fn take_due(&self, now: NaiveDateTime) -> Result<Vec<PendingNotification>, NotificationError>;
}
