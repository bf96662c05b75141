use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{AuthorizationState, NotificationCenter, NotificationError, PendingNotification};

/// Notification center that lives only in memory.
///
/// `grant_on_request` decides the answer to `request_authorization`;
/// `set_failing(true)` makes every scheduling call fail, which is how the
/// error paths of the reminder layer are exercised.
#[derive(Debug)]
pub struct MemoryNotificationCenter {
    pending: Mutex<BTreeMap<String, PendingNotification>>,
    state: Mutex<AuthorizationState>,
    grant_on_request: bool,
    failing: AtomicBool,
    requests: Mutex<u32>,
}

impl MemoryNotificationCenter {
    pub fn new(grant_on_request: bool) -> Self {
        Self {
            pending: Mutex::new(BTreeMap::new()),
            state: Mutex::new(AuthorizationState::NotDetermined),
            grant_on_request,
            failing: AtomicBool::new(false),
            requests: Mutex::new(0),
        }
    }

    /// Center that already has `state` recorded
    pub fn with_state(state: AuthorizationState) -> Self {
        let center = Self::new(state == AuthorizationState::Granted);
        if let Ok(mut guard) = center.state.lock() {
            *guard = state;
        }
        center
    }

    /// Overwrite the recorded answer, as a settings change would
    pub fn set_state(&self, state: AuthorizationState) {
        if let Ok(mut guard) = self.state.lock() {
            *guard = state;
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// How many times permission was requested
    pub fn request_count(&self) -> u32 {
        self.requests.lock().map(|g| *g).unwrap_or(0)
    }

    pub fn get(&self, key: &str) -> Option<PendingNotification> {
        self.pending.lock().ok()?.get(key).cloned()
    }
}

impl NotificationCenter for MemoryNotificationCenter {
    fn request_authorization(&self) -> Result<bool, NotificationError> {
        *self.requests.lock().map_err(|_| NotificationError::Poisoned)? += 1;
        let mut state = self.state.lock().map_err(|_| NotificationError::Poisoned)?;
        *state = if self.grant_on_request {
            AuthorizationState::Granted
        } else {
            AuthorizationState::Denied
        };
        Ok(self.grant_on_request)
    }

    fn authorization_state(&self) -> Result<AuthorizationState, NotificationError> {
        Ok(self.state.lock().map_err(|_| NotificationError::Poisoned)?.clone())
    }

    fn schedule_one_shot(&self, notification: PendingNotification) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Platform("scheduling disabled".to_string()));
        }
        self.pending
            .lock()
            .map_err(|_| NotificationError::Poisoned)?
            .insert(notification.key.clone(), notification);
        Ok(())
    }

    fn cancel(&self, key: &str) -> Result<(), NotificationError> {
        self.pending.lock().map_err(|_| NotificationError::Poisoned)?.remove(key);
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), NotificationError> {
        self.pending.lock().map_err(|_| NotificationError::Poisoned)?.clear();
        Ok(())
    }

    fn list_pending(&self) -> Result<Vec<String>, NotificationError> {
        Ok(self
            .pending
            .lock()
            .map_err(|_| NotificationError::Poisoned)?
            .keys()
            .cloned()
            .collect())
    }

    fn take_due(&self, now: NaiveDateTime) -> Result<Vec<PendingNotification>, NotificationError> {
        let mut pending = self.pending.lock().map_err(|_| NotificationError::Poisoned)?;
        let due_keys: Vec<String> = pending
            .values()
            .filter(|n| n.fire_at <= now)
            .map(|n| n.key.clone())
            .collect();
        let mut due: Vec<PendingNotification> =
            due_keys.iter().filter_map(|k| pending.remove(k)).collect();
        due.sort_by_key(|n| n.fire_at);
        Ok(due)
    }
}
