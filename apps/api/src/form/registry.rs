use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::form::controller::ApplicationForm;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Form {0} not found")]
    NotFound(Uuid),

    #[error("Form {0} is busy with another operation")]
    Busy(Uuid),
}

type SharedForm = Arc<AsyncMutex<ApplicationForm>>;

struct Entry {
    form: SharedForm,
    last_touched: Instant,
}

impl Entry {
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.form) > 1
    }

    /// Idle past the TTL, or bound to an admin session that has expired.
    fn is_stale(&self, now: Instant, idle_ttl: Duration) -> bool {
        if self.in_use() {
            return false;
        }
        if now.duration_since(self.last_touched) >= idle_ttl {
            return true;
        }
        match self.form.try_lock() {
            Ok(form) => form
                .flow()
                .admin_session()
                .is_some_and(|session| session.is_expired(Utc::now())),
            Err(_) => false,
        }
    }
}

/// Live form sessions keyed by id.
///
/// Each form sits behind its own async mutex. `acquire` never waits: a
/// request that arrives while another operation on the same form is still
/// running (an upload being encoded, a submission in flight) is turned away.
///
/// A view that navigates away without deleting its form leaves it idle.
/// Idle forms, and admin forms whose session has expired, are swept on the
/// next `insert` and refused by `acquire`.
#[derive(Clone)]
pub struct FormRegistry {
    forms: Arc<Mutex<HashMap<Uuid, Entry>>>,
    idle_ttl: Duration,
}

impl FormRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            forms: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub fn insert(&self, id: Uuid, form: ApplicationForm) {
        let now = Instant::now();
        let mut forms = self.lock();
        let before = forms.len();
        forms.retain(|_, entry| !entry.is_stale(now, self.idle_ttl));
        if forms.len() < before {
            debug!("Swept {} stale form(s)", before - forms.len());
        }

        forms.insert(
            id,
            Entry {
                form: Arc::new(AsyncMutex::new(form)),
                last_touched: now,
            },
        );
        debug!("Form {id} registered");
    }

    pub fn acquire(&self, id: Uuid) -> Result<OwnedMutexGuard<ApplicationForm>, RegistryError> {
        let now = Instant::now();
        let form = {
            let mut forms = self.lock();
            let entry = forms.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
            if entry.is_stale(now, self.idle_ttl) {
                forms.remove(&id);
                debug!("Form {id} expired");
                return Err(RegistryError::NotFound(id));
            }
            entry.last_touched = now;
            entry.form.clone()
        };
        form.try_lock_owned().map_err(|_| RegistryError::Busy(id))
    }

    /// Drops the session. An operation already holding the form finishes on
    /// its own copy.
    pub fn remove(&self, id: Uuid) -> Result<(), RegistryError> {
        self.lock()
            .remove(&id)
            .map(|_| debug!("Form {id} removed"))
            .ok_or(RegistryError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.forms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
