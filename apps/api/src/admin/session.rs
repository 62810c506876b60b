//! Admin session context.
//!
//! Sessions are issued on login, removed on logout, and rejected once their
//! expiry has passed. Callers pass the session explicitly to whatever needs
//! admin rights.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("Invalid admin credentials")]
    InvalidCredentials,

    #[error("Admin session not found")]
    UnknownSession,

    #[error("Admin session expired")]
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Clone)]
pub struct AdminSessions {
    password: String,
    ttl: Duration,
    sessions: Arc<Mutex<HashMap<String, AdminSession>>>,
}

impl AdminSessions {
    pub fn new(password: impl Into<String>, ttl: Duration) -> Self {
        Self {
            password: password.into(),
            ttl,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn login(&self, password: &str, now: DateTime<Utc>) -> Result<AdminSession, AdminError> {
        if password.is_empty() || password != self.password {
            return Err(AdminError::InvalidCredentials);
        }

        let session = AdminSession {
            token: Uuid::new_v4().simple().to_string(),
            issued_at: now,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let mut sessions = self.lock();
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.token.clone(), session.clone());
        info!("Admin session issued, expires at {}", session.expires_at);

        Ok(session)
    }

    /// Returns whether a session was removed.
    pub fn logout(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AdminSession, AdminError> {
        let mut sessions = self.lock();
        let session = sessions.get(token).ok_or(AdminError::UnknownSession)?;
        if session.is_expired(now) {
            sessions.remove(token);
            return Err(AdminError::Expired);
        }
        Ok(session.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, AdminSession>> {
        // A poisoned map only means another request panicked mid-insert.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions() -> AdminSessions {
        AdminSessions::new("hunter2", Duration::minutes(30))
    }

    #[test]
    fn test_login_issues_session() {
        let now = Utc::now();
        let session = sessions().login("hunter2", now).unwrap();
        assert_eq!(session.issued_at, now);
        assert_eq!(session.expires_at, now + Duration::minutes(30));
        assert!(!session.token.is_empty());
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let err = sessions().login("nope", Utc::now()).unwrap_err();
        assert_eq!(err, AdminError::InvalidCredentials);
    }

    #[test]
    fn test_empty_configured_password_never_matches() {
        let sessions = AdminSessions::new("", Duration::minutes(5));
        assert!(sessions.login("", Utc::now()).is_err());
    }

    #[test]
    fn test_logout_invalidates() {
        let sessions = sessions();
        let now = Utc::now();
        let session = sessions.login("hunter2", now).unwrap();
        assert!(sessions.validate(&session.token, now).is_ok());
        assert!(sessions.logout(&session.token));
        assert_eq!(
            sessions.validate(&session.token, now),
            Err(AdminError::UnknownSession)
        );
        assert!(!sessions.logout(&session.token));
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let sessions = sessions();
        let now = Utc::now();
        let session = sessions.login("hunter2", now).unwrap();
        let later = now + Duration::minutes(31);
        assert_eq!(sessions.validate(&session.token, later), Err(AdminError::Expired));
        assert_eq!(
            sessions.validate(&session.token, now),
            Err(AdminError::UnknownSession)
        );
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_overflowing() {
        let sessions = AdminSessions::new("hunter2", Duration::MAX);
        let now = Utc::now();
        let session = sessions.login("hunter2", now).unwrap();
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(sessions.validate(&session.token, now).is_ok());
    }
}
