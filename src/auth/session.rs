//! Session management

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::models::{CurrentUser, Identity, Role};

/// Default session lifetime in hours
pub const SESSION_TIMEOUT_HOURS: i64 = 8;

/// Result of an authentication check on a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Never logged in, or logged out
    Anonymous,
    /// Logged in and within the timeout
    Active,
    /// Was logged in but the timeout passed; the session has been cleared
    Expired,
}

/// One client's authentication state.
///
/// Either fully anonymous, or holding an identity together with its login
/// time. Expiry is detected lazily by [`Session::check_at`].
#[derive(Debug, Clone)]
pub struct Session {
    principal: Option<Principal>,
    timeout: Duration,
}

#[derive(Debug, Clone)]
struct Principal {
    identity: Identity,
    login_time: DateTime<Utc>,
}

impl Session {
    /// Create an anonymous session with the default 8 hour timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::hours(SESSION_TIMEOUT_HOURS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            principal: None,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Commit a verified identity, starting the login period now
    pub fn login(&mut self, identity: Identity) {
        self.login_at(identity, Utc::now());
    }

    /// Commit a verified identity with an explicit login time
    pub fn login_at(&mut self, identity: Identity, login_time: DateTime<Utc>) {
        self.principal = Some(Principal {
            identity,
            login_time,
        });
    }

    /// Check authentication, expiring the session if its timeout has passed
    pub fn is_authenticated(&mut self) -> bool {
        self.check() == SessionStatus::Active
    }

    pub fn check(&mut self) -> SessionStatus {
        self.check_at(Utc::now())
    }

    /// Check authentication as of `now`.
    ///
    /// A session older than its timeout is cleared and reported as
    /// [`SessionStatus::Expired`] exactly once; later checks see it as
    /// anonymous.
    pub fn check_at(&mut self, now: DateTime<Utc>) -> SessionStatus {
        let Some(principal) = &self.principal else {
            return SessionStatus::Anonymous;
        };

        if now.signed_duration_since(principal.login_time) > self.timeout {
            tracing::info!(username = %principal.identity.username, "Session expired");
            self.logout();
            return SessionStatus::Expired;
        }

        SessionStatus::Active
    }

    /// Whether the session's role is at least `required`.
    ///
    /// Does not check expiry; call [`Session::check`] first in the same turn.
    pub fn authorize(&self, required: Role) -> bool {
        self.principal
            .as_ref()
            .is_some_and(|p| p.identity.role.satisfies(required))
    }

    /// Like [`Session::authorize`] with the role given by name. Unknown names
    /// are always denied.
    pub fn authorize_named(&self, required: &str) -> bool {
        let Some(principal) = &self.principal else {
            return false;
        };
        let required_rank = Role::rank_of(required);
        required_rank > 0 && principal.identity.role.rank() >= required_rank
    }

    /// Clear the session back to anonymous. Idempotent.
    pub fn logout(&mut self) {
        self.principal = None;
    }

    /// The logged-in user, without an expiry check
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.principal.as_ref().map(|p| CurrentUser {
            username: p.identity.username.clone(),
            display_name: p.identity.display_name.clone(),
            role: p.identity.role,
            login_time: p.login_time,
        })
    }

    pub fn role(&self) -> Option<Role> {
        self.principal.as_ref().map(|p| p.identity.role)
    }

    pub fn login_time(&self) -> Option<DateTime<Utc>> {
        self.principal.as_ref().map(|p| p.login_time)
    }

    /// Whether the session holds an identity, regardless of age
    pub fn has_principal(&self) -> bool {
        self.principal.is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory store of per-client sessions keyed by an opaque session id.
///
/// Each id maps to its own [`Session`]; no state is shared between ids.
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    timeout: Duration,
}

impl SessionManager {
    /// Create a session manager with the default 8 hour timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::hours(SESSION_TIMEOUT_HOURS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            timeout,
        }
    }

    /// Store a freshly logged-in session under a new id.
    ///
    /// `previous` is dropped so a client never keeps a pre-login id.
    pub async fn start_session(&self, identity: Identity, previous: Option<&str>) -> String {
        self.start_session_at(identity, previous, Utc::now()).await
    }

    pub async fn start_session_at(
        &self,
        identity: Identity,
        previous: Option<&str>,
        login_time: DateTime<Utc>,
    ) -> String {
        let mut session = Session::with_timeout(self.timeout);
        session.login_at(identity, login_time);

        let session_id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        if let Some(previous) = previous {
            sessions.remove(previous);
        }
        sessions.insert(session_id.clone(), session);
        session_id
    }

    /// Run `f` against the session for `session_id`.
    ///
    /// An unknown id gets a transient anonymous session. Sessions left
    /// without a principal afterwards are removed from the store.
    pub async fn with_session<R>(
        &self,
        session_id: Option<&str>,
        f: impl FnOnce(&mut Session) -> R,
    ) -> R {
        let Some(session_id) = session_id else {
            return f(&mut Session::with_timeout(self.timeout));
        };

        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(session_id) else {
            return f(&mut Session::with_timeout(self.timeout));
        };

        let result = f(session);
        let keep = session.has_principal();
        if !keep {
            sessions.remove(session_id);
        }
        result
    }

    /// Log out and forget a session
    pub async fn end_session(&self, session_id: &str) {
        if let Some(mut session) = self.sessions.write().await.remove(session_id) {
            session.logout();
        }
    }

    /// Drop sessions whose age exceeds the timeout plus `grace`.
    ///
    /// Expired sessions inside the grace window are kept so their owners
    /// still see an expiry notice on the next check.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>, grace: Duration) -> usize {
        let Some(limit) = self.timeout.checked_add(&grace) else {
            tracing::warn!("Session cleanup skipped: timeout plus grace overflows");
            return 0;
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            session
                .login_time()
                .is_some_and(|t| now.signed_duration_since(t) <= limit)
        });
        before - sessions.len()
    }

    /// Get session count
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            username: role.to_string(),
            display_name: format!("{} user", role),
            role,
        }
    }

    #[test]
    fn test_new_session_is_anonymous() {
        let mut session = Session::new();
        assert_eq!(session.check(), SessionStatus::Anonymous);
        assert!(session.current_user().is_none());
        for role in Role::ALL {
            assert!(!session.authorize(role));
        }
    }

    #[test]
    fn test_login_populates_fields() {
        let mut session = Session::new();
        let now = Utc::now();
        session.login_at(identity(Role::Support), now);

        let user = session.current_user().unwrap();
        assert_eq!(user.username, "support");
        assert_eq!(user.role, Role::Support);
        assert_eq!(user.login_time, now);
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let mut session = Session::new();
        session.login_at(identity(Role::Admin), now - Duration::hours(8));
        assert_eq!(session.check_at(now), SessionStatus::Active);

        session.login_at(identity(Role::Admin), now - Duration::hours(8) - Duration::seconds(1));
        assert_eq!(session.check_at(now), SessionStatus::Expired);
        assert!(session.current_user().is_none());
        assert_eq!(session.check_at(now), SessionStatus::Anonymous);
    }

    #[test]
    fn test_custom_timeout() {
        let now = Utc::now();
        let mut session = Session::with_timeout(Duration::minutes(30));
        session.login_at(identity(Role::Viewer), now - Duration::minutes(31));
        assert_eq!(session.check_at(now), SessionStatus::Expired);
    }

    #[test]
    fn test_authorize_named_unknown_role_denied() {
        let mut session = Session::new();
        session.login(identity(Role::Admin));
        assert!(session.authorize_named("support"));
        assert!(!session.authorize_named("superadmin"));
        assert!(!session.authorize_named(""));
    }

    #[tokio::test]
    async fn test_start_and_use_session() {
        let manager = SessionManager::new();
        let id = manager.start_session(identity(Role::Viewer), None).await;

        let status = manager.with_session(Some(id.as_str()), |s| s.check()).await;
        assert_eq!(status, SessionStatus::Active);
        assert_eq!(manager.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_start_session_drops_previous_id() {
        let manager = SessionManager::new();
        let first = manager.start_session(identity(Role::Viewer), None).await;
        let second = manager.start_session(identity(Role::Admin), Some(first.as_str())).await;

        assert_ne!(first, second);
        assert_eq!(manager.session_count().await, 1);
        let status = manager.with_session(Some(first.as_str()), |s| s.check()).await;
        assert_eq!(status, SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let manager = SessionManager::new();
        let admin = manager.start_session(identity(Role::Admin), None).await;
        let viewer = manager.start_session(identity(Role::Viewer), None).await;

        manager.end_session(&admin).await;

        assert!(!manager.with_session(Some(admin.as_str()), |s| s.authorize(Role::Viewer)).await);
        assert!(manager.with_session(Some(viewer.as_str()), |s| s.authorize(Role::Viewer)).await);
    }

    #[tokio::test]
    async fn test_expired_session_removed_after_check() {
        let manager = SessionManager::new();
        let id = manager
            .start_session_at(identity(Role::Admin), None, Utc::now() - Duration::hours(9))
            .await;

        let status = manager.with_session(Some(id.as_str()), |s| s.check()).await;
        assert_eq!(status, SessionStatus::Expired);
        assert_eq!(manager.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_cleanup_respects_grace() {
        let manager = SessionManager::new();
        let now = Utc::now();
        manager
            .start_session_at(identity(Role::Admin), None, now - Duration::hours(9))
            .await;
        manager
            .start_session_at(identity(Role::Admin), None, now - Duration::hours(20))
            .await;
        manager.start_session_at(identity(Role::Admin), None, now).await;

        let removed = manager.cleanup_expired(now, Duration::hours(8)).await;
        assert_eq!(removed, 1);
        assert_eq!(manager.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_cleanup_with_overflowing_grace_keeps_sessions() {
        let manager = SessionManager::new();
        let now = Utc::now();
        manager
            .start_session_at(identity(Role::Viewer), None, now - Duration::hours(20))
            .await;

        let removed = manager.cleanup_expired(now, Duration::MAX).await;
        assert_eq!(removed, 0);
        assert_eq!(manager.session_count().await, 1);
    }
}
