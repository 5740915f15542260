//! Authentication, sessions and role-based authorization

pub mod authenticator;
pub mod credentials;
pub mod middleware;
pub mod models;
pub mod session;

pub use authenticator::{AuthError, Authenticator};
pub use credentials::{CredentialRecord, CredentialStore};
pub use middleware::{clear_session_cookie, session_cookie, session_id_from_headers};
pub use models::{CurrentUser, Identity, LoginRequest, LoginResponse, Role, UserInfo};
pub use session::{Session, SessionManager, SessionStatus, SESSION_TIMEOUT_HOURS};
