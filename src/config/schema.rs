//! Configuration schema definitions

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::auth::{Role, SESSION_TIMEOUT_HOURS};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration for the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Longest accepted session timeout (one year)
pub const MAX_SESSION_TIMEOUT_HOURS: i64 = 24 * 365;

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session lifetime measured from login
    #[serde(default = "default_session_timeout_hours")]
    pub session_timeout_hours: i64,

    /// bcrypt cost used when hashing (demo users, `ipe hash-password`)
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Mark the session cookie `Secure`
    #[serde(default)]
    pub secure_cookie: bool,

    /// Seed the built-in admin/support/viewer demo accounts
    #[serde(default)]
    pub demo_users: bool,

    #[serde(default)]
    pub users: Vec<UserConfig>,
}

fn default_session_timeout_hours() -> i64 {
    SESSION_TIMEOUT_HOURS
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_cookie_name() -> String {
    "ipe_session".to_string()
}

impl AuthConfig {
    /// Session timeout, clamped to `1..=MAX_SESSION_TIMEOUT_HOURS`
    pub fn session_timeout(&self) -> Duration {
        Duration::hours(self.session_timeout_hours.clamp(1, MAX_SESSION_TIMEOUT_HOURS))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_timeout_hours: default_session_timeout_hours(),
            bcrypt_cost: default_bcrypt_cost(),
            cookie_name: default_cookie_name(),
            secure_cookie: false,
            demo_users: false,
            users: Vec::new(),
        }
    }
}

/// A configured user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,

    /// bcrypt hash, as printed by `ipe hash-password`
    pub password_hash: String,

    pub role: Role,

    /// Defaults to the username
    #[serde(default)]
    pub display_name: Option<String>,
}
