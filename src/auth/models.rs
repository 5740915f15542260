//! Authentication models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// User roles for authorization, ordered from least to most privileged.
///
/// Permission checks are always "at least" comparisons on [`Role::rank`],
/// never equality checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only access to dashboards and the knowledge base
    Viewer,
    /// Can use chat support and run automation
    Support,
    /// Full access
    Admin,
}

impl Role {
    /// All roles, least privileged first
    pub const ALL: [Role; 3] = [Role::Viewer, Role::Support, Role::Admin];

    /// Integer rank used for "at least as privileged as" checks
    pub fn rank(self) -> u8 {
        match self {
            Role::Viewer => 1,
            Role::Support => 2,
            Role::Admin => 3,
        }
    }

    /// Rank of a role given by name. Unknown names rank 0.
    pub fn rank_of(name: &str) -> u8 {
        name.parse::<Role>().map(Role::rank).unwrap_or(0)
    }

    /// Whether this role satisfies a minimum required role
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Support => "support",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Role::Viewer),
            "support" => Ok(Role::Support),
            "admin" => Ok(Role::Admin),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }
}

/// Identity returned by a successful credential check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

/// The authenticated principal of a session, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub login_time: DateTime<Utc>,
}

/// Login credentials
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login response with the new session token
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// User information in responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub login_time: Option<DateTime<Utc>>,
}

impl From<CurrentUser> for UserInfo {
    fn from(user: CurrentUser) -> Self {
        Self {
            username: user.username,
            display_name: user.display_name,
            role: user.role.to_string(),
            login_time: Some(user.login_time),
        }
    }
}
