//! Credential records and the read-only credential store

use std::collections::HashMap;

use crate::auth::models::Role;
use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Fixed demo table: username, password, role, display name
const FIXTURE_USERS: [(&str, &str, Role, &str); 3] = [
    ("admin", "admin123", Role::Admin, "Admin User"),
    ("support", "support123", Role::Support, "Support User"),
    ("viewer", "viewer123", Role::Viewer, "Viewer User"),
];

/// A single user's stored credentials
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub username: String,
    /// bcrypt hash of the secret
    pub password_hash: String,
    pub role: Role,
    pub display_name: String,
}

impl CredentialRecord {
    /// Build a record by hashing a plaintext secret
    pub fn with_password(
        username: impl Into<String>,
        password: &str,
        role: Role,
        display_name: impl Into<String>,
        cost: u32,
    ) -> Result<Self> {
        Ok(Self {
            username: username.into(),
            password_hash: bcrypt::hash(password, cost)?,
            role,
            display_name: display_name.into(),
        })
    }

    /// Verify a candidate secret against the stored hash.
    ///
    /// A malformed stored hash never matches.
    pub fn verify(&self, password: &str) -> bool {
        match bcrypt::verify(password, &self.password_hash) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(username = %self.username, "Stored password hash is unusable: {}", e);
                false
            }
        }
    }
}

/// Immutable lookup of credential records by exact username
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    records: HashMap<String, CredentialRecord>,
}

impl CredentialStore {
    /// Build a store from records, rejecting duplicate usernames
    pub fn new(records: impl IntoIterator<Item = CredentialRecord>) -> Result<Self> {
        let mut map = HashMap::new();
        for record in records {
            if map.contains_key(&record.username) {
                return Err(Error::DuplicateUser(record.username));
            }
            map.insert(record.username.clone(), record);
        }
        Ok(Self { records: map })
    }

    /// The fixed demo users, hashed with the given bcrypt cost
    pub fn fixture(cost: u32) -> Result<Self> {
        let records = FIXTURE_USERS
            .iter()
            .map(|(username, password, role, name)| {
                CredentialRecord::with_password(*username, password, *role, *name, cost)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(records)
    }

    /// Build the store described by the `[auth]` config section
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let mut records: Vec<CredentialRecord> = config
            .users
            .iter()
            .map(|u| CredentialRecord {
                username: u.username.clone(),
                password_hash: u.password_hash.clone(),
                role: u.role,
                display_name: u.display_name.clone().unwrap_or_else(|| u.username.clone()),
            })
            .collect();

        if config.demo_users {
            tracing::warn!("Demo users are enabled; do not use this configuration in production");
            records.extend(Self::fixture(config.bcrypt_cost)?.records.into_values());
        }

        if records.is_empty() {
            tracing::warn!("No users configured; every login will be rejected");
        }

        Self::new(records)
    }

    /// Case-sensitive exact lookup
    pub fn get(&self, username: &str) -> Option<&CredentialRecord> {
        self.records.get(username)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sorted by username
    pub fn records(&self) -> Vec<&CredentialRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.username.cmp(&b.username));
        records
    }
}
