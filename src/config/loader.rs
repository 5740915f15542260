//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::Path;

use super::{Config, MAX_SESSION_TIMEOUT_HOURS};

pub const CONFIG_FILENAME: &str = "ipe.toml";

/// Load configuration from ipe.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Write configuration to a specific path
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    if !(1..=MAX_SESSION_TIMEOUT_HOURS).contains(&config.auth.session_timeout_hours) {
        return Err(Error::Config(format!(
            "auth.session_timeout_hours must be between 1 and {}",
            MAX_SESSION_TIMEOUT_HOURS
        )));
    }
    if !(4..=31).contains(&config.auth.bcrypt_cost) {
        return Err(Error::Config(
            "auth.bcrypt_cost must be between 4 and 31".to_string(),
        ));
    }
    if config.auth.cookie_name.is_empty() {
        return Err(Error::Config("auth.cookie_name must not be empty".to_string()));
    }
    if let Some(user) = config.auth.users.iter().find(|u| u.username.is_empty()) {
        return Err(Error::Config(format!(
            "user with role '{}' has an empty username",
            user.role
        )));
    }
    Ok(())
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<std::path::PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    // Compile-time constant pattern
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# Integrated Platform Environment configuration

[server]
host = "0.0.0.0"
port = 8501

[auth]
session_timeout_hours = 8
bcrypt_cost = 12
cookie_name = "ipe_session"
secure_cookie = false

# Seeds admin/admin123, support/support123 and viewer/viewer123.
# Disable before exposing the server to anyone.
demo_users = true

# Add accounts with hashes from 'ipe hash-password':
# [[auth.users]]
# username = "alice"
# password_hash = "${ALICE_PASSWORD_HASH}"
# role = "support"
# display_name = "Alice"
"#
}
