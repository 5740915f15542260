//! CLI command implementations

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Password};
use std::fs;
use std::path::Path;

use crate::auth::{Authenticator, CredentialStore};
use crate::cli::{error, format_role, info, print_user_table, success, user_summaries, warn, OutputFormat};
use crate::config::{self, loader::CONFIG_FILENAME, Config};

/// Initialize a new ipe.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn("ipe.toml already exists");
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success("Created ipe.toml");
    warn("Demo users are enabled; replace them with [[auth.users]] entries before sharing the server");
    info("Run 'ipe hash-password' to generate password hashes, then 'ipe serve'");

    Ok(())
}

/// Start the HTTP API server
pub async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config()?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting server at http://{}:{}", host, port));

    crate::api::run_server(config, &host, port).await?;
    Ok(())
}

/// Print a bcrypt hash for a password
pub async fn hash_password(password: Option<String>, cost: Option<u32>) -> Result<()> {
    let cost = match cost {
        Some(cost) => cost,
        None => config::load_config()
            .map(|c| c.auth.bcrypt_cost)
            .unwrap_or(bcrypt::DEFAULT_COST),
    };

    let theme = ColorfulTheme::default();
    let password = match password {
        Some(password) => password,
        None => Password::with_theme(&theme)
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };

    if password.is_empty() {
        error("Password must not be empty");
        anyhow::bail!("empty password");
    }

    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    println!("{}", hash);
    Ok(())
}

/// List configured users
pub async fn users(format: OutputFormat) -> Result<()> {
    let config = load_config()?;
    let store = CredentialStore::from_config(&config.auth)?;
    let users = user_summaries(&store);

    match format {
        OutputFormat::Table => {
            print_user_table(&users);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&users)?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&users)?;
            println!("{}", yaml);
        }
    }

    Ok(())
}

/// Check credentials against the configured users
pub async fn verify(username: &str) -> Result<()> {
    let config = load_config()?;
    let authenticator = Authenticator::new(CredentialStore::from_config(&config.auth)?);

    let theme = ColorfulTheme::default();
    let password = Password::with_theme(&theme)
        .with_prompt(format!("Password for {}", username))
        .allow_empty_password(true)
        .interact()?;

    let username_owned = username.to_string();
    let outcome =
        tokio::task::spawn_blocking(move || authenticator.authenticate(&username_owned, &password))
            .await?;

    match outcome {
        Ok(identity) => {
            success(&format!(
                "{} authenticated as {} ({})",
                username,
                identity.display_name,
                format_role(identity.role)
            ));
            Ok(())
        }
        Err(e) => {
            error(&e.to_string());
            Err(e.into())
        }
    }
}

/// Load config with helpful error message
fn load_config() -> Result<Config> {
    config::load_config().map_err(|e| {
        error(&format!("Failed to load config: {}", e));
        info("Run 'ipe init' to create a configuration file");
        e.into()
    })
}
