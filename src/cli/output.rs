//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::auth::{CredentialStore, Role};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Format a role as a colored string
pub fn format_role(role: Role) -> String {
    match role {
        Role::Admin => role.to_string().red().to_string(),
        Role::Support => role.to_string().yellow().to_string(),
        Role::Viewer => role.to_string().green().to_string(),
    }
}

/// A user as listed by `ipe users`; never includes the password hash
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

pub fn user_summaries(store: &CredentialStore) -> Vec<UserSummary> {
    store
        .records()
        .into_iter()
        .map(|r| UserSummary {
            username: r.username.clone(),
            display_name: r.display_name.clone(),
            role: r.role,
        })
        .collect()
}

/// Print a table of users
pub fn print_user_table(users: &[UserSummary]) {
    if users.is_empty() {
        info("No users configured. Add [[auth.users]] entries or set auth.demo_users = true");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Username").fg(Color::Cyan),
            Cell::new("Display Name").fg(Color::Cyan),
            Cell::new("Role").fg(Color::Cyan),
        ]);

    for user in users {
        let role_color = match user.role {
            Role::Admin => Color::Red,
            Role::Support => Color::Yellow,
            Role::Viewer => Color::Green,
        };
        table.add_row(vec![
            Cell::new(&user.username),
            Cell::new(&user.display_name),
            Cell::new(user.role.to_string()).fg(role_color),
        ]);
    }

    println!("{table}");
}
