//! CLI interface for IPE

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "ipe")]
#[command(author = "Krakaw")]
#[command(version)]
#[command(about = "Integrated Platform Environment - authenticated operations dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new ipe.toml configuration file
    Init,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host from ipe.toml)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to server.port from ipe.toml)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Hash a password for an [[auth.users]] entry
    HashPassword {
        /// Password to hash. Prefer the interactive prompt: a value given
        /// here ends up in shell history
        #[arg(long)]
        password: Option<String>,

        /// bcrypt cost (defaults to auth.bcrypt_cost, or 12 without a config)
        #[arg(short, long)]
        cost: Option<u32>,
    },

    /// List configured users
    Users {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Check a username and password against the configured users
    Verify {
        /// Username to check
        username: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
