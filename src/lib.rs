//! IPE - Integrated Platform Environment
//!
//! Session authentication and role-based page gating for the operations
//! dashboard, plus the HTTP surface and static knowledge base it serves.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod kb;
pub mod pages;

pub use auth::{Authenticator, Role, Session, SessionStatus};
pub use config::Config;
pub use error::Error;
pub use pages::{Page, PageAccess};
