//! Dashboard pages and their permission gate

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::auth::{AuthError, Role, Session, SessionStatus};
use crate::error::Error;

/// A page of the dashboard, each with its own minimum role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Dashboard,
    ChatSupport,
    Automation,
    KnowledgeBase,
}

impl Page {
    /// Pages in navigation order
    pub const ALL: [Page; 4] = [
        Page::Dashboard,
        Page::ChatSupport,
        Page::Automation,
        Page::KnowledgeBase,
    ];

    pub fn required_role(self) -> Role {
        match self {
            Page::Dashboard => Role::Viewer,
            Page::ChatSupport => Role::Support,
            Page::Automation => Role::Support,
            Page::KnowledgeBase => Role::Viewer,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::ChatSupport => "Chat Support",
            Page::Automation => "Automation",
            Page::KnowledgeBase => "Knowledge Base",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::ChatSupport => "chat-support",
            Page::Automation => "automation",
            Page::KnowledgeBase => "knowledge-base",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Page {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|p| p.slug() == s)
            .ok_or_else(|| Error::PageNotFound(s.to_string()))
    }
}

/// Outcome of the page gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    Granted,
    NotAuthenticated,
    SessionExpired,
    InsufficientPermission,
}

impl PageAccess {
    pub fn is_granted(self) -> bool {
        self == PageAccess::Granted
    }

    /// The error to show for a denial, if any
    pub fn denial(self) -> Option<AuthError> {
        match self {
            PageAccess::Granted | PageAccess::NotAuthenticated => None,
            PageAccess::SessionExpired => Some(AuthError::SessionExpired),
            PageAccess::InsufficientPermission => Some(AuthError::InsufficientPermission),
        }
    }
}

/// Decide whether `session` may render `page` as of `now`.
///
/// The expiry check always runs before the role comparison, so a session
/// past its timeout is never granted a page.
pub fn gate(session: &mut Session, page: Page, now: DateTime<Utc>) -> PageAccess {
    match session.check_at(now) {
        SessionStatus::Anonymous => return PageAccess::NotAuthenticated,
        SessionStatus::Expired => return PageAccess::SessionExpired,
        SessionStatus::Active => {}
    }

    if session.authorize(page.required_role()) {
        PageAccess::Granted
    } else {
        tracing::warn!(
            page = page.slug(),
            role = ?session.role(),
            "Insufficient permissions"
        );
        PageAccess::InsufficientPermission
    }
}

/// Navigation entry for one page
#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub page: Page,
    pub title: &'static str,
    pub required_role: Role,
    pub accessible: bool,
}

/// All pages with whether the session's role reaches each one.
///
/// Does not check expiry; gate the request first.
pub fn navigation(session: &Session) -> Vec<NavItem> {
    Page::ALL
        .into_iter()
        .map(|page| NavItem {
            page,
            title: page.title(),
            required_role: page.required_role(),
            accessible: session.authorize(page.required_role()),
        })
        .collect()
}
