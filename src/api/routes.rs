//! API route handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::server::SharedState;
use crate::auth::{
    clear_session_cookie, session_cookie, session_id_from_headers, AuthError, CurrentUser,
    LoginRequest, LoginResponse, Role, SessionStatus, UserInfo,
};
use crate::error::Error;
use crate::kb;
use crate::pages::{self, NavItem, Page, PageAccess};

const NOT_AUTHENTICATED: &str = "Not authenticated";

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failure that still carries a payload
    pub fn fail(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Session state as reported to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionState {
    pub authenticated: bool,
    /// True when the session expired on this check, as opposed to never
    /// having logged in
    pub expired: bool,
    pub user: Option<UserInfo>,
}

/// A page the caller may render
#[derive(Debug, Serialize)]
pub struct PageView {
    pub page: Page,
    pub title: &'static str,
    pub required_role: Role,
    pub user: Option<UserInfo>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Auth(AuthError::InvalidInput) => StatusCode::BAD_REQUEST,
            Error::Auth(AuthError::InsufficientPermission) => StatusCode::FORBIDDEN,
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::PageNotFound(_) => StatusCode::NOT_FOUND,
            Error::UnknownRole(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(ApiResponse::<()>::err(self.to_string()))).into_response()
    }
}

/// Response for a request the page gate turned away
fn denied(access: PageAccess) -> Response {
    match access.denial() {
        Some(err) => Error::Auth(err).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::err(NOT_AUTHENTICATED)),
        )
            .into_response(),
    }
}

/// Run the page gate for the caller's session
async fn gate_request(
    state: &SharedState,
    headers: &HeaderMap,
    page: Page,
) -> (PageAccess, Option<CurrentUser>) {
    let session_id = session_id_from_headers(headers, &state.config.auth.cookie_name);
    state
        .sessions
        .with_session(session_id.as_deref(), |session| {
            let access = pages::gate(session, page, Utc::now());
            (access, session.current_user())
        })
        .await
}

// Health check

pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok("healthy"))
}

// Session routes

pub async fn login(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::warn!("Malformed login body: {}", rejection);
        Error::Auth(AuthError::InvalidInput)
    })?;
    let username = req.username.clone();
    let verifier = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        verifier.authenticator.authenticate(&req.username, &req.password)
    })
    .await
    .map_err(|e| Error::Other(format!("Login task failed: {}", e)))?;

    let identity = match outcome {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(username = %username, "Login failed: {}", e);
            return Err(e.into());
        }
    };

    let auth = &state.config.auth;
    let previous = session_id_from_headers(&headers, &auth.cookie_name);
    let session_id = state
        .sessions
        .start_session(identity, previous.as_deref())
        .await;
    let user = state
        .sessions
        .with_session(Some(session_id.as_str()), |s| s.current_user())
        .await
        .ok_or_else(|| Error::Other("Session vanished after login".to_string()))?;

    tracing::info!(username = %user.username, role = %user.role, "Login succeeded");

    let cookie = session_cookie(
        &auth.cookie_name,
        &session_id,
        auth.session_timeout().num_seconds(),
        auth.secure_cookie,
    );
    let body = LoginResponse {
        token: session_id,
        user: user.into(),
    };

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::ok(body)),
    )
        .into_response())
}

pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> impl IntoResponse {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(session_id) = session_id_from_headers(&headers, cookie_name) {
        state.sessions.end_session(&session_id).await;
        tracing::info!("Logged out");
    }

    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie(cookie_name))],
        Json(ApiResponse::ok("logged out")),
    )
}

pub async fn current_session(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session_id = session_id_from_headers(&headers, &state.config.auth.cookie_name);
    let (status, user) = state
        .sessions
        .with_session(session_id.as_deref(), |s| (s.check(), s.current_user()))
        .await;

    match status {
        SessionStatus::Active => (
            StatusCode::OK,
            Json(ApiResponse::ok(SessionState {
                authenticated: true,
                expired: false,
                user: user.map(UserInfo::from),
            })),
        ),
        SessionStatus::Expired => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::fail(
                SessionState {
                    authenticated: false,
                    expired: true,
                    user: None,
                },
                AuthError::SessionExpired.to_string(),
            )),
        ),
        SessionStatus::Anonymous => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::fail(
                SessionState {
                    authenticated: false,
                    expired: false,
                    user: None,
                },
                NOT_AUTHENTICATED,
            )),
        ),
    }
}

// Page routes

pub async fn list_pages(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let session_id = session_id_from_headers(&headers, &state.config.auth.cookie_name);
    let result: Result<Vec<NavItem>, PageAccess> = state
        .sessions
        .with_session(session_id.as_deref(), |session| match session.check() {
            SessionStatus::Active => Ok(pages::navigation(session)),
            SessionStatus::Expired => Err(PageAccess::SessionExpired),
            SessionStatus::Anonymous => Err(PageAccess::NotAuthenticated),
        })
        .await;

    match result {
        Ok(nav) => Json(ApiResponse::ok(nav)).into_response(),
        Err(access) => denied(access),
    }
}

pub async fn get_page(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    let page: Page = slug.parse()?;
    let (access, user) = gate_request(&state, &headers, page).await;

    if !access.is_granted() {
        return Ok(denied(access));
    }

    Ok(Json(ApiResponse::ok(PageView {
        page,
        title: page.title(),
        required_role: page.required_role(),
        user: user.map(UserInfo::from),
    }))
    .into_response())
}

// Knowledge base routes

pub async fn kb_search(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
    headers: HeaderMap,
) -> Response {
    let (access, _) = gate_request(&state, &headers, Page::KnowledgeBase).await;
    if !access.is_granted() {
        return denied(access);
    }

    Json(ApiResponse::ok(state.kb.search(&query.q))).into_response()
}

pub async fn kb_recent(
    State(state): State<SharedState>,
    Query(query): Query<RecentQuery>,
    headers: HeaderMap,
) -> Response {
    let (access, _) = gate_request(&state, &headers, Page::KnowledgeBase).await;
    if !access.is_granted() {
        return denied(access);
    }

    let limit = query.limit.unwrap_or(kb::DEFAULT_LIMIT);
    Json(ApiResponse::ok(state.kb.recent(limit))).into_response()
}
