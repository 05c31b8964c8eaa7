//! Bearer-session authentication
//!
//! Two credential strategies issue the same kind of session: admins present
//! the managed API key, copytraders log in with email and password checked
//! against the stored hash. Handlers take an [`AuthUser`] extractor; routes
//! that need the admin role take [`AdminUser`].

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use common::model::session::{Role, Session};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// A live session plus the email receipts for this user go to
#[derive(Debug, Clone)]
pub struct SessionEntry {
    /// The issued session
    pub session: Session,
    /// Registered email address, if known
    pub email: Option<String>,
}

/// In-process store of issued bearer sessions
pub struct SessionStore {
    /// Sessions by token
    sessions: DashMap<Uuid, SessionEntry>,
    /// Session lifetime in hours
    ttl_hours: i64,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_hours,
        }
    }

    /// Issue a session for a user
    pub fn issue(&self, user_id: Uuid, role: Role, email: Option<String>) -> Session {
        let session = Session::issue(user_id, role, self.ttl_hours);
        self.sessions.insert(
            session.token,
            SessionEntry {
                session: session.clone(),
                email,
            },
        );
        session
    }

    /// Look up a token; expired sessions are dropped on access
    pub fn authenticate(&self, token: Uuid) -> Option<SessionEntry> {
        let entry = self.sessions.get(&token)?.clone();
        if entry.session.is_expired() {
            debug!("Dropping expired session {}", token);
            self.sessions.remove(&token);
            return None;
        }
        Some(entry)
    }

    /// Revoke a session; returns whether it existed
    pub fn revoke(&self, token: Uuid) -> bool {
        self.sessions.remove(&token).is_some()
    }
}

/// Authenticated user, extracted from the Authorization header
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Authenticated user ID
    pub user_id: Uuid,
    /// Session role
    pub role: Role,
    /// Registered email address, if known
    pub email: Option<String>,
}

/// Authenticated user holding the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

fn bearer_token(parts: &Parts) -> Result<Uuid, ApiError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected a bearer token".to_string()))?;

    token
        .parse::<Uuid>()
        .map_err(|_| ApiError::Unauthorized("Malformed bearer token".to_string()))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let entry = state
            .sessions
            .authenticate(token)
            .ok_or_else(|| ApiError::Unauthorized("Unknown or expired session".to_string()))?;

        Ok(AuthUser {
            user_id: entry.session.user_id,
            role: entry.session.role,
            email: entry.email,
        })
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(ApiError::Forbidden(
                "Admin role required".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}
