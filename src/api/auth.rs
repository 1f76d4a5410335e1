//! Authentication API endpoints
//!
//! Handles:
//! - GET /api/auth/me - Current admin or sub-admin
//! - POST /api/auth/logout - Clear the session cookie
//!
//! Also holds the login flow shared by the client, admin and sub-admin
//! login endpoints: per-IP and per-email rate limiting, token issuance and
//! the session cookie.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::IpAddr;

use crate::api::middleware::{ApiError, ApiResult, AppState, Authenticated};
use crate::api::responses::{clear_session_cookie, session_cookie, ApiResponse};
use crate::db::Document;
use crate::models::{normalize_email, Role, StaffIdentity};
use crate::services::{LoginInput, ServiceError, StaffAccount};

const RATE_LIMITED: &str = "Too many login attempts, please try again later";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
}

/// Run a login attempt behind the rate limiter.
///
/// Requests are counted per client IP before the attempt. Only rejected
/// credentials count against the email; a success clears its history.
pub(crate) async fn limited_login<T, F>(
    state: &AppState,
    ip: Option<IpAddr>,
    input: &LoginInput,
    attempt: F,
) -> ApiResult<T>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    let limiter = &state.login_limiter;

    if let Some(ip) = ip {
        if limiter.is_ip_limited(ip).await {
            tracing::warn!("Login rate limit hit for IP {}", ip);
            return Err(ApiError::too_many_requests(RATE_LIMITED));
        }
        limiter.record_ip_request(ip).await;
    }

    let email = normalize_email(input.email.as_deref().unwrap_or_default());
    if !email.is_empty() && limiter.is_email_limited(&email).await {
        tracing::warn!("Login rate limit hit for {}", email);
        return Err(ApiError::too_many_requests(RATE_LIMITED));
    }

    match attempt.await {
        Ok(account) => {
            limiter.clear_email_attempts(&email).await;
            Ok(account)
        }
        Err(err @ ServiceError::Unauthorized(_)) => {
            limiter.record_failed_attempt(&email).await;
            tracing::info!("Failed login for {}", email);
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Sign a token and build the cookie that carries it
pub(crate) fn issue_session(
    state: &AppState,
    id: &str,
    email: &str,
    role: Role,
    allowed_tabs: Option<Vec<String>>,
) -> ApiResult<(String, HeaderMap)> {
    let token = state
        .tokens
        .issue(id, email, role, allowed_tabs)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    let headers = session_cookie(&token, state.tokens.ttl_seconds(), state.cookie_secure)?;
    Ok((token, headers))
}

/// Staff login: check credentials, then issue a token in the account's role
pub(crate) async fn staff_login<T: StaffAccount>(
    state: &AppState,
    ip: Option<IpAddr>,
    input: &LoginInput,
    attempt: impl Future<Output = Result<T, ServiceError>>,
) -> ApiResult<(HeaderMap, ApiResponse<T::View>)> {
    let account = limited_login(state, ip, input, attempt).await?;
    let (token, cookie) = issue_session(
        state,
        account.id(),
        account.email(),
        T::ROLE,
        account.token_tabs(),
    )?;
    tracing::info!("{} {} logged in", T::ROLE, account.id());
    Ok((cookie, ApiResponse::data(account.login_view()).with_token(token)))
}

/// GET /api/auth/me
async fn me(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
) -> ApiResult<ApiResponse<StaffIdentity>> {
    let identity = match claims.role {
        Role::Admin => state
            .admins
            .find(&claims.id)
            .await?
            .map(|admin| admin.identity(&claims.email)),
        Role::SubAdmin => state
            .sub_admins
            .find(&claims.id)
            .await?
            .map(|sub| sub.identity(&claims.email)),
        Role::Client => return Err(ApiError::unauthorized("Invalid role")),
    };

    identity
        .map(ApiResponse::data)
        .ok_or_else(|| ApiError::unauthorized("User not found"))
}

/// POST /api/auth/logout, also mounted at /api/clients/logout
pub(crate) async fn logout(
    State(state): State<AppState>,
) -> ApiResult<(HeaderMap, ApiResponse<()>)> {
    let headers = clear_session_cookie(state.cookie_secure)?;
    Ok((headers, ApiResponse::message("Logged out successfully")))
}
