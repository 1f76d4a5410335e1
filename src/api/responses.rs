//! Shared API response types
//!
//! Every successful response uses one envelope:
//! `{"success": true, "data": ..., "count": n, "message": "...", "token": "..."}`
//! with the optional members left out when unset.

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::middleware::{ApiError, TOKEN_COOKIE};

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<u64>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
            token: None,
            deleted: None,
        }
    }

    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    /// Respond with 201 Created
    pub fn created(self) -> (StatusCode, Self) {
        (StatusCode::CREATED, self)
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// A listing that also reports how many documents it holds
    pub fn counted(data: Vec<T>) -> Self {
        let count = data.len();
        Self {
            count: Some(count),
            ..Self::data(data)
        }
    }
}

impl ApiResponse<()> {
    /// `{"success": true}`
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            count: None,
            message: None,
            token: None,
            deleted: None,
        }
    }

    pub fn message(message: &'static str) -> Self {
        Self::ok().with_message(message)
    }

    /// Result of a collection-wide delete
    pub fn deleted(deleted: u64) -> Self {
        Self {
            deleted: Some(deleted),
            ..Self::ok()
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{"id": "..."}`, returned by deletes that confirm their target
#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: String,
}

/// `{"deleted": n}`
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

/// `Set-Cookie` header carrying a fresh session token
pub fn session_cookie(token: &str, max_age: i64, secure: bool) -> Result<HeaderMap, ApiError> {
    cookie_header(&format_cookie(token, max_age, secure))
}

/// `Set-Cookie` header that removes the session token
pub fn clear_session_cookie(secure: bool) -> Result<HeaderMap, ApiError> {
    cookie_header(&format_cookie("", 0, secure))
}

fn format_cookie(value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=None; Max-Age={}",
        TOKEN_COOKIE, value, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn cookie_header(cookie: &str) -> Result<HeaderMap, ApiError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| ApiError::internal_error(format!("Invalid cookie value: {}", e)))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_skips_unset_members() {
        let body = serde_json::to_value(ApiResponse::data(json!({"id": "a"}))).unwrap();
        assert_eq!(body, json!({"success": true, "data": {"id": "a"}}));

        let body = serde_json::to_value(ApiResponse::counted(vec![1, 2, 3])).unwrap();
        assert_eq!(body, json!({"success": true, "data": [1, 2, 3], "count": 3}));

        let body = serde_json::to_value(ApiResponse::deleted(4)).unwrap();
        assert_eq!(body, json!({"success": true, "deleted": 4}));
    }

    #[test]
    fn test_session_cookie() {
        let headers = session_cookie("abc", 604800, true).unwrap();
        assert_eq!(
            headers.get(header::SET_COOKIE).unwrap(),
            "token=abc; Path=/; HttpOnly; SameSite=None; Max-Age=604800; Secure"
        );

        let headers = clear_session_cookie(false).unwrap();
        assert_eq!(
            headers.get(header::SET_COOKIE).unwrap(),
            "token=; Path=/; HttpOnly; SameSite=None; Max-Age=0"
        );
    }
}
