//! API middleware and extractors
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope
//! - Body and token extractors
//! - Request logging and request statistics

use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, FromRequest, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::AuthConfig;
use crate::db::DynDocumentStore;
use crate::services::{
    AdminService, BlogService, CaseService, CatalogService, Claims, ClientContactService,
    ClientService, DeleteRequestService, LoginRateLimiter, NewsService, NotificationService,
    QueryService, RatingReviewService, RatingService, ReviewService, ServiceError,
    SubAdminService, SupportService, TokenService, UserService,
};

/// Name of the cookie carrying the session token
pub const TOKEN_COOKIE: &str = "token";

/// Largest request body the logger will echo
const MAX_LOGGED_BODY: usize = 4096;

/// Largest request body accepted by [`JsonBody`]
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    /// Total response time in microseconds
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub clients: Arc<ClientService>,
    pub admins: Arc<AdminService>,
    pub sub_admins: Arc<SubAdminService>,
    pub cases: Arc<CaseService>,
    pub queries: Arc<QueryService>,
    pub catalog: Arc<CatalogService>,
    pub ratings_reviews: Arc<RatingReviewService>,
    pub ratings: Arc<RatingService>,
    pub reviews: Arc<ReviewService>,
    pub support: Arc<SupportService>,
    pub blogs: Arc<BlogService>,
    pub news: Arc<NewsService>,
    pub notifications: Arc<NotificationService>,
    pub delete_requests: Arc<DeleteRequestService>,
    pub client_contacts: Arc<ClientContactService>,
    pub tokens: Arc<TokenService>,
    pub login_limiter: Arc<LoginRateLimiter>,
    pub request_stats: Arc<RequestStats>,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(store: DynDocumentStore, auth: &AuthConfig) -> Self {
        Self {
            users: Arc::new(UserService::new(store.clone())),
            clients: Arc::new(ClientService::new(store.clone())),
            admins: Arc::new(AdminService::new(store.clone())),
            sub_admins: Arc::new(SubAdminService::new(store.clone())),
            cases: Arc::new(CaseService::new(store.clone())),
            queries: Arc::new(QueryService::new(store.clone())),
            catalog: Arc::new(CatalogService::new(store.clone())),
            ratings_reviews: Arc::new(RatingReviewService::new(store.clone())),
            ratings: Arc::new(RatingService::new(store.clone())),
            reviews: Arc::new(ReviewService::new(store.clone())),
            support: Arc::new(SupportService::new(store.clone())),
            blogs: Arc::new(BlogService::new(store.clone())),
            news: Arc::new(NewsService::new(store.clone())),
            notifications: Arc::new(NotificationService::new(store.clone())),
            delete_requests: Arc::new(DeleteRequestService::new(store.clone())),
            client_contacts: Arc::new(ClientContactService::new(store)),
            tokens: Arc::new(TokenService::new(auth)),
            login_limiter: Arc::new(LoginRateLimiter::new()),
            request_stats: Arc::new(RequestStats::new()),
            cookie_secure: auth.cookie_secure,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// HTTP error rendered as `{"success": false, "error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => Self::bad_request(message),
            ServiceError::Unauthorized(message) => Self::unauthorized(message),
            ServiceError::NotFound(message) => Self::not_found(message),
            ServiceError::Conflict(message) => Self::new(StatusCode::CONFLICT, message),
            ServiceError::Internal(source) => {
                tracing::error!("Request failed: {:#}", source);
                Self::internal_error(source.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Extractors
// ============================================================================

/// JSON request body.
///
/// An empty body reads as `{}` so missing payloads surface as field
/// validation errors. The content type is not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let bytes = to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|_| ApiError::bad_request("Request body is too large"))?;
        let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };
        serde_json::from_slice(raw)
            .map(JsonBody)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
    }
}

/// Session token from `Authorization: Bearer`, else the `token` cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string()).filter(|t| !t.is_empty());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name == TOKEN_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
}

/// Client address from the first `X-Forwarded-For` entry, else `X-Real-IP`
pub fn extract_ip_address(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|list| list.split(',').next());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok());

    forwarded
        .or(real_ip)
        .and_then(|ip| ip.trim().parse().ok())
}

/// Address of the caller: proxy headers first, else the socket peer
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        };
        Ok(Self(extract_ip_address(&parts.headers).or_else(peer)))
    }
}

/// Query string extractor that rejects with the JSON error envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::new(rejection.status(), rejection.body_text())),
        }
    }
}

/// Path parameter extractor that rejects with the JSON error envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::new(rejection.status(), rejection.body_text())),
        }
    }
}

/// Verified token claims of the caller
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            extract_token(&parts.headers).ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
        let claims = state.tokens.verify(&token).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            ApiError::unauthorized("Invalid or expired token")
        })?;
        Ok(Self(claims))
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Log each request's method and URI, and small JSON bodies at debug level
pub async fn request_logger(request: Request, next: Next) -> Result<Response, ApiError> {
    tracing::info!("{} {}", request.method(), request.uri());

    if !tracing::enabled!(tracing::Level::DEBUG) || !is_json(request.headers()) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::bad_request("Request body is too large"))?;
    if !bytes.is_empty() && bytes.len() <= MAX_LOGGED_BODY {
        tracing::debug!(
            "{} {} body: {}",
            parts.method,
            parts.uri,
            String::from_utf8_lossy(&bytes)
        );
    }
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Records request count and response time
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state
        .request_stats
        .record(start.elapsed().as_micros() as u64);
    response
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_token_from_bearer() {
        let map = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&map), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let map = headers(&[("cookie", "theme=dark; token=abc.def; other=1")]);
        assert_eq!(extract_token(&map), Some("abc.def".to_string()));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let map = headers(&[
            ("authorization", "Bearer from-header"),
            ("cookie", "token=from-cookie"),
        ]);
        assert_eq!(extract_token(&map), Some("from-header".to_string()));
    }

    #[test]
    fn test_extract_token_missing() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        let map = headers(&[("authorization", "Basic dXNlcjpwYXNz"), ("cookie", "session=x")]);
        assert_eq!(extract_token(&map), None);
    }

    #[test]
    fn test_extract_ip_address() {
        let map = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        assert_eq!(extract_ip_address(&map), Some("203.0.113.7".parse().unwrap()));

        let map = headers(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(extract_ip_address(&map), Some("198.51.100.2".parse().unwrap()));

        let map = headers(&[("x-forwarded-for", "not-an-ip")]);
        assert_eq!(extract_ip_address(&map), None);
    }

    #[tokio::test]
    async fn test_client_ip_falls_back_to_peer_address() {
        let peer: SocketAddr = "192.0.2.44:51000".parse().unwrap();
        let (mut parts, _) = axum::http::Request::builder()
            .extension(ConnectInfo(peer))
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip, Some(peer.ip()));

        parts
            .headers
            .insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip, Some("203.0.113.7".parse().unwrap()));

        let (mut parts, _) = axum::http::Request::builder()
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip, None);
    }

    #[tokio::test]
    async fn test_query_rejection_uses_envelope() {
        #[derive(Debug, serde::Deserialize)]
        struct Params {
            #[allow(dead_code)]
            limit: Option<String>,
        }

        let (mut parts, _) = axum::http::Request::builder()
            .uri("/api/cases?limit=1&limit=2")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let err = Query::<Params>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("limit"));
    }

    #[test]
    fn test_service_error_status_mapping() {
        let cases = [
            (ServiceError::validation("bad"), StatusCode::BAD_REQUEST),
            (ServiceError::unauthorized("no"), StatusCode::UNAUTHORIZED),
            (ServiceError::not_found("gone"), StatusCode::NOT_FOUND),
            (ServiceError::conflict("dup"), StatusCode::CONFLICT),
            (
                ServiceError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_request_stats() {
        let stats = RequestStats::new();
        assert_eq!(stats.avg_response_time_us(), 0.0);
        stats.record(100);
        stats.record(300);
        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.avg_response_time_us(), 200.0);
    }
}
