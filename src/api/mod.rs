//! API layer - HTTP handlers and routing
//!
//! Every resource is mounted under `/api`. Responses use the
//! `{"success": ..., "data" | "error": ...}` envelope from [`responses`]
//! and [`middleware::ApiError`].

pub mod auth;
pub mod cases;
pub mod catalog;
pub mod client_contacts;
pub mod clients;
pub mod common;
pub mod content;
pub mod delete_requests;
pub mod middleware;
pub mod queries;
pub mod ratings;
pub mod responses;
pub mod staff;
pub mod support;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;

use crate::models::{Admin, SubAdmin};

pub use middleware::{ApiError, ApiResult, AppState, RequestStats};

/// Mounted resource prefixes, as listed by `GET /`
const ENDPOINTS: [(&str, &str); 20] = [
    ("auth", "/api/auth"),
    ("users", "/api/users"),
    ("clients", "/api/clients"),
    ("cases", "/api/cases"),
    ("support", "/api/support"),
    ("queries", "/api/queries"),
    ("query-answers", "/api/query-answers"),
    ("news", "/api/news"),
    ("blogs", "/api/blogs"),
    ("notifications", "/api/notifications"),
    ("admins", "/api/admins"),
    ("subAdmins", "/api/subAdmins"),
    ("ratings-reviews", "/api/ratings-reviews"),
    ("ratings", "/api/ratings"),
    ("reviews", "/api/reviews"),
    ("client-contacts", "/api/client-contacts"),
    ("services", "/api/services"),
    ("services-booked", "/api/services-booked"),
    ("delete-requests", "/api/delete-requests"),
    ("protected", "/api/protected"),
];

/// Build the `/api` router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/clients", clients::router())
        .nest("/admins", staff::router::<Admin>())
        .nest("/subAdmins", staff::router::<SubAdmin>())
        .nest("/cases", cases::router())
        .nest("/queries", queries::queries_router())
        .nest("/query-answers", queries::answers_router())
        .nest("/services", catalog::services_router())
        .nest("/services-booked", catalog::bookings_router())
        .nest("/ratings-reviews", ratings::ratings_reviews::router())
        .nest("/ratings", ratings::ratings::router())
        .nest("/reviews", ratings::reviews::router())
        .nest("/support", support::router())
        .nest("/blogs", content::blogs::router())
        .nest("/news", content::news::router())
        .nest("/notifications", content::notifications::router())
        .nest("/delete-requests", delete_requests::router())
        .nest("/client-contacts", client_contacts::router())
        .route("/protected", get(protected))
}

/// Build the complete router with middleware.
///
/// `cors_origin` is `*` to mirror any request origin, or a comma-separated
/// list of allowed origins. A trailing slash is trimmed before routing, so
/// `/api/users/` reaches the same handler as `/api/users`.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(cors_origin))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let app = Router::new()
        .route("/", get(root))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .nest("/api", build_api_router())
        .fallback(route_not_found)
        .layer(axum_middleware::from_fn(middleware::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Outermost: counts every request, including rejected ones
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state);

    Router::new().fallback_service(NormalizePath::trim_trailing_slash(app))
}

fn allow_origin(cors_origin: &str) -> AllowOrigin {
    if cors_origin.trim() == "*" {
        return AllowOrigin::mirror_request();
    }

    let origins: Vec<HeaderValue> = cors_origin
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins)
    }
}

/// GET /
async fn root() -> Json<Value> {
    let endpoints: serde_json::Map<String, Value> = ENDPOINTS
        .iter()
        .map(|(name, path)| (name.to_string(), Value::from(*path)))
        .collect();
    Json(json!({
        "message": "Legal Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "documentation": "/api-docs",
        "endpoints": endpoints,
    }))
}

/// GET /api/protected
async fn protected() -> Json<Value> {
    Json(json!({
        "message": "Unprotected endpoint — use /api/auth/me for protected info."
    }))
}

async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    ApiError::not_found(format!("Route {} {} not found", method, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use axum::http::HeaderName;
    use axum_test::TestServer;

    async fn server() -> TestServer {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let state = AppState::new(SqlxDocumentStore::shared(pool), &AuthConfig::default());
        TestServer::new(build_router(state, "*")).expect("Failed to start test server")
    }

    fn forwarded_for(ip: &'static str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static(ip),
        )
    }

    fn new_case(created_by: &str) -> Value {
        json!({
            "createdById": created_by,
            "caseNumber": "CS-101/2024",
            "caseTypeAndRegistration": "Civil Suit",
            "partitionarName": "R. Sharma",
            "respondentName": "M. Verma",
            "courtName": "District Court, Pune",
            "judgeName": "A. Kulkarni",
            "judgePost": "Civil Judge",
            "purpose": "Evidence",
            "nextHearingDate": "2099-01-15"
        })
    }

    #[tokio::test]
    async fn test_root_metadata() {
        let server = server().await;
        let response = server.get("/").await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["message"], "Legal Backend API");
        assert_eq!(body["documentation"], "/api-docs");
        assert_eq!(body["endpoints"]["query-answers"], "/api/query-answers");
        assert_eq!(body["endpoints"].as_object().unwrap().len(), ENDPOINTS.len());
    }

    #[tokio::test]
    async fn test_favicon_and_protected() {
        let server = server().await;
        server
            .get("/favicon.ico")
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let body: Value = server.get("/api/protected").await.json();
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Unprotected endpoint"));
    }

    #[tokio::test]
    async fn test_unknown_route_envelope() {
        let server = server().await;
        let response = server.get("/api/nothing-here").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(
            body,
            json!({"success": false, "error": "Route GET /api/nothing-here not found"})
        );
    }

    #[tokio::test]
    async fn test_trailing_slash_routes_like_bare_path() {
        let server = server().await;
        server
            .post("/api/users/")
            .json(&json!({"email": "slash@law.in"}))
            .await
            .assert_status(StatusCode::CREATED);

        let listed: Value = server.get("/api/users/").await.json();
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);

        let root: Value = server.get("/").await.json();
        assert_eq!(root["message"], "Legal Backend API");
    }

    #[tokio::test]
    async fn test_bad_query_string_uses_envelope() {
        let server = server().await;
        let response = server
            .get("/api/cases")
            .add_query_param("limit", "1")
            .add_query_param("limit", "2")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("limit"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let server = server().await;
        let response = server
            .post("/api/cases")
            .content_type("application/json")
            .bytes("{not json".into())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_client_signup_login_me() {
        let server = server().await;

        let response = server
            .post("/api/clients")
            .json(&json!({"name": "Asha Rao", "email": " Asha@Example.com ", "password": "secret1"}))
            .await;
        response.assert_status(StatusCode::OK);
        let cookie = response.header(header::SET_COOKIE);
        assert!(cookie.to_str().unwrap().starts_with("token="));
        let body: Value = response.json();
        assert_eq!(body["data"]["email"], "asha@example.com");
        assert!(body["data"].get("hashedPassword").is_none());

        let duplicate = server
            .post("/api/clients")
            .json(&json!({"fullName": "Other", "email": "asha@example.com", "password": "secret1"}))
            .await;
        duplicate.assert_status(StatusCode::CONFLICT);

        let bad = server
            .post("/api/clients/login")
            .json(&json!({"email": "asha@example.com", "password": "wrong-pass"}))
            .await;
        bad.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(bad.json::<Value>()["error"], "invalid credentials");

        let login: Value = server
            .post("/api/clients/login")
            .json(&json!({"email": "asha@example.com", "password": "secret1"}))
            .await
            .json();
        let token = login["token"].as_str().unwrap().to_string();

        let me: Value = server
            .get("/api/clients/me")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(me["data"]["firstName"], "Asha");
        assert_eq!(me["data"]["lastName"], "Rao");
        assert_eq!(me["data"]["role"], "client");

        let anonymous = server.get("/api/clients/me").await;
        anonymous.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(anonymous.json::<Value>()["error"], "Unauthorized");

        let forged = server
            .get("/api/clients/me")
            .authorization_bearer("not.a.token")
            .await;
        assert_eq!(forged.json::<Value>()["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn test_sub_admin_login_and_me() {
        let server = server().await;
        let created = server
            .post("/api/subAdmins")
            .json(&json!({
                "name": "Priya",
                "email": "priya@firm.in",
                "password": "pa55word",
                "role": "Moderator",
                "allowedTabs": ["Cases", "News"]
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        assert!(created.json::<Value>()["data"].get("password").is_none());

        let login: Value = server
            .post("/api/subAdmins/login")
            .json(&json!({"email": "priya@firm.in", "password": "pa55word"}))
            .await
            .json();
        assert_eq!(login["data"]["allowedTabs"], json!(["Cases", "News"]));
        let token = login["token"].as_str().unwrap().to_string();

        let me: Value = server
            .get("/api/auth/me")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(me["data"]["role"], "subAdmin");
        assert_eq!(me["data"]["email"], "priya@firm.in");
        assert_eq!(me["data"]["allowedTabs"], json!(["Cases", "News"]));

        let bad_tabs = server
            .post("/api/subAdmins")
            .json(&json!({
                "name": "X",
                "email": "x@firm.in",
                "password": "pa55word",
                "role": "Moderator",
                "allowedTabs": ["Cases", "Billing"]
            }))
            .await;
        bad_tabs.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_client_token_cannot_use_staff_me() {
        let server = server().await;
        let signup: Value = server
            .post("/api/clients")
            .json(&json!({"fullName": "Ravi", "email": "ravi@example.com", "password": "secret1"}))
            .await
            .json();
        let token = signup["token"].as_str().unwrap().to_string();

        let response = server
            .get("/api/auth/me")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"], "Invalid role");
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let server = server().await;
        let response = server.post("/api/auth/logout").await;
        response.assert_status(StatusCode::OK);
        let cookie = response.header(header::SET_COOKIE);
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
        assert_eq!(response.json::<Value>()["message"], "Logged out successfully");
    }

    #[tokio::test]
    async fn test_failed_logins_are_rate_limited_per_email() {
        let server = server().await;
        server
            .post("/api/admins")
            .json(&json!({"name": "Root", "email": "root@firm.in", "password": "correct"}))
            .await
            .assert_status(StatusCode::CREATED);

        for _ in 0..5 {
            server
                .post("/api/admins/login")
                .json(&json!({"email": "root@firm.in", "password": "wrong"}))
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }

        let limited = server
            .post("/api/admins/login")
            .json(&json!({"email": "root@firm.in", "password": "correct"}))
            .await;
        limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            limited.json::<Value>()["error"],
            "Too many login attempts, please try again later"
        );
    }

    #[tokio::test]
    async fn test_login_requests_are_rate_limited_per_ip() {
        let server = server().await;
        for i in 0..10 {
            let (name, value) = forwarded_for("203.0.113.9");
            server
                .post("/api/clients/login")
                .add_header(name, value)
                .json(&json!({"email": format!("user{}@example.com", i), "password": "x"}))
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }

        let (name, value) = forwarded_for("203.0.113.9");
        server
            .post("/api/clients/login")
            .add_header(name, value)
            .json(&json!({"email": "fresh@example.com", "password": "x"}))
            .await
            .assert_status(StatusCode::TOO_MANY_REQUESTS);

        let (name, value) = forwarded_for("198.51.100.1");
        server
            .post("/api/clients/login")
            .add_header(name, value)
            .json(&json!({"email": "fresh@example.com", "password": "x"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_case_lifecycle() {
        let server = server().await;

        let missing = server
            .post("/api/cases")
            .json(&json!({"createdById": "lawyer-1"}))
            .await;
        missing.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(missing.json::<Value>()["error"], "caseNumber is required");

        let created = server.post("/api/cases").json(&new_case("lawyer-1")).await;
        created.assert_status(StatusCode::CREATED);
        let created: Value = created.json();
        assert_eq!(created["message"], "Case created successfully");
        assert_eq!(created["data"]["status"], "OPEN");
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let mine: Value = server
            .get("/api/cases/user/lawyer-1")
            .add_query_param("status", "open")
            .await
            .json();
        assert_eq!(mine["count"], 1);

        let upcoming: Value = server.get("/api/cases/hearings/upcoming").await.json();
        assert_eq!(upcoming["count"], 1);

        let updated: Value = server
            .put(&format!("/api/cases/{}", id))
            .json(&json!({"status": "CLOSED"}))
            .await
            .json();
        assert_eq!(updated["data"]["status"], "CLOSED");

        let invalid = server.get("/api/cases/status/pending").await;
        invalid.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            invalid.json::<Value>()["error"],
            "Invalid status. Must be OPEN, CLOSED, or ADJOURNED"
        );

        let cleared: Value = server.delete("/api/cases").await.json();
        assert_eq!(cleared, json!({"success": true, "deleted": 1}));

        server
            .get(&format!("/api/cases/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_query_answers_count() {
        let server = server().await;
        let query: Value = server
            .post("/api/queries")
            .json(&json!({"title": "Bail in NDPS?", "askedById": "client-1"}))
            .await
            .json();
        let query_id = query["data"]["id"].as_str().unwrap().to_string();

        let answer = server
            .post("/api/query-answers")
            .json(&json!({
                "queryId": query_id,
                "userId": "lawyer-1",
                "userType": "lawyer",
                "userName": "Adv. Mehta",
                "answer": "Depends on quantity."
            }))
            .await;
        answer.assert_status(StatusCode::CREATED);
        assert_eq!(answer.json::<Value>()["data"]["userType"], "LAWYER");

        let fetched: Value = server
            .get(&format!("/api/queries/{}", query_id))
            .await
            .json();
        assert_eq!(fetched["data"]["answersCount"], 1);

        let listed: Value = server
            .get(&format!("/api/query-answers/query/{}", query_id))
            .await
            .json();
        assert_eq!(listed["count"], 1);
    }

    #[tokio::test]
    async fn test_support_answer_and_status() {
        let server = server().await;
        let ticket: Value = server
            .post("/api/support")
            .json(&json!({
                "userId": "client-1",
                "userType": "client",
                "purpose": "Billing",
                "category": "Payments",
                "title": "Refund",
                "description": "Charged twice"
            }))
            .await
            .json();
        let id = ticket["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(ticket["data"]["status"], "PENDING");

        let rejected = server
            .post(&format!("/api/support/{}/answer", id))
            .json(&json!({"answer": "Done", "answeredBy": "u1", "answeredByType": "CLIENT"}))
            .await;
        rejected.assert_status(StatusCode::BAD_REQUEST);

        let answered: Value = server
            .post(&format!("/api/support/{}/answer", id))
            .json(&json!({"answer": " Refunded ", "answeredBy": "admin-1", "answeredByType": "admin"}))
            .await
            .json();
        assert_eq!(answered["message"], "Answer added successfully");
        assert_eq!(answered["data"]["answers"][0]["answer"], "Refunded");

        let patched: Value = server
            .patch(&format!("/api/support/{}/status", id))
            .json(&json!({"status": "resolved"}))
            .await
            .json();
        assert_eq!(patched["data"]["status"], "RESOLVED");

        server
            .patch("/api/support/missing/status")
            .json(&json!({"status": "CLOSED"}))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_news_view_increment() {
        let server = server().await;
        let news: Value = server
            .post("/api/news")
            .json(&json!({"title": "New bench", "imageUrl": "https://img.example/b.png", "views": 2.7}))
            .await
            .json();
        let id = news["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(news["data"]["views"], 2);

        let bumped: Value = server
            .post(&format!("/api/news/{}/views/increment", id))
            .await
            .json();
        assert_eq!(bumped["data"]["views"], 3);

        server
            .post("/api/news/missing/views/increment")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_client_contact_refresh() {
        let server = server().await;
        let body = json!({"clientId": "c1", "lawyerId": "l1"});

        let first = server.post("/api/client-contacts").json(&body).await;
        first.assert_status(StatusCode::CREATED);
        assert_eq!(first.json::<Value>()["data"]["status"], "initiated");

        let second = server.post("/api/client-contacts").json(&body).await;
        second.assert_status(StatusCode::OK);
        let second: Value = second.json();
        assert_eq!(second["message"], "Contact record updated");
        assert_eq!(second["data"]["status"], "initiated");

        let listed: Value = server.get("/api/client-contacts/client/c1").await.json();
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
        assert_eq!(listed["data"][0]["status"], "responded");
    }

    #[tokio::test]
    async fn test_feedback_duplicate_and_stats() {
        let server = server().await;
        let body = json!({"userId": "l1", "clientId": "c1", "rating": 4});
        server
            .post("/api/ratings")
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let duplicate = server.post("/api/ratings").json(&body).await;
        duplicate.assert_status(StatusCode::CONFLICT);
        assert_eq!(
            duplicate.json::<Value>()["error"],
            "You have already rated this user"
        );

        let stats: Value = server.get("/api/ratings/user/l1/stats").await.json();
        assert_eq!(stats["data"]["averageRating"], 4.0);
        assert_eq!(stats["data"]["ratingCount"], 1);
        assert_eq!(stats["data"]["userId"], "l1");
    }

    #[tokio::test]
    async fn test_user_profile_accepts_loosely_typed_fields() {
        let server = server().await;
        let created = server
            .post("/api/users")
            .json(&json!({
                "email": "b@x.com",
                "bio": null,
                "isActive": "true",
                "isVerify": "no",
                "city": 42,
                "travelPreference": "none"
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let created: Value = created.json();
        assert_eq!(created["data"]["bio"], "");
        assert_eq!(created["data"]["isActive"], true);
        assert!(created["data"]["isVerify"].is_null());
        assert_eq!(created["data"]["city"], "42");
        assert!(created["data"]["travelPreference"].is_null());

        let id = created["data"]["id"].as_str().unwrap().to_string();
        server
            .put(&format!("/api/users/{}", id))
            .json(&json!({"email": "b@x.com", "bio": null, "isOnline": "false"}))
            .await
            .assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_user_directory_filters() {
        let server = server().await;
        server
            .post("/api/users")
            .json(&json!({"email": "a@law.in", "fullName": "Anil", "courts": ["High Court"], "languages": ["Hindi"]}))
            .await
            .assert_status(StatusCode::CREATED);

        let combined = server
            .get("/api/users")
            .add_query_param("court", "High Court")
            .add_query_param("language", "Hindi")
            .await;
        combined.assert_status(StatusCode::BAD_REQUEST);

        let found: Value = server
            .get("/api/users")
            .add_query_param("search", "anil")
            .await
            .json();
        assert_eq!(found["data"].as_array().unwrap().len(), 1);
    }
}
