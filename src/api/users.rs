//! Lawyer directory endpoints (`/api/users`)
//!
//! `GET /` combines store-side filters (court, city, specialization,
//! language, profileType, verified) with in-memory ones (exp, category,
//! search).

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};

use crate::api::common::ListParams;
use crate::api::middleware::{ApiResult, AppState, JsonBody, Path, Query};
use crate::api::responses::ApiResponse;
use crate::models::User;
use crate::services::UserFilter;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list).delete(delete_all))
        .route("/{id}", get(get_one).put(replace).delete(delete_one))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(user): JsonBody<User>,
) -> ApiResult<(StatusCode, ApiResponse<User>)> {
    let user = state.users.create(user).await?;
    Ok(ApiResponse::data(user).created())
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<UserFilter>,
) -> ApiResult<ApiResponse<Vec<User>>> {
    let users = state.users.list(&filter, &params.page()).await?;
    Ok(ApiResponse::data(users))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<User>> {
    Ok(ApiResponse::data(state.users.get(&id).await?))
}

async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(user): JsonBody<User>,
) -> ApiResult<ApiResponse<User>> {
    Ok(ApiResponse::data(state.users.replace(&id, user).await?))
}

async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    state.users.delete(&id).await?;
    Ok(ApiResponse::ok())
}

async fn delete_all(State(state): State<AppState>) -> ApiResult<ApiResponse<()>> {
    let deleted = state.users.delete_all().await?;
    tracing::warn!("Deleted all {} user profiles", deleted);
    Ok(ApiResponse::deleted(deleted))
}
