//! Account deletion request endpoints (`/api/delete-requests`)

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;

use crate::api::common::ListParams;
use crate::api::middleware::{ApiResult, AppState, JsonBody, Path, Query};
use crate::api::responses::ApiResponse;
use crate::models::DeleteRequest;
use crate::services::{DeleteRequestInput, ReviewDecision};

#[derive(Debug, Default, Deserialize)]
struct StatusQuery {
    status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list).delete(delete_all))
        .route("/user/{user_id}", get(by_user))
        .route("/status/{status}", get(by_status))
        .route("/{id}", get(get_one).put(replace).delete(delete_one))
        .route("/{id}/review", patch(review))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<DeleteRequestInput>,
) -> ApiResult<(StatusCode, ApiResponse<DeleteRequest>)> {
    Ok(ApiResponse::data(state.delete_requests.create(input).await?).created())
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<ApiResponse<Vec<DeleteRequest>>> {
    let requests = state
        .delete_requests
        .list(query.status, &params.page())
        .await?;
    Ok(ApiResponse::data(requests))
}

async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<DeleteRequest>>> {
    Ok(ApiResponse::data(state.delete_requests.by_user(&user_id).await?))
}

async fn by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> ApiResult<ApiResponse<Vec<DeleteRequest>>> {
    Ok(ApiResponse::data(state.delete_requests.by_status(&status).await?))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<DeleteRequest>> {
    Ok(ApiResponse::data(state.delete_requests.get(&id).await?))
}

async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<DeleteRequestInput>,
) -> ApiResult<ApiResponse<DeleteRequest>> {
    Ok(ApiResponse::data(state.delete_requests.replace(&id, input).await?))
}

/// PATCH /api/delete-requests/{id}/review
async fn review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(decision): JsonBody<ReviewDecision>,
) -> ApiResult<ApiResponse<DeleteRequest>> {
    let request = state.delete_requests.review(&id, decision).await?;
    tracing::info!("Delete request {} reviewed: {}", request.id, request.status);
    Ok(ApiResponse::data(request))
}

async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    state.delete_requests.delete(&id).await?;
    Ok(ApiResponse::ok())
}

async fn delete_all(State(state): State<AppState>) -> ApiResult<ApiResponse<()>> {
    let deleted = state.delete_requests.delete_all().await?;
    tracing::warn!("Deleted all {} delete requests", deleted);
    Ok(ApiResponse::deleted(deleted))
}
