//! Support ticket endpoints (`/api/support`)
//!
//! Staff replies are appended with `POST /{id}/answer`, and the workflow
//! state moves with `PATCH /{id}/status`.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;

use crate::api::common::{ListParams, StatusParams};
use crate::api::middleware::{ApiResult, AppState, JsonBody, Path, Query};
use crate::api::responses::ApiResponse;
use crate::models::{lenient, Support};
use crate::services::{ReplyInput, SupportFilter, SupportInput};

/// Body of `PATCH /{id}/status`
#[derive(Debug, Default, Deserialize)]
struct StatusBody {
    #[serde(default, deserialize_with = "lenient::text")]
    status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list).delete(delete_all))
        .route("/user/{user_id}", get(by_user))
        .route("/status/{status}", get(by_status))
        .route("/{id}", get(get_one).put(replace).delete(delete_one))
        .route("/{id}/status", patch(set_status))
        .route("/{id}/answer", post(add_answer))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<SupportInput>,
) -> ApiResult<(StatusCode, ApiResponse<Support>)> {
    let ticket = state.support.create(input).await?;
    Ok(ApiResponse::data(ticket)
        .with_message("Support ticket created successfully")
        .created())
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<SupportFilter>,
) -> ApiResult<ApiResponse<Vec<Support>>> {
    Ok(ApiResponse::data(state.support.list(filter, &params.page()).await?))
}

async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<StatusParams>,
) -> ApiResult<ApiResponse<Vec<Support>>> {
    let tickets = state
        .support
        .by_user(&user_id, params.status.as_deref(), params.limit())
        .await?;
    Ok(ApiResponse::counted(tickets))
}

async fn by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Vec<Support>>> {
    let tickets = state.support.by_status(&status, params.page().limit).await?;
    Ok(ApiResponse::counted(tickets))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Support>> {
    Ok(ApiResponse::data(state.support.get(&id).await?))
}

async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<SupportInput>,
) -> ApiResult<ApiResponse<Support>> {
    let ticket = state.support.replace(&id, input).await?;
    Ok(ApiResponse::data(ticket).with_message("Support ticket updated successfully"))
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StatusBody>,
) -> ApiResult<ApiResponse<Support>> {
    let ticket = state.support.set_status(&id, body.status.as_deref()).await?;
    Ok(ApiResponse::data(ticket).with_message("Support ticket status updated successfully"))
}

async fn add_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ReplyInput>,
) -> ApiResult<ApiResponse<Support>> {
    let ticket = state.support.add_answer(&id, input).await?;
    Ok(ApiResponse::data(ticket).with_message("Answer added successfully"))
}

async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    state.support.delete(&id).await?;
    Ok(ApiResponse::message("Support ticket deleted successfully"))
}

async fn delete_all(State(state): State<AppState>) -> ApiResult<ApiResponse<()>> {
    let deleted = state.support.delete_all().await?;
    tracing::warn!("Deleted all {} support tickets", deleted);
    Ok(ApiResponse::deleted(deleted))
}
