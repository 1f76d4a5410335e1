//! Legal question endpoints
//!
//! - `/api/queries`: questions; `answersCount` is recomputed on every read
//! - `/api/query-answers`: answers to those questions

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};

use crate::api::common::ListParams;
use crate::api::middleware::{ApiResult, AppState, JsonBody, Path, Query};
use crate::api::responses::ApiResponse;
use crate::models::{QueryAnswer, UserQuery};
use crate::services::{AnswerFilter, AnswerInput, QueryInput};

pub fn queries_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_query).get(list_queries).delete(delete_all_queries))
        .route("/user/{user_id}", get(queries_by_user))
        .route(
            "/{id}",
            get(get_query).put(replace_query).delete(delete_query),
        )
}

pub fn answers_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_answer).get(list_answers).delete(delete_all_answers))
        .route("/query/{query_id}", get(answers_for_query))
        .route("/user/{user_id}", get(answers_by_user))
        .route(
            "/{id}",
            get(get_answer).put(replace_answer).delete(delete_answer),
        )
}

// ============================================================================
// Queries
// ============================================================================

async fn create_query(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<QueryInput>,
) -> ApiResult<(StatusCode, ApiResponse<UserQuery>)> {
    Ok(ApiResponse::data(state.queries.create(input).await?).created())
}

async fn list_queries(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Vec<UserQuery>>> {
    Ok(ApiResponse::data(state.queries.list(&params.page()).await?))
}

async fn queries_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<UserQuery>>> {
    Ok(ApiResponse::data(state.queries.by_asker(&user_id).await?))
}

async fn get_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<UserQuery>> {
    Ok(ApiResponse::data(state.queries.get(&id).await?))
}

async fn replace_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<QueryInput>,
) -> ApiResult<ApiResponse<UserQuery>> {
    Ok(ApiResponse::data(state.queries.replace(&id, input).await?))
}

async fn delete_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    state.queries.delete(&id).await?;
    Ok(ApiResponse::ok())
}

async fn delete_all_queries(State(state): State<AppState>) -> ApiResult<ApiResponse<()>> {
    let deleted = state.queries.delete_all().await?;
    tracing::warn!("Deleted all {} queries", deleted);
    Ok(ApiResponse::deleted(deleted))
}

// ============================================================================
// Answers
// ============================================================================

async fn create_answer(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<AnswerInput>,
) -> ApiResult<(StatusCode, ApiResponse<QueryAnswer>)> {
    let answer = state.queries.create_answer(input).await?;
    Ok(ApiResponse::data(answer)
        .with_message("Query answer created successfully")
        .created())
}

async fn list_answers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<AnswerFilter>,
) -> ApiResult<ApiResponse<Vec<QueryAnswer>>> {
    let answers = state.queries.list_answers(filter, &params.page()).await?;
    Ok(ApiResponse::data(answers))
}

async fn answers_for_query(
    State(state): State<AppState>,
    Path(query_id): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Vec<QueryAnswer>>> {
    let answers = state
        .queries
        .answers_for(&query_id, params.page().limit)
        .await?;
    Ok(ApiResponse::counted(answers))
}

async fn answers_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Vec<QueryAnswer>>> {
    let answers = state
        .queries
        .answers_by(&user_id, params.page().limit)
        .await?;
    Ok(ApiResponse::counted(answers))
}

async fn get_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<QueryAnswer>> {
    Ok(ApiResponse::data(state.queries.get_answer(&id).await?))
}

async fn replace_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<AnswerInput>,
) -> ApiResult<ApiResponse<QueryAnswer>> {
    let answer = state.queries.replace_answer(&id, input).await?;
    Ok(ApiResponse::data(answer).with_message("Query answer updated successfully"))
}

async fn delete_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    state.queries.delete_answer(&id).await?;
    Ok(ApiResponse::message("Query answer deleted successfully"))
}

async fn delete_all_answers(State(state): State<AppState>) -> ApiResult<ApiResponse<()>> {
    let deleted = state.queries.delete_all_answers().await?;
    tracing::warn!("Deleted all {} query answers", deleted);
    Ok(ApiResponse::deleted(deleted))
}
