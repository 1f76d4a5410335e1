//! Case endpoints (`/api/cases`)
//!
//! Besides CRUD, cases can be listed per creator, per status, by upcoming
//! hearing and by overdue reminder. Those listings also report `count`.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};

use crate::api::common::{ListParams, StatusParams};
use crate::api::middleware::{ApiResult, AppState, JsonBody, Path, Query};
use crate::api::responses::ApiResponse;
use crate::models::Case;
use crate::services::CaseInput;

/// Default page size for the upcoming-hearings listing
const HEARINGS_DEFAULT_LIMIT: usize = 20;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list).delete(delete_all))
        .route("/user/{created_by_id}", get(by_creator))
        .route("/status/{status}", get(by_status))
        .route("/hearings/upcoming", get(upcoming_hearings))
        .route("/reminders/overdue", get(overdue_reminders))
        .route("/{id}", get(get_one).put(update).delete(delete_one))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CaseInput>,
) -> ApiResult<(StatusCode, ApiResponse<Case>)> {
    let case = state.cases.create(input).await?;
    Ok(ApiResponse::data(case)
        .with_message("Case created successfully")
        .created())
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Vec<Case>>> {
    Ok(ApiResponse::data(state.cases.list(&params.page()).await?))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Case>> {
    Ok(ApiResponse::data(state.cases.get(&id).await?))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CaseInput>,
) -> ApiResult<ApiResponse<Case>> {
    let case = state.cases.update(&id, input).await?;
    Ok(ApiResponse::data(case).with_message("Case updated successfully"))
}

async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    state.cases.delete(&id).await?;
    Ok(ApiResponse::message("Case deleted successfully"))
}

async fn delete_all(State(state): State<AppState>) -> ApiResult<ApiResponse<()>> {
    let deleted = state.cases.delete_all().await?;
    tracing::warn!("Deleted all {} cases", deleted);
    Ok(ApiResponse::deleted(deleted))
}

/// GET /api/cases/user/{createdById}?status=&limit=
async fn by_creator(
    State(state): State<AppState>,
    Path(created_by_id): Path<String>,
    Query(params): Query<StatusParams>,
) -> ApiResult<ApiResponse<Vec<Case>>> {
    let cases = state
        .cases
        .by_creator(&created_by_id, params.status.as_deref(), params.limit())
        .await?;
    Ok(ApiResponse::counted(cases))
}

/// GET /api/cases/status/{status}?limit=
async fn by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Vec<Case>>> {
    let cases = state.cases.by_status(&status, params.page().limit).await?;
    Ok(ApiResponse::counted(cases))
}

/// GET /api/cases/hearings/upcoming?limit=
async fn upcoming_hearings(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Vec<Case>>> {
    let limit = params.limit_or(HEARINGS_DEFAULT_LIMIT);
    let cases = state.cases.upcoming_hearings(limit).await?;
    Ok(ApiResponse::counted(cases))
}

/// GET /api/cases/reminders/overdue
async fn overdue_reminders(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<Case>>> {
    Ok(ApiResponse::counted(state.cases.overdue_reminders().await?))
}
