//! Staff account endpoints
//!
//! The same routes are mounted at `/api/admins` and `/api/subAdmins`:
//! - POST / - Create an account
//! - POST /login - Sign in and receive a token
//! - GET / - Paginated listing
//! - GET /{id}, PUT /{id}, DELETE /{id}
//! - DELETE / - Delete every account

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};

use crate::api::auth::staff_login;
use crate::api::common::ListParams;
use crate::api::middleware::{ApiResult, AppState, ClientIp, JsonBody, Path, Query};
use crate::api::responses::ApiResponse;
use crate::models::{Admin, SubAdmin};
use crate::services::{LoginInput, StaffAccount, StaffInput, StaffService};

/// Picks the staff service an account type lives in
pub trait StaffRoutes: StaffAccount {
    fn service(state: &AppState) -> &StaffService<Self>;
}

impl StaffRoutes for Admin {
    fn service(state: &AppState) -> &StaffService<Self> {
        &state.admins
    }
}

impl StaffRoutes for SubAdmin {
    fn service(state: &AppState) -> &StaffService<Self> {
        &state.sub_admins
    }
}

pub fn router<T: StaffRoutes>() -> Router<AppState> {
    Router::new()
        .route("/", post(create::<T>).get(list::<T>).delete(delete_all::<T>))
        .route("/login", post(login::<T>))
        .route(
            "/{id}",
            get(get_one::<T>).put(replace::<T>).delete(delete_one::<T>),
        )
}

async fn create<T: StaffRoutes>(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<StaffInput>,
) -> ApiResult<(StatusCode, ApiResponse<T::View>)> {
    let account = T::service(&state).create(&input).await?;
    Ok(ApiResponse::data(account.view()).created())
}

async fn login<T: StaffRoutes>(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    JsonBody(input): JsonBody<LoginInput>,
) -> ApiResult<(HeaderMap, ApiResponse<T::View>)> {
    let attempt = T::service(&state).login(&input);
    staff_login(&state, ip, &input, attempt).await
}

async fn list<T: StaffRoutes>(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Vec<T::View>>> {
    let accounts = T::service(&state).list(&params.page()).await?;
    Ok(ApiResponse::data(accounts.iter().map(T::view).collect()))
}

async fn get_one<T: StaffRoutes>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<T::View>> {
    let account = T::service(&state).get(&id).await?;
    Ok(ApiResponse::data(account.view()))
}

async fn replace<T: StaffRoutes>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<StaffInput>,
) -> ApiResult<ApiResponse<T::View>> {
    let account = T::service(&state).replace(&id, &input).await?;
    Ok(ApiResponse::data(account.view()))
}

async fn delete_one<T: StaffRoutes>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    T::service(&state).delete(&id).await?;
    Ok(ApiResponse::ok())
}

async fn delete_all<T: StaffRoutes>(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<()>> {
    let deleted = T::service(&state).delete_all().await?;
    tracing::warn!("Deleted all {} {} accounts", deleted, T::ROLE);
    Ok(ApiResponse::deleted(deleted))
}
