//! Service catalog endpoints
//!
//! - `/api/services`: the legal services on offer
//! - `/api/services-booked`: bookings made by clients

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};

use crate::api::common::ListParams;
use crate::api::middleware::{ApiResult, AppState, JsonBody, Path, Query};
use crate::api::responses::{ApiResponse, IdResponse};
use crate::models::{Service, ServiceBooked};
use crate::services::{BookingInput, ServiceInput};

pub fn services_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_service).get(list_services).delete(delete_all_services))
        .route(
            "/{id}",
            get(get_service).put(replace_service).delete(delete_service),
        )
}

pub fn bookings_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings).delete(delete_all_bookings))
        .route("/client/{client_id}", get(bookings_for_client))
        .route(
            "/{id}",
            get(get_booking).put(replace_booking).delete(delete_booking),
        )
}

async fn create_service(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ServiceInput>,
) -> ApiResult<(StatusCode, ApiResponse<Service>)> {
    Ok(ApiResponse::data(state.catalog.create_service(input).await?).created())
}

async fn list_services(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Vec<Service>>> {
    let services = state.catalog.list_services(params.page().limit).await?;
    Ok(ApiResponse::data(services))
}

async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Service>> {
    Ok(ApiResponse::data(state.catalog.get_service(&id).await?))
}

async fn replace_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ServiceInput>,
) -> ApiResult<ApiResponse<Service>> {
    Ok(ApiResponse::data(state.catalog.replace_service(&id, input).await?))
}

async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<IdResponse>> {
    state.catalog.delete_service(&id).await?;
    Ok(ApiResponse::data(IdResponse { id }))
}

async fn delete_all_services(State(state): State<AppState>) -> ApiResult<ApiResponse<()>> {
    let deleted = state.catalog.delete_all_services().await?;
    tracing::warn!("Deleted all {} services", deleted);
    Ok(ApiResponse::deleted(deleted))
}

async fn create_booking(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<BookingInput>,
) -> ApiResult<(StatusCode, ApiResponse<ServiceBooked>)> {
    Ok(ApiResponse::data(state.catalog.create_booking(input).await?).created())
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Vec<ServiceBooked>>> {
    let bookings = state.catalog.list_bookings(params.page().limit).await?;
    Ok(ApiResponse::data(bookings))
}

async fn bookings_for_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<ServiceBooked>>> {
    Ok(ApiResponse::data(state.catalog.bookings_for(&client_id).await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<ServiceBooked>> {
    Ok(ApiResponse::data(state.catalog.get_booking(&id).await?))
}

async fn replace_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<BookingInput>,
) -> ApiResult<ApiResponse<ServiceBooked>> {
    Ok(ApiResponse::data(state.catalog.replace_booking(&id, input).await?))
}

async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<IdResponse>> {
    state.catalog.delete_booking(&id).await?;
    Ok(ApiResponse::data(IdResponse { id }))
}

async fn delete_all_bookings(State(state): State<AppState>) -> ApiResult<ApiResponse<()>> {
    let deleted = state.catalog.delete_all_bookings().await?;
    tracing::warn!("Deleted all {} service bookings", deleted);
    Ok(ApiResponse::deleted(deleted))
}
