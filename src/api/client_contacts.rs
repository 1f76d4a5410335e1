//! Client to lawyer contact endpoints (`/api/client-contacts`)
//!
//! `POST /` is idempotent per (client, lawyer) pair: a repeat contact
//! refreshes the existing record instead of creating another.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiResult, AppState, JsonBody, Path};
use crate::api::responses::ApiResponse;
use crate::models::{lenient, ClientContact};
use crate::services::{ContactInput, Recorded};

#[derive(Debug, Default, Deserialize)]
struct StatusBody {
    #[serde(default, deserialize_with = "lenient::text")]
    status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(record))
        .route("/client/{client_id}", get(for_client))
        .route("/lawyer/{lawyer_id}", get(for_lawyer))
        .route("/conversation/{conversation_id}", get(for_conversation))
        .route("/{id}", get(get_one).put(update))
        .route("/{id}/status", put(set_status))
}

/// POST /api/client-contacts
async fn record(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ContactInput>,
) -> ApiResult<(StatusCode, ApiResponse<ClientContact>)> {
    Ok(match state.client_contacts.record(input).await? {
        Recorded::Created(contact) => ApiResponse::data(contact).created(),
        Recorded::Refreshed(previous) => (
            StatusCode::OK,
            ApiResponse::data(previous).with_message("Contact record updated"),
        ),
    })
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<ClientContact>> {
    Ok(ApiResponse::data(state.client_contacts.get(&id).await?))
}

async fn for_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<ClientContact>>> {
    Ok(ApiResponse::data(state.client_contacts.for_client(&client_id).await?))
}

async fn for_lawyer(
    State(state): State<AppState>,
    Path(lawyer_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<ClientContact>>> {
    Ok(ApiResponse::data(state.client_contacts.for_lawyer(&lawyer_id).await?))
}

async fn for_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> ApiResult<ApiResponse<ClientContact>> {
    let contact = state
        .client_contacts
        .for_conversation(&conversation_id)
        .await?;
    Ok(ApiResponse::data(contact))
}

/// PUT /api/client-contacts/{id}/status
async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StatusBody>,
) -> ApiResult<ApiResponse<ClientContact>> {
    let contact = state
        .client_contacts
        .set_status(&id, body.status.as_deref())
        .await?;
    Ok(ApiResponse::data(contact))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ContactInput>,
) -> ApiResult<ApiResponse<ClientContact>> {
    Ok(ApiResponse::data(state.client_contacts.update(&id, input).await?))
}
