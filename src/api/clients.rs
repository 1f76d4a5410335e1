//! Client account endpoints (`/api/clients`)
//!
//! Signup and login both answer with the public client view plus a token,
//! and set the session cookie.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Router,
};

use crate::api::auth::{issue_session, limited_login, logout};
use crate::api::middleware::{
    ApiError, ApiResult, AppState, Authenticated, ClientIp, JsonBody, Path,
};
use crate::api::responses::{ApiResponse, DeletedResponse, IdResponse};
use crate::models::{ClientIdentity, ClientView, Role};
use crate::services::{ClientUpdate, LoginInput, SignupInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(signup).get(list).delete(delete_all))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/{id}", get(get_one).put(update).delete(delete_one))
}

/// POST /api/clients
async fn signup(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<SignupInput>,
) -> ApiResult<(HeaderMap, ApiResponse<ClientView>)> {
    let client = state.clients.signup(input).await?;
    let (token, cookie) = issue_session(&state, &client.id, &client.email, Role::Client, None)?;
    Ok((cookie, ApiResponse::data(ClientView::from(&client)).with_token(token)))
}

/// POST /api/clients/login
async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    JsonBody(input): JsonBody<LoginInput>,
) -> ApiResult<(HeaderMap, ApiResponse<ClientView>)> {
    let client = limited_login(&state, ip, &input, state.clients.login(&input)).await?;
    let (token, cookie) = issue_session(&state, &client.id, &client.email, Role::Client, None)?;
    tracing::info!("Client {} logged in", client.id);
    Ok((cookie, ApiResponse::data(ClientView::from(&client)).with_token(token)))
}

/// GET /api/clients/me
async fn me(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
) -> ApiResult<ApiResponse<ClientIdentity>> {
    let client = state
        .clients
        .find_by_email(&claims.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Client not found"))?;
    Ok(ApiResponse::data(ClientIdentity::from(&client)))
}

async fn list(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<ClientView>>> {
    let clients = state.clients.list().await?;
    Ok(ApiResponse::data(clients.iter().map(ClientView::from).collect()))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<ClientView>> {
    let client = state.clients.get(&id).await?;
    Ok(ApiResponse::data(ClientView::from(&client)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ClientUpdate>,
) -> ApiResult<ApiResponse<ClientView>> {
    let client = state.clients.update(&id, input).await?;
    Ok(ApiResponse::data(ClientView::from(&client)))
}

async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<IdResponse>> {
    state.clients.delete(&id).await?;
    Ok(ApiResponse::data(IdResponse { id }))
}

async fn delete_all(State(state): State<AppState>) -> ApiResult<ApiResponse<DeletedResponse>> {
    let deleted = state.clients.delete_all().await?;
    tracing::warn!("Deleted all {} clients", deleted);
    Ok(ApiResponse::data(DeletedResponse { deleted }))
}
