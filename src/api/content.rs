//! Published content endpoints
//!
//! - `/api/blogs`
//! - `/api/news`, plus `POST /{id}/views/increment`
//! - `/api/notifications`
//!
//! Listings are newest first and filter on the flags each type carries.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};

use crate::api::common::ListParams;
use crate::api::middleware::{ApiResult, AppState, JsonBody, Path, Query};
use crate::api::responses::ApiResponse;
use crate::models::{Blog, News, Notification};
use crate::services::{BlogInput, ContentFilter, NewsInput, NotificationInput};

macro_rules! content_routes {
    ($service:ident, $doc:ty, $input:ty, $label:literal) => {
        async fn create(
            State(state): State<AppState>,
            JsonBody(input): JsonBody<$input>,
        ) -> ApiResult<(StatusCode, ApiResponse<$doc>)> {
            Ok(ApiResponse::data(state.$service.create(input).await?).created())
        }

        async fn list(
            State(state): State<AppState>,
            Query(params): Query<ListParams>,
            Query(filter): Query<ContentFilter>,
        ) -> ApiResult<ApiResponse<Vec<$doc>>> {
            Ok(ApiResponse::data(state.$service.list(filter, &params.page()).await?))
        }

        async fn get_one(
            State(state): State<AppState>,
            Path(id): Path<String>,
        ) -> ApiResult<ApiResponse<$doc>> {
            Ok(ApiResponse::data(state.$service.get(&id).await?))
        }

        async fn replace(
            State(state): State<AppState>,
            Path(id): Path<String>,
            JsonBody(input): JsonBody<$input>,
        ) -> ApiResult<ApiResponse<$doc>> {
            Ok(ApiResponse::data(state.$service.replace(&id, input).await?))
        }

        async fn delete_one(
            State(state): State<AppState>,
            Path(id): Path<String>,
        ) -> ApiResult<ApiResponse<()>> {
            state.$service.delete(&id).await?;
            Ok(ApiResponse::ok())
        }

        async fn delete_all(State(state): State<AppState>) -> ApiResult<ApiResponse<()>> {
            let deleted = state.$service.delete_all().await?;
            tracing::warn!("Deleted all {} {}", deleted, $label);
            Ok(ApiResponse::deleted(deleted))
        }

        fn crud() -> Router<AppState> {
            Router::new()
                .route("/", post(create).get(list).delete(delete_all))
                .route("/{id}", get(get_one).put(replace).delete(delete_one))
        }
    };
}

pub mod blogs {
    use super::*;

    content_routes!(blogs, Blog, BlogInput, "blogs");

    pub fn router() -> Router<AppState> {
        crud()
    }
}

pub mod news {
    use super::*;

    content_routes!(news, News, NewsInput, "news posts");

    pub fn router() -> Router<AppState> {
        crud().route("/{id}/views/increment", post(increment_views))
    }

    /// POST /api/news/{id}/views/increment
    async fn increment_views(
        State(state): State<AppState>,
        Path(id): Path<String>,
    ) -> ApiResult<ApiResponse<News>> {
        Ok(ApiResponse::data(state.news.increment_views(&id).await?))
    }
}

pub mod notifications {
    use super::*;

    content_routes!(notifications, Notification, NotificationInput, "notifications");

    pub fn router() -> Router<AppState> {
        crud()
    }
}
