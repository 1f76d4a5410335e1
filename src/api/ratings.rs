//! Lawyer feedback endpoints
//!
//! Three collections share one route layout:
//! - `/api/ratings-reviews`: combined rating and written review
//! - `/api/ratings`: star ratings only
//! - `/api/reviews`: written reviews only
//!
//! Each exposes CRUD, `GET /user/{userId}` and `GET /user/{userId}/stats`.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};

use crate::api::common::ListParams;
use crate::api::middleware::{ApiResult, AppState, JsonBody, Path, Query};
use crate::api::responses::{ApiResponse, IdResponse};
use crate::services::FeedbackInput;

macro_rules! feedback_routes {
    ($name:ident, $service:ident, $entry:ty, $stats:ty, $label:literal) => {
        pub mod $name {
            use super::*;

            pub fn router() -> Router<AppState> {
                Router::new()
                    .route("/", post(create).get(list).delete(delete_all))
                    .route("/user/{user_id}", get(for_user))
                    .route("/user/{user_id}/stats", get(stats))
                    .route("/{id}", get(get_one).put(update).delete(delete_one))
            }

            async fn create(
                State(state): State<AppState>,
                JsonBody(input): JsonBody<FeedbackInput>,
            ) -> ApiResult<(StatusCode, ApiResponse<$entry>)> {
                Ok(ApiResponse::data(state.$service.create(input).await?).created())
            }

            async fn list(
                State(state): State<AppState>,
                Query(params): Query<ListParams>,
            ) -> ApiResult<ApiResponse<Vec<$entry>>> {
                Ok(ApiResponse::data(state.$service.list(&params.page()).await?))
            }

            async fn for_user(
                State(state): State<AppState>,
                Path(user_id): Path<String>,
            ) -> ApiResult<ApiResponse<Vec<$entry>>> {
                Ok(ApiResponse::data(state.$service.for_user(&user_id).await?))
            }

            async fn stats(
                State(state): State<AppState>,
                Path(user_id): Path<String>,
            ) -> ApiResult<ApiResponse<$stats>> {
                Ok(ApiResponse::data(state.$service.stats(&user_id).await?))
            }

            async fn get_one(
                State(state): State<AppState>,
                Path(id): Path<String>,
            ) -> ApiResult<ApiResponse<$entry>> {
                Ok(ApiResponse::data(state.$service.get(&id).await?))
            }

            async fn update(
                State(state): State<AppState>,
                Path(id): Path<String>,
                JsonBody(input): JsonBody<FeedbackInput>,
            ) -> ApiResult<ApiResponse<$entry>> {
                Ok(ApiResponse::data(state.$service.update(&id, input).await?))
            }

            async fn delete_one(
                State(state): State<AppState>,
                Path(id): Path<String>,
            ) -> ApiResult<ApiResponse<IdResponse>> {
                state.$service.delete(&id).await?;
                Ok(ApiResponse::data(IdResponse { id }))
            }

            async fn delete_all(State(state): State<AppState>) -> ApiResult<ApiResponse<()>> {
                let deleted = state.$service.delete_all().await?;
                tracing::warn!("Deleted all {} {}", deleted, $label);
                Ok(ApiResponse::deleted(deleted))
            }
        }
    };
}

feedback_routes!(
    ratings_reviews,
    ratings_reviews,
    crate::models::RatingReview,
    crate::models::RatingReviewStats,
    "ratings/reviews"
);
feedback_routes!(
    ratings,
    ratings,
    crate::models::Rating,
    crate::models::RatingStats,
    "ratings"
);
feedback_routes!(
    reviews,
    reviews,
    crate::models::Review,
    crate::models::ReviewStats,
    "reviews"
);
