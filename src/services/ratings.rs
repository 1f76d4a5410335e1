//! Client feedback on lawyers
//!
//! Three collections hold feedback: standalone `ratings`, standalone
//! `reviews`, and `ratings_reviews` where one entry may carry either or
//! both. Each client may leave at most one entry per lawyer in each.

use serde::Deserialize;

use crate::db::{Collection, Direction, Document, DynDocumentStore, Filter, Query};
use crate::models::{
    average_rating, is_valid_rating, is_valid_review, lenient, now_timestamp, Rating,
    RatingReview, RatingReviewStats, RatingStats, Review, ReviewStats,
};

use super::common::{present, Page};
use super::error::{ServiceError, ServiceResult};

const MISSING_FEEDBACK: &str =
    "Either a valid rating (1-5) or a review (at least 10 characters) must be provided";

/// Body shared by the three feedback endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackInput {
    #[serde(default, deserialize_with = "lenient::number")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub review: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rating_id: Option<String>,
}

impl FeedbackInput {
    fn valid_rating(&self) -> Option<f64> {
        self.rating.filter(|r| is_valid_rating(*r))
    }

    fn valid_review(&self) -> Option<String> {
        self.review
            .as_deref()
            .filter(|r| is_valid_review(r))
            .map(|r| r.trim().to_string())
    }

    fn has_feedback(&self) -> bool {
        self.valid_rating().is_some() || self.valid_review().is_some()
    }

    fn pair(&self) -> Option<(String, String)> {
        Some((present(self.user_id.clone())?, present(self.client_id.clone())?))
    }
}

/// Entries of one collection left for a lawyer
async fn for_user<T: Document>(collection: &Collection<T>, user_id: &str) -> ServiceResult<Vec<T>> {
    let query = Query::new()
        .filter(Filter::eq("userId", user_id))
        .order_by("createdAt", Direction::Desc);
    Ok(collection.find(&query).await?)
}

async fn pair_exists<T: Document>(
    collection: &Collection<T>,
    user_id: &str,
    client_id: &str,
) -> ServiceResult<bool> {
    let query = Query::new()
        .filter(Filter::eq("userId", user_id))
        .filter(Filter::eq("clientId", client_id));
    Ok(collection.find_one(query).await?.is_some())
}

async fn list_page<T: Document>(collection: &Collection<T>, page: &Page) -> ServiceResult<Vec<T>> {
    let query = page.apply(Query::new().order_by("createdAt", Direction::Desc));
    Ok(collection.find(&query).await?)
}

async fn delete_existing<T: Document>(
    collection: &Collection<T>,
    id: &str,
    missing: &'static str,
) -> ServiceResult<()> {
    if !collection.delete(id).await? {
        return Err(ServiceError::not_found(missing));
    }
    Ok(())
}

pub struct RatingReviewService {
    entries: Collection<RatingReview>,
}

impl RatingReviewService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            entries: Collection::new(store),
        }
    }

    pub async fn create(&self, input: FeedbackInput) -> ServiceResult<RatingReview> {
        if !input.has_feedback() {
            return Err(ServiceError::validation(MISSING_FEEDBACK));
        }
        let (user_id, client_id) = input
            .pair()
            .ok_or_else(|| ServiceError::validation("userId and clientId are required"))?;
        if pair_exists(&self.entries, &user_id, &client_id).await? {
            return Err(ServiceError::conflict("You have already rated/reviewed this user"));
        }

        let now = now_timestamp();
        let entry = RatingReview {
            id: String::new(),
            rating: input.valid_rating(),
            review: input.review.as_deref().map(str::trim).unwrap_or_default().to_string(),
            user_id,
            client_id,
            client_name: input.client_name.unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
        };
        Ok(self.entries.create(entry).await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<RatingReview> {
        self.entries
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Rating/Review not found"))
    }

    pub async fn list(&self, page: &Page) -> ServiceResult<Vec<RatingReview>> {
        list_page(&self.entries, page).await
    }

    pub async fn for_user(&self, user_id: &str) -> ServiceResult<Vec<RatingReview>> {
        for_user(&self.entries, user_id).await
    }

    pub async fn stats(&self, user_id: &str) -> ServiceResult<RatingReviewStats> {
        let entries = self.for_user(user_id).await?;
        Ok(RatingReviewStats::from_entries(user_id.to_string(), entries))
    }

    /// Change whichever of rating and review the caller sent valid values for
    pub async fn update(&self, id: &str, input: FeedbackInput) -> ServiceResult<RatingReview> {
        if !input.has_feedback() {
            return Err(ServiceError::validation(MISSING_FEEDBACK));
        }
        let mut entry = self.get(id).await?;
        if let Some(rating) = input.valid_rating() {
            entry.rating = Some(rating);
        }
        if let Some(review) = input.valid_review() {
            entry.review = review;
        }
        entry.updated_at = now_timestamp();
        self.entries.set(&entry).await?;
        Ok(entry)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        delete_existing(&self.entries, id, "Rating/Review not found").await
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.entries.delete_all().await?)
    }
}

pub struct RatingService {
    ratings: Collection<Rating>,
}

impl RatingService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            ratings: Collection::new(store),
        }
    }

    pub async fn create(&self, input: FeedbackInput) -> ServiceResult<Rating> {
        let rating = input.rating.filter(|r| *r != 0.0);
        let (Some(rating), Some((user_id, client_id))) = (rating, input.pair()) else {
            return Err(ServiceError::validation("rating, userId, and clientId are required"));
        };
        if !is_valid_rating(rating) {
            return Err(ServiceError::validation("rating must be between 1 and 5"));
        }
        if pair_exists(&self.ratings, &user_id, &client_id).await? {
            return Err(ServiceError::conflict("You have already rated this user"));
        }

        let now = now_timestamp();
        let rating = Rating {
            id: String::new(),
            rating,
            user_id,
            client_id,
            created_at: now.clone(),
            updated_at: now,
        };
        Ok(self.ratings.create(rating).await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Rating> {
        self.ratings
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Rating not found"))
    }

    pub async fn list(&self, page: &Page) -> ServiceResult<Vec<Rating>> {
        list_page(&self.ratings, page).await
    }

    pub async fn for_user(&self, user_id: &str) -> ServiceResult<Vec<Rating>> {
        for_user(&self.ratings, user_id).await
    }

    pub async fn stats(&self, user_id: &str) -> ServiceResult<RatingStats> {
        let ratings = self.for_user(user_id).await?;
        let (average_rating, rating_count) = average_rating(ratings.iter().map(|r| r.rating));
        Ok(RatingStats {
            user_id: user_id.to_string(),
            average_rating,
            rating_count,
        })
    }

    pub async fn update(&self, id: &str, input: FeedbackInput) -> ServiceResult<Rating> {
        let rating = input
            .valid_rating()
            .ok_or_else(|| ServiceError::validation("Valid rating (1-5) is required"))?;
        let mut existing = self.get(id).await?;
        existing.rating = rating;
        existing.updated_at = now_timestamp();
        self.ratings.set(&existing).await?;
        Ok(existing)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        delete_existing(&self.ratings, id, "Rating not found").await
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.ratings.delete_all().await?)
    }
}

pub struct ReviewService {
    reviews: Collection<Review>,
}

impl ReviewService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            reviews: Collection::new(store),
        }
    }

    pub async fn create(&self, input: FeedbackInput) -> ServiceResult<Review> {
        let review = input.review.clone().filter(|r| !r.is_empty());
        let (Some(review), Some((user_id, client_id))) = (review, input.pair()) else {
            return Err(ServiceError::validation("review, userId, and clientId are required"));
        };
        if !is_valid_review(&review) {
            return Err(ServiceError::validation("Review must be at least 10 characters long"));
        }
        if pair_exists(&self.reviews, &user_id, &client_id).await? {
            return Err(ServiceError::conflict("You have already reviewed this user"));
        }

        let now = now_timestamp();
        let review = Review {
            id: String::new(),
            review: review.trim().to_string(),
            user_id,
            client_id,
            rating_id: present(input.rating_id),
            created_at: now.clone(),
            updated_at: now,
        };
        Ok(self.reviews.create(review).await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Review> {
        self.reviews
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Review not found"))
    }

    pub async fn list(&self, page: &Page) -> ServiceResult<Vec<Review>> {
        list_page(&self.reviews, page).await
    }

    pub async fn for_user(&self, user_id: &str) -> ServiceResult<Vec<Review>> {
        for_user(&self.reviews, user_id).await
    }

    pub async fn stats(&self, user_id: &str) -> ServiceResult<ReviewStats> {
        let review_count = self.for_user(user_id).await?.len();
        Ok(ReviewStats {
            user_id: user_id.to_string(),
            review_count,
        })
    }

    pub async fn update(&self, id: &str, input: FeedbackInput) -> ServiceResult<Review> {
        let review = input.valid_review().ok_or_else(|| {
            ServiceError::validation("Valid review (at least 10 characters) is required")
        })?;
        let mut existing = self.get(id).await?;
        existing.review = review;
        existing.updated_at = now_timestamp();
        self.reviews.set(&existing).await?;
        Ok(existing)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        delete_existing(&self.reviews, id, "Review not found").await
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.reviews.delete_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use serde_json::{json, Value};

    async fn store() -> DynDocumentStore {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxDocumentStore::shared(pool)
    }

    fn feedback(body: Value) -> FeedbackInput {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn test_rating_review_create_rules() {
        let service = RatingReviewService::new(store().await);

        let err = service
            .create(feedback(json!({"rating": 7, "review": "short", "userId": "l", "clientId": "c"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), MISSING_FEEDBACK);

        let err = service.create(feedback(json!({"rating": 4}))).await.unwrap_err();
        assert_eq!(err.to_string(), "userId and clientId are required");

        let created = service
            .create(feedback(json!({
                "review": "  Explained every step clearly  ",
                "userId": "l",
                "clientId": "c",
                "clientName": "Asha"
            })))
            .await
            .unwrap();
        assert_eq!(created.rating, None);
        assert_eq!(created.review, "Explained every step clearly");

        let dup = service
            .create(feedback(json!({"rating": 5, "userId": "l", "clientId": "c"})))
            .await
            .unwrap_err();
        assert!(matches!(dup, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_rating_review_stats_and_update() {
        let service = RatingReviewService::new(store().await);
        let first = service
            .create(feedback(json!({"rating": "5", "userId": "l", "clientId": "c1"})))
            .await
            .unwrap();
        service
            .create(feedback(json!({"rating": 2, "review": "Slow to respond to calls", "userId": "l", "clientId": "c2"})))
            .await
            .unwrap();

        let stats = service.stats("l").await.unwrap();
        assert_eq!(stats.average_rating, 3.5);
        assert_eq!(stats.rating_count, 2);
        assert_eq!(stats.review_count, 1);
        assert_eq!(stats.reviews.len(), 2);

        let updated = service
            .update(&first.id, feedback(json!({"review": "Won my property case"})))
            .await
            .unwrap();
        assert_eq!(updated.rating, Some(5.0));
        assert_eq!(updated.review, "Won my property case");

        service.delete(&first.id).await.unwrap();
        assert_eq!(
            service.delete(&first.id).await.unwrap_err().to_string(),
            "Rating/Review not found"
        );
    }

    #[tokio::test]
    async fn test_ratings() {
        let service = RatingService::new(store().await);
        let err = service
            .create(feedback(json!({"rating": 0, "userId": "l", "clientId": "c"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "rating, userId, and clientId are required");

        let err = service
            .create(feedback(json!({"rating": 6, "userId": "l", "clientId": "c"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "rating must be between 1 and 5");

        let rating = service
            .create(feedback(json!({"rating": 4, "userId": "l", "clientId": "c"})))
            .await
            .unwrap();
        service
            .create(feedback(json!({"rating": 3, "userId": "l", "clientId": "d"})))
            .await
            .unwrap();
        let stats = service.stats("l").await.unwrap();
        assert_eq!(stats.average_rating, 3.5);
        assert_eq!(stats.rating_count, 2);

        let err = service.update(&rating.id, feedback(json!({"rating": 9}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Valid rating (1-5) is required");
        assert_eq!(
            service.update(&rating.id, feedback(json!({"rating": 1}))).await.unwrap().rating,
            1.0
        );
        assert!(matches!(
            service.get("missing").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reviews() {
        let service = ReviewService::new(store().await);
        let err = service
            .create(feedback(json!({"review": "too short", "userId": "l", "clientId": "c"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Review must be at least 10 characters long");

        let review = service
            .create(feedback(json!({
                "review": "Knows tenancy law well",
                "userId": "l",
                "clientId": "c",
                "ratingId": "r-1"
            })))
            .await
            .unwrap();
        assert_eq!(review.rating_id.as_deref(), Some("r-1"));

        let dup = service
            .create(feedback(json!({"review": "Another long review", "userId": "l", "clientId": "c"})))
            .await
            .unwrap_err();
        assert_eq!(dup.to_string(), "You have already reviewed this user");
        assert_eq!(service.stats("l").await.unwrap().review_count, 1);
    }
}
