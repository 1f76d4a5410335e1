//! Client feedback on lawyers: `ratings`, `reviews` and the combined
//! `ratings_reviews` collection.

use serde::{Deserialize, Serialize};

/// Minimum trimmed length of a written review
pub const MIN_REVIEW_CHARS: usize = 10;

/// True for a star rating in 1..=5
pub fn is_valid_rating(rating: f64) -> bool {
    (1.0..=5.0).contains(&rating)
}

/// True when the trimmed review is long enough
pub fn is_valid_review(review: &str) -> bool {
    review.trim().chars().count() >= MIN_REVIEW_CHARS
}

/// Plain mean of the positive ratings, 0 when there are none
pub fn average_rating(ratings: impl IntoIterator<Item = f64>) -> (f64, usize) {
    let (sum, count) = ratings
        .into_iter()
        .filter(|r| *r > 0.0)
        .fold((0.0, 0usize), |(sum, count), r| (sum + r, count + 1));
    if count == 0 {
        (0.0, 0)
    } else {
        (sum / count as f64, count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    #[serde(default)]
    pub id: String,
    pub rating: f64,
    pub user_id: String,
    pub client_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: String,
    pub review: String,
    pub user_id: String,
    pub client_id: String,
    #[serde(default)]
    pub rating_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A rating, a review or both, left by one client for one lawyer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingReview {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review: String,
    pub user_id: String,
    pub client_id: String,
    #[serde(default)]
    pub client_name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Aggregates for `/api/ratings-reviews/user/{userId}/stats`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingReviewStats {
    pub user_id: String,
    pub average_rating: f64,
    pub rating_count: usize,
    pub review_count: usize,
    pub reviews: Vec<RatingReview>,
}

impl RatingReviewStats {
    pub fn from_entries(user_id: String, entries: Vec<RatingReview>) -> Self {
        let (average_rating, rating_count) =
            average_rating(entries.iter().filter_map(|e| e.rating));
        let review_count = entries
            .iter()
            .filter(|e| !e.review.trim().is_empty())
            .count();
        Self {
            user_id,
            average_rating,
            rating_count,
            review_count,
            reviews: entries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingStats {
    pub user_id: String,
    pub average_rating: f64,
    pub rating_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub user_id: String,
    pub review_count: usize,
}
