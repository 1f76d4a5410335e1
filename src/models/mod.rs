//! Data models
//!
//! This module contains the records kept in the document store. Each type
//! maps to one collection through [`Document`], and most carry camelCase
//! serde names so stored JSON matches what the API returns.

mod case;
mod catalog;
mod client;
mod client_contact;
mod common;
mod content;
mod delete_request;
mod rating;
mod staff;
mod support;
mod user;
mod user_query;

pub use case::{Case, CaseStatus};
pub use catalog::{Service, ServiceBooked};
pub use client::{Client, ClientIdentity, ClientView};
pub use client_contact::{ClientContact, ContactStatus, DEFAULT_CONTACT_TYPE};
pub use common::{
    coerce_bool, format_timestamp, lenient, now_timestamp, normalize_email, parse_date,
    parse_flag, zero_amount,
};
pub use content::{Blog, News, Notification};
pub use delete_request::{DeleteRequest, STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED};
pub use rating::{
    average_rating, is_valid_rating, is_valid_review, Rating, RatingReview, RatingReviewStats,
    RatingStats, Review, ReviewStats, MIN_REVIEW_CHARS,
};
pub use staff::{
    invalid_tabs, Admin, AdminView, Role, StaffIdentity, SubAdmin, SubAdminView, VALID_TABS,
};
pub use support::{Support, SupportAnswer, SupportStatus};
pub use user::{ExperienceBucket, PracticeCategory, TravelPreference, User};
pub use user_query::{QueryAnswer, UserQuery, UserType};

use crate::db::Document;

macro_rules! document {
    ($($model:ty => $collection:literal),+ $(,)?) => {
        $(
            impl Document for $model {
                const COLLECTION: &'static str = $collection;

                fn id(&self) -> &str {
                    &self.id
                }

                fn set_id(&mut self, id: String) {
                    self.id = id;
                }
            }
        )+
    };
}

document! {
    User => "users",
    Client => "clients",
    Admin => "admins",
    SubAdmin => "subAdmins",
    Case => "cases",
    UserQuery => "queries",
    QueryAnswer => "queryAnswers",
    Service => "services",
    ServiceBooked => "servicesBooked",
    RatingReview => "ratings_reviews",
    Rating => "ratings",
    Review => "reviews",
    Support => "support",
    Blog => "blogs",
    News => "news",
    Notification => "notifications",
    DeleteRequest => "delete_requests",
    ClientContact => "client_contacts",
}
