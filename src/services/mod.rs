//! Services layer - Business logic
//!
//! One service per resource. Services validate input, apply the resource's
//! rules and talk to the document store through typed collections; the
//! HTTP layer only maps their results onto responses.

pub mod cases;
pub mod catalog;
pub mod client_contacts;
pub mod clients;
pub mod common;
pub mod content;
pub mod delete_requests;
pub mod error;
pub mod password;
pub mod queries;
pub mod rate_limiter;
pub mod ratings;
pub mod staff;
pub mod support;
pub mod token;
pub mod users;

pub use cases::{CaseInput, CaseService};
pub use catalog::{BookingInput, CatalogService, ServiceInput};
pub use client_contacts::{ClientContactService, ContactInput, Recorded};
pub use clients::{ClientService, ClientUpdate, LoginInput, SignupInput};
pub use common::{clamp_limit, Page, DEFAULT_LIMIT, MAX_LIMIT};
pub use content::{
    BlogInput, BlogService, ContentFilter, NewsInput, NewsService, NotificationInput,
    NotificationService,
};
pub use delete_requests::{DeleteRequestInput, DeleteRequestService, ReviewDecision};
pub use error::{ServiceError, ServiceResult};
pub use password::{hash_password, verify_password};
pub use queries::{AnswerFilter, AnswerInput, QueryInput, QueryService};
pub use rate_limiter::LoginRateLimiter;
pub use ratings::{FeedbackInput, RatingReviewService, RatingService, ReviewService};
pub use staff::{AdminService, StaffAccount, StaffInput, StaffService, SubAdminService};
pub use support::{ReplyInput, SupportFilter, SupportInput, SupportService};
pub use token::{Claims, TokenError, TokenService};
pub use users::{UserFilter, UserService};
