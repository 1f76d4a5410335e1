//! Account deletion requests (`delete_requests`)

use serde::{Deserialize, Serialize};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";

/// A user's request to have their account removed, and its review outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_phone: String,
    pub reason: String,
    /// `pending`, `approved` or `rejected`
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub admin_notes: Option<String>,
    pub requested_at: String,
    #[serde(default)]
    pub reviewed_at: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
}

fn default_status() -> String {
    STATUS_PENDING.to_string()
}

impl DeleteRequest {
    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }
}
