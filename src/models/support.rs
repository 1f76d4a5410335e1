//! Support tickets (`support`)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::user_query::UserType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupportStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
    Closed,
}

impl SupportStatus {
    pub const ALL: [SupportStatus; 4] = [
        SupportStatus::Pending,
        SupportStatus::InProgress,
        SupportStatus::Resolved,
        SupportStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportStatus::Pending => "PENDING",
            SupportStatus::InProgress => "IN_PROGRESS",
            SupportStatus::Resolved => "RESOLVED",
            SupportStatus::Closed => "CLOSED",
        }
    }

    /// Case-insensitive parse
    pub fn parse_loose(s: &str) -> Option<Self> {
        s.to_uppercase().parse().ok()
    }

    pub fn choices() -> String {
        Self::ALL.map(|s| s.as_str()).join(", ")
    }
}

impl fmt::Display for SupportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid support status: {}", s))
    }
}

/// Staff reply appended to a ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportAnswer {
    pub id: String,
    pub answer: String,
    pub answered_by: String,
    pub answered_by_type: UserType,
    pub answered_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Support {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub user_type: UserType,
    pub purpose: String,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: SupportStatus,
    /// Replies in the order they were added
    #[serde(default)]
    pub answers: Vec<Value>,
    pub created_at: String,
    pub updated_at: String,
}
