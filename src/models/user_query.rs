//! Legal questions (`queries`) and their answers (`queryAnswers`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of account behind a query answer or support ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserType {
    Client,
    Lawyer,
    Admin,
    Subadmin,
}

impl UserType {
    pub const ALL: [UserType; 4] = [
        UserType::Client,
        UserType::Lawyer,
        UserType::Admin,
        UserType::Subadmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Client => "CLIENT",
            UserType::Lawyer => "LAWYER",
            UserType::Admin => "ADMIN",
            UserType::Subadmin => "SUBADMIN",
        }
    }

    /// Case-insensitive parse
    pub fn parse_loose(s: &str) -> Option<Self> {
        s.to_uppercase().parse().ok()
    }

    /// `CLIENT, LAWYER, ADMIN, SUBADMIN`
    pub fn choices() -> String {
        Self::ALL.map(|t| t.as_str()).join(", ")
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Invalid user type: {}", s))
    }
}

/// A question posted to the community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub asked_by_name: String,
    #[serde(default)]
    pub asked_by_id: String,
    /// Recomputed from `queryAnswers` on every read
    #[serde(default)]
    pub answers_count: u64,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnswer {
    #[serde(default)]
    pub id: String,
    pub query_id: String,
    pub user_id: String,
    pub user_type: UserType,
    pub user_name: String,
    pub answer: String,
    pub created_at: String,
    pub updated_at: String,
}
