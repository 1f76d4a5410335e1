//! Client to lawyer contact records (`client_contacts`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CONTACT_TYPE: &str = "chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    Initiated,
    Responded,
    Completed,
    Cancelled,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 4] = [
        ContactStatus::Initiated,
        ContactStatus::Responded,
        ContactStatus::Completed,
        ContactStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Initiated => "initiated",
            ContactStatus::Responded => "responded",
            ContactStatus::Completed => "completed",
            ContactStatus::Cancelled => "cancelled",
        }
    }

    pub fn choices() -> String {
        Self::ALL.map(|s| s.as_str()).join(", ")
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid contact status: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContact {
    #[serde(default)]
    pub id: String,
    pub client_id: String,
    pub lawyer_id: String,
    /// `chat`, `call`, `email` or `inquiry`
    #[serde(default = "default_contact_type")]
    pub contact_type: String,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub contact_date: String,
    pub last_activity: String,
    #[serde(default)]
    pub notes: String,
}

fn default_contact_type() -> String {
    DEFAULT_CONTACT_TYPE.to_string()
}
