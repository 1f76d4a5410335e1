//! Court cases tracked by lawyers (`cases`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Case lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseStatus {
    #[default]
    Open,
    Closed,
    Adjourned,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "OPEN",
            CaseStatus::Closed => "CLOSED",
            CaseStatus::Adjourned => "ADJOURNED",
        }
    }

    /// Statuses that still expect hearings and reminders
    pub const ACTIVE: [CaseStatus; 2] = [CaseStatus::Open, CaseStatus::Adjourned];
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact match on the upper-case name
impl FromStr for CaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(CaseStatus::Open),
            "CLOSED" => Ok(CaseStatus::Closed),
            "ADJOURNED" => Ok(CaseStatus::Adjourned),
            _ => Err(format!("Invalid case status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    #[serde(default)]
    pub id: String,
    pub created_by_id: String,
    pub case_number: String,
    pub case_type_and_registration: String,
    #[serde(default)]
    pub fir_number: String,
    pub partitionar_name: String,
    #[serde(default)]
    pub client_number: String,
    pub respondent_name: String,
    #[serde(default)]
    pub second_party_number: String,
    pub court_name: String,
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub amount_received: Option<f64>,
    pub judge_name: String,
    pub judge_post: String,
    #[serde(default)]
    pub remarks: String,
    pub purpose: String,
    #[serde(default)]
    pub status: CaseStatus,
    #[serde(default)]
    pub next_hearing_date: Option<String>,
    #[serde(default)]
    pub last_hearing_date: Option<String>,
    #[serde(default)]
    pub remind_me_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
