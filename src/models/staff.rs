//! Back-office accounts: admins (`admins`) and sub-admins (`subAdmins`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::common::default_true;

/// Sidebar tabs a sub-admin may be granted
pub const VALID_TABS: &[&str] = &[
    "Lawyers",
    "Clients",
    "Cases",
    "News",
    "Queries",
    "Admins",
    "SubAdmins",
    "Blogs",
    "Notifications",
];

/// Role carried in signed tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "subAdmin")]
    SubAdmin,
    #[serde(rename = "client")]
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::SubAdmin => "subAdmin",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "subAdmin" => Ok(Role::SubAdmin),
            "client" => Ok(Role::Client),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// An administrator account as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    /// Argon2 hash
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A sub-administrator account as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAdmin {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub password: String,
    /// Free-form job title, not the token role
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub allowed_tabs: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Public view of an admin
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<&Admin> for AdminView {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id.clone(),
            name: admin.name.clone(),
            email: admin.email.clone(),
            phone_number: admin.phone_number.clone(),
            is_active: admin.is_active,
            created_at: admin.created_at.clone(),
            updated_at: admin.updated_at.clone(),
        }
    }
}

/// Public view of a sub-admin
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAdminView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: String,
    pub allowed_tabs: Vec<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<&SubAdmin> for SubAdminView {
    fn from(sub: &SubAdmin) -> Self {
        Self {
            id: sub.id.clone(),
            name: sub.name.clone(),
            email: sub.email.clone(),
            phone_number: sub.phone_number.clone(),
            role: sub.role.clone(),
            allowed_tabs: sub.allowed_tabs.clone(),
            is_active: sub.is_active,
            created_at: sub.created_at.clone(),
            updated_at: sub.updated_at.clone(),
        }
    }
}

/// The signed-in staff member as returned by `/api/auth/me`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffIdentity {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub phone_number: String,
    pub is_active: bool,
    pub allowed_tabs: Vec<String>,
}

/// Tabs that are not in [`VALID_TABS`], in input order
pub fn invalid_tabs(tabs: &[String]) -> Vec<&str> {
    tabs.iter()
        .map(String::as_str)
        .filter(|tab| !VALID_TABS.contains(tab))
        .collect()
}
