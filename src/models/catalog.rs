//! Offered services (`services`) and client bookings (`servicesBooked`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Contact number shown with the service
    #[serde(default)]
    pub number: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBooked {
    #[serde(default)]
    pub id: String,
    pub client_id: String,
    pub phone_number: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Service ids or embedded service objects, as sent by the client app
    #[serde(default)]
    pub services_booked: Vec<Value>,
    pub created_at: String,
    pub updated_at: String,
}
