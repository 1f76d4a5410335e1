//! Client accounts (`clients`)

use serde::{Deserialize, Serialize};

/// A client account as stored, including the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub profile_pic: String,
    #[serde(default)]
    pub hashed_password: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// The public view of a client; never carries the password hash
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub profile_pic: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&Client> for ClientView {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id.clone(),
            full_name: client.full_name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            city: client.city.clone(),
            profile_pic: client.profile_pic.clone(),
            created_at: client.created_at.clone(),
            updated_at: client.updated_at.clone(),
        }
    }
}

/// The authenticated client as returned by `/api/clients/me`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdentity {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: &'static str,
    pub full_name: String,
}

impl From<&Client> for ClientIdentity {
    fn from(client: &Client) -> Self {
        let mut words = client.full_name.split(' ');
        let first_name = words.next().unwrap_or_default().to_string();
        let last_name = words.collect::<Vec<_>>().join(" ");
        Self {
            id: client.id.clone(),
            email: client.email.clone(),
            first_name,
            last_name,
            phone: client.phone.clone(),
            role: "client",
            full_name: client.full_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(full_name: &str) -> Client {
        Client {
            id: "c1".into(),
            full_name: full_name.into(),
            email: "a@b.c".into(),
            phone: String::new(),
            city: String::new(),
            profile_pic: String::new(),
            hashed_password: "$argon2id$secret".into(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_view_hides_password() {
        let view = serde_json::to_value(ClientView::from(&client("Asha Rao"))).unwrap();
        assert!(view.get("hashedPassword").is_none());
        assert_eq!(view["fullName"], "Asha Rao");
    }

    #[test]
    fn test_identity_splits_name() {
        let who = ClientIdentity::from(&client("Asha Devi Rao"));
        assert_eq!(who.first_name, "Asha");
        assert_eq!(who.last_name, "Devi Rao");
        assert_eq!(who.role, "client");

        let single = ClientIdentity::from(&client("Asha"));
        assert_eq!(single.last_name, "");
    }
}
