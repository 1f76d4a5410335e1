//! Client accounts: signup, login and profile maintenance

use serde::Deserialize;

use crate::db::{Collection, Direction, DynDocumentStore, Filter, Query};
use crate::models::{lenient, normalize_email, now_timestamp, Client};

use super::error::{ServiceError, ServiceResult};
use super::password::{hash_password, password_matches, MIN_PASSWORD_LEN};

/// Signup body; `name` is accepted in place of `fullName`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub profile_pic: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub password: Option<String>,
}

impl LoginInput {
    /// Normalized email and password, or the "required" validation error
    pub fn credentials(&self) -> ServiceResult<(String, &str)> {
        let email = normalize_email(self.email.as_deref().unwrap_or_default());
        match self.password.as_deref() {
            Some(password) if !email.is_empty() && !password.is_empty() => Ok((email, password)),
            _ => Err(ServiceError::validation("email and password are required")),
        }
    }
}

/// Partial update; only present fields change
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUpdate {
    #[serde(default, deserialize_with = "lenient::text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub password: Option<String>,
}

fn check_password(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::validation("password must be at least 6 chars"));
    }
    Ok(())
}

pub struct ClientService {
    clients: Collection<Client>,
}

impl ClientService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            clients: Collection::new(store),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> ServiceResult<Option<Client>> {
        Ok(self
            .clients
            .find_one(Query::new().filter(Filter::eq("email", email)))
            .await?)
    }

    pub async fn signup(&self, input: SignupInput) -> ServiceResult<Client> {
        let email = normalize_email(input.email.as_deref().unwrap_or_default());
        let full_name = input
            .full_name
            .filter(|n| !n.is_empty())
            .or(input.name)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServiceError::validation("fullName is required"))?;
        if email.is_empty() {
            return Err(ServiceError::validation("email is required"));
        }
        let password = input.password.unwrap_or_default();
        check_password(&password)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::conflict("email already in use"));
        }

        let now = now_timestamp();
        let client = Client {
            id: String::new(),
            full_name,
            email,
            phone: input.phone.unwrap_or_default(),
            city: input.city.unwrap_or_default(),
            profile_pic: input.profile_pic.unwrap_or_default(),
            hashed_password: hash_password(&password)?,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };
        let client = self.clients.create(client).await?;
        tracing::info!("Client {} signed up", client.id);
        Ok(client)
    }

    pub async fn login(&self, input: &LoginInput) -> ServiceResult<Client> {
        let (email, password) = input.credentials()?;
        let client = self
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("invalid credentials"))?;
        if !password_matches(password, &client.hashed_password) {
            return Err(ServiceError::unauthorized("invalid credentials"));
        }
        Ok(client)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Client> {
        self.clients
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("not found"))
    }

    pub async fn list(&self) -> ServiceResult<Vec<Client>> {
        Ok(self
            .clients
            .find(&Query::new().order_by("createdAt", Direction::Desc))
            .await?)
    }

    pub async fn update(&self, id: &str, update: ClientUpdate) -> ServiceResult<Client> {
        let mut client = self.get(id).await?;

        if let Some(full_name) = update.full_name {
            client.full_name = full_name;
        }
        if let Some(email) = update.email {
            let email = normalize_email(&email);
            if !email.is_empty() {
                if let Some(other) = self.find_by_email(&email).await? {
                    if other.id != id {
                        return Err(ServiceError::conflict("email already in use"));
                    }
                }
            }
            client.email = email;
        }
        if let Some(phone) = update.phone {
            client.phone = phone;
        }
        if let Some(city) = update.city {
            client.city = city;
        }
        if let Some(password) = update.password.filter(|p| !p.is_empty()) {
            check_password(&password)?;
            client.hashed_password = hash_password(&password)?;
        }
        client.updated_at = Some(now_timestamp());

        self.clients.set(&client).await?;
        Ok(client)
    }

    /// Delete one client; missing ids are a 404
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        if !self.clients.delete(id).await? {
            return Err(ServiceError::not_found("not found"));
        }
        Ok(())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.clients.delete_all().await?)
    }
}
