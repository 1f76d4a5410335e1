//! Back-office accounts
//!
//! Admins and sub-admins share one workflow (create, login, replace) and
//! differ only in the extra fields a sub-admin carries. [`StaffAccount`]
//! captures that difference so [`StaffService`] can serve both collections.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{Collection, Direction, Document, DynDocumentStore, Filter, Query};
use crate::models::{
    invalid_tabs, lenient, normalize_email, now_timestamp, Admin, AdminView, Role, StaffIdentity,
    SubAdmin, SubAdminView, VALID_TABS,
};

use super::clients::LoginInput;
use super::common::Page;
use super::error::{ServiceError, ServiceResult};
use super::password::{hash_password, password_matches};

/// Body of a staff create or replace request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone_number: Option<String>,
    /// Sub-admin job title
    #[serde(default, deserialize_with = "lenient::text")]
    pub role: Option<String>,
    #[serde(default)]
    pub allowed_tabs: Option<Value>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
}

/// Validated common fields, password already hashed
pub struct StaffFields {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub is_active: bool,
}

impl StaffInput {
    fn common(&self) -> ServiceResult<StaffFields> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        let name = non_empty(&self.name).ok_or_else(|| ServiceError::validation("name is required"))?;
        let email = non_empty(&self.email)
            .ok_or_else(|| ServiceError::validation("email is required"))?;
        let password = non_empty(&self.password)
            .ok_or_else(|| ServiceError::validation("password is required"))?;
        Ok(StaffFields {
            name,
            email: normalize_email(&email),
            phone_number: self.phone_number.clone().unwrap_or_default(),
            password,
            is_active: self.is_active.unwrap_or(true),
        })
    }

    fn tabs(&self) -> ServiceResult<Vec<String>> {
        let invalid = |names: Vec<&str>| {
            ServiceError::validation(format!(
                "Invalid tab keys: {}. Valid keys are: {}",
                names.join(", "),
                VALID_TABS.join(", ")
            ))
        };
        match &self.allowed_tabs {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => {
                let tabs: Vec<String> = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect();
                let bad = invalid_tabs(&tabs);
                if bad.is_empty() {
                    Ok(tabs)
                } else {
                    Err(invalid(bad))
                }
            }
            Some(_) => Err(invalid(Vec::new())),
        }
    }
}

/// A staff collection's account type
pub trait StaffAccount: Document + Clone + 'static {
    /// Role put into issued tokens
    const ROLE: Role;

    type View: Serialize + Send + 'static;

    /// Validate input and build an unsaved account
    fn build(input: &StaffInput) -> ServiceResult<Self>;

    fn email(&self) -> &str;

    fn password_hash(&self) -> &str;

    fn created_at(&self) -> Option<&str>;

    fn set_timestamps(&mut self, created_at: String, updated_at: String);

    /// Tabs carried in the token, if the role has any
    fn token_tabs(&self) -> Option<Vec<String>>;

    fn view(&self) -> Self::View;

    /// The view returned by login, without timestamps
    fn login_view(&self) -> Self::View;

    fn identity(&self, token_email: &str) -> StaffIdentity;
}

impl StaffAccount for Admin {
    const ROLE: Role = Role::Admin;

    type View = AdminView;

    fn build(input: &StaffInput) -> ServiceResult<Self> {
        let fields = input.common()?;
        Ok(Admin {
            id: String::new(),
            name: fields.name,
            email: fields.email,
            phone_number: fields.phone_number,
            password: hash_password(&fields.password)?,
            is_active: fields.is_active,
            created_at: None,
            updated_at: None,
        })
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn password_hash(&self) -> &str {
        &self.password
    }

    fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    fn set_timestamps(&mut self, created_at: String, updated_at: String) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }

    fn token_tabs(&self) -> Option<Vec<String>> {
        None
    }

    fn view(&self) -> AdminView {
        AdminView::from(self)
    }

    fn login_view(&self) -> AdminView {
        AdminView {
            created_at: None,
            updated_at: None,
            ..AdminView::from(self)
        }
    }

    fn identity(&self, token_email: &str) -> StaffIdentity {
        StaffIdentity {
            id: self.id.clone(),
            email: token_email.to_string(),
            role: Role::Admin,
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
            is_active: self.is_active,
            allowed_tabs: Vec::new(),
        }
    }
}

impl StaffAccount for SubAdmin {
    const ROLE: Role = Role::SubAdmin;

    type View = SubAdminView;

    fn build(input: &StaffInput) -> ServiceResult<Self> {
        let fields = input.common()?;
        let role = input
            .role
            .clone()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ServiceError::validation("role is required"))?;
        let allowed_tabs = input.tabs()?;
        Ok(SubAdmin {
            id: String::new(),
            name: fields.name,
            email: fields.email,
            phone_number: fields.phone_number,
            password: hash_password(&fields.password)?,
            role,
            allowed_tabs,
            is_active: fields.is_active,
            created_at: None,
            updated_at: None,
        })
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn password_hash(&self) -> &str {
        &self.password
    }

    fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    fn set_timestamps(&mut self, created_at: String, updated_at: String) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }

    fn token_tabs(&self) -> Option<Vec<String>> {
        Some(self.allowed_tabs.clone())
    }

    fn view(&self) -> SubAdminView {
        SubAdminView::from(self)
    }

    fn login_view(&self) -> SubAdminView {
        SubAdminView {
            created_at: None,
            updated_at: None,
            ..SubAdminView::from(self)
        }
    }

    fn identity(&self, token_email: &str) -> StaffIdentity {
        StaffIdentity {
            id: self.id.clone(),
            email: token_email.to_string(),
            role: Role::SubAdmin,
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
            is_active: self.is_active,
            allowed_tabs: self.allowed_tabs.clone(),
        }
    }
}

/// Account management for one staff collection
pub struct StaffService<T> {
    accounts: Collection<T>,
}

pub type AdminService = StaffService<Admin>;
pub type SubAdminService = StaffService<SubAdmin>;

impl<T: StaffAccount> StaffService<T> {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            accounts: Collection::new(store),
        }
    }

    pub async fn create(&self, input: &StaffInput) -> ServiceResult<T> {
        let mut account = T::build(input)?;
        let now = now_timestamp();
        account.set_timestamps(now.clone(), now);
        let account = self.accounts.create(account).await?;
        tracing::info!("Created {} account {}", T::ROLE, account.id());
        Ok(account)
    }

    pub async fn login(&self, input: &LoginInput) -> ServiceResult<T> {
        let (email, password) = input.credentials()?;
        let account = self
            .accounts
            .find_one(Query::new().filter(Filter::eq("email", email)))
            .await?
            .ok_or_else(|| ServiceError::unauthorized("invalid credentials"))?;
        if !password_matches(password, account.password_hash()) {
            return Err(ServiceError::unauthorized("invalid credentials"));
        }
        Ok(account)
    }

    pub async fn find(&self, id: &str) -> ServiceResult<Option<T>> {
        Ok(self.accounts.get(id).await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<T> {
        self.find(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Not found"))
    }

    pub async fn list(&self, page: &Page) -> ServiceResult<Vec<T>> {
        let query = page.apply(Query::new().order_by("createdAt", Direction::Desc));
        Ok(self.accounts.find(&query).await?)
    }

    /// Replace every field; `createdAt` comes from the body, else the stored one
    pub async fn replace(&self, id: &str, input: &StaffInput) -> ServiceResult<T> {
        let existing = self.get(id).await?;
        let mut account = T::build(input)?;
        account.set_id(id.to_string());
        let created_at = input
            .created_at
            .clone()
            .filter(|c| !c.is_empty())
            .or_else(|| existing.created_at().map(str::to_string))
            .unwrap_or_else(now_timestamp);
        account.set_timestamps(created_at, now_timestamp());
        self.accounts.set(&account).await?;
        Ok(account)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.accounts.delete(id).await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.accounts.delete_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use serde_json::json;

    async fn store() -> DynDocumentStore {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxDocumentStore::shared(pool)
    }

    fn input(value: Value) -> StaffInput {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_admin_create_and_login() {
        let admins = AdminService::new(store().await);
        let err = admins
            .create(&input(json!({"name": "Root", "password": "pw"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "email is required");

        let admin = admins
            .create(&input(json!({"name": "Root", "email": " Root@Firm.in ", "password": "pw"})))
            .await
            .unwrap();
        assert_eq!(admin.email, "root@firm.in");
        assert!(admin.is_active);
        assert_ne!(admin.password, "pw");

        let login = LoginInput { email: Some("ROOT@firm.in".into()), password: Some("pw".into()) };
        let found = admins.login(&login).await.unwrap();
        assert_eq!(found.id, admin.id);
        assert!(found.token_tabs().is_none());

        let view = serde_json::to_value(found.login_view()).unwrap();
        assert!(view.get("password").is_none());
        assert!(view.get("createdAt").is_none());
    }

    #[tokio::test]
    async fn test_sub_admin_tab_validation() {
        let subs = SubAdminService::new(store().await);
        let err = subs
            .create(&input(json!({"name": "Ops", "email": "o@x", "password": "pw"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "role is required");

        let err = subs
            .create(&input(json!({
                "name": "Ops", "email": "o@x", "password": "pw", "role": "Editor",
                "allowedTabs": ["Cases", "Billing", "Root"]
            })))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Invalid tab keys: Billing, Root. Valid keys are: {}", VALID_TABS.join(", "))
        );

        let sub = subs
            .create(&input(json!({
                "name": "Ops", "email": "o@x", "password": "pw", "role": "Editor",
                "allowedTabs": ["Cases", "News"]
            })))
            .await
            .unwrap();
        assert_eq!(sub.token_tabs(), Some(vec!["Cases".to_string(), "News".to_string()]));
        assert_eq!(sub.identity("o@x").allowed_tabs.len(), 2);
    }

    #[tokio::test]
    async fn test_replace_preserves_created_at() {
        let admins = AdminService::new(store().await);
        let admin = admins
            .create(&input(json!({"name": "A", "email": "a@x", "password": "pw"})))
            .await
            .unwrap();

        let replaced = admins
            .replace(&admin.id, &input(json!({"name": "B", "email": "b@x", "password": "pw2", "isActive": false})))
            .await
            .unwrap();
        assert_eq!(replaced.created_at, admin.created_at);
        assert_eq!(replaced.name, "B");
        assert!(!replaced.is_active);

        let err = admins.replace(&admin.id, &input(json!({"name": "B"}))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = admins.replace("missing", &input(json!({}))).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
