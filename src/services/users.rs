//! Lawyer directory service
//!
//! Profiles are stored whole. Listing pushes the indexed filters down to the
//! store and applies experience, practice-category and free-text search in
//! memory over an enlarged window.

use serde::Deserialize;

use crate::db::{Collection, Direction, DynDocumentStore, Filter, Query};
use crate::models::{now_timestamp, ExperienceBucket, PracticeCategory, User};

use super::common::Page;
use super::error::{ServiceError, ServiceResult};

/// Most documents fetched when filtering in memory
const MAX_IN_MEMORY_WINDOW: usize = 500;

/// Directory filters; the value `all` disables a filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub court: Option<String>,
    pub city: Option<String>,
    pub specialization: Option<String>,
    pub language: Option<String>,
    pub profile_type: Option<String>,
    pub verified: Option<String>,
    pub exp: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty() && *v != "all")
}

impl UserFilter {
    fn store_filters(&self) -> ServiceResult<Vec<Filter>> {
        let array_filters = [&self.court, &self.specialization, &self.language]
            .into_iter()
            .filter(|f| active(f).is_some())
            .count();
        if array_filters > 1 {
            return Err(ServiceError::validation(
                "Cannot combine multiple array filters (court, specialization, language). Please use only one array filter at a time.",
            ));
        }

        let mut filters = Vec::new();
        if let Some(court) = active(&self.court) {
            filters.push(Filter::contains("courts", court));
        }
        if let Some(city) = active(&self.city) {
            filters.push(Filter::eq("city", city));
        }
        if let Some(specialization) = active(&self.specialization) {
            filters.push(Filter::contains("specializations", specialization));
        }
        if let Some(language) = active(&self.language) {
            filters.push(Filter::contains("languages", language));
        }
        if let Some(profile_type) = active(&self.profile_type) {
            filters.push(Filter::eq("userType", profile_type));
        }
        if let Some(verified) = active(&self.verified) {
            filters.push(Filter::eq("isVerify", verified == "Verified"));
        }
        Ok(filters)
    }

    fn filters_in_memory(&self) -> bool {
        active(&self.exp).is_some() || active(&self.category).is_some()
    }

    fn keep(&self, user: &User) -> bool {
        if let Some(exp) = active(&self.exp) {
            let Some(years) = user.experience_years() else {
                return false;
            };
            if let Some(bucket) = ExperienceBucket::parse(exp) {
                if !bucket.contains(years) {
                    return false;
                }
            }
        }

        if let Some(category) = active(&self.category).and_then(PracticeCategory::parse) {
            if !category.matches(user) {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => matches_search(user, &term.to_lowercase()),
            None => true,
        }
    }
}

fn matches_search(user: &User, term: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(term);
    user.full_name.as_deref().is_some_and(hit)
        || user.courts().iter().any(|c| hit(c))
        || user.specializations().iter().any(|s| hit(s))
        || user.city.as_deref().is_some_and(hit)
}

pub struct UserService {
    users: Collection<User>,
}

impl UserService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            users: Collection::new(store),
        }
    }

    /// Store a new profile; `email` is the only required field
    pub async fn create(&self, mut user: User) -> ServiceResult<User> {
        if user.email.as_deref().map_or(true, str::is_empty) {
            return Err(ServiceError::validation("email is required"));
        }
        user.created_at = Some(now_timestamp());
        Ok(self.users.create(user).await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<User> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Not found"))
    }

    pub async fn list(&self, filter: &UserFilter, page: &Page) -> ServiceResult<Vec<User>> {
        let mut query = Query::new().order_by("createdAt", Direction::Desc);
        query.filters = filter.store_filters()?;

        let window = if filter.filters_in_memory() {
            (page.limit * 3).min(MAX_IN_MEMORY_WINDOW)
        } else {
            page.limit
        };
        let fetched = self
            .users
            .find(&query.start_after(page.start_after.clone()).limit(window))
            .await?;

        Ok(fetched
            .into_iter()
            .filter(|user| filter.keep(user))
            .take(page.limit)
            .collect())
    }

    /// Replace a profile. `createdAt` comes from the body, else the stored one.
    pub async fn replace(&self, id: &str, mut user: User) -> ServiceResult<User> {
        let existing = self.get(id).await?;
        user.id = id.to_string();
        if user.created_at.is_none() {
            user.created_at = existing.created_at.or_else(|| Some(now_timestamp()));
        }
        self.users.set(&user).await?;
        Ok(user)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.users.delete(id).await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.users.delete_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use serde_json::json;

    async fn service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        UserService::new(SqlxDocumentStore::shared(pool))
    }

    fn user(value: serde_json::Value) -> User {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_requires_email() {
        let service = service().await;
        let err = service.create(user(json!({"fullName": "A"}))).await.unwrap_err();
        assert_eq!(err.to_string(), "email is required");

        let created = service
            .create(user(json!({"email": "a@law.in", "fullName": "A"})))
            .await
            .unwrap();
        assert!(!created.id.is_empty());
        assert!(created.created_at.is_some());
        assert_eq!(service.get(&created.id).await.unwrap().full_name.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_list_rejects_two_array_filters() {
        let service = service().await;
        let filter = UserFilter {
            court: Some("High Court".into()),
            language: Some("Hindi".into()),
            ..Default::default()
        };
        let err = service.list(&filter, &Page::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let filter = UserFilter {
            court: Some("High Court".into()),
            language: Some("all".into()),
            ..Default::default()
        };
        assert!(service.list(&filter, &Page::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let service = service().await;
        let profiles = [
            json!({"email": "a@x", "fullName": "Asha Rao", "city": "Pune", "yearsOfExperience": 3,
                   "specializations": ["Divorce"], "courts": ["Pune District Court"], "isVerify": true}),
            json!({"email": "b@x", "fullName": "Bharat Singh", "city": "Delhi", "yearsOfExperience": 12,
                   "specializations": ["Bail"], "courts": ["Supreme Court of India"], "isVerify": false}),
            json!({"email": "c@x", "fullName": "Chitra Nair", "city": "Delhi", "yearsOfExperience": "9",
                   "specializations": ["Property"], "courts": []}),
        ];
        for p in profiles {
            service.create(user(p)).await.unwrap();
        }

        let names = |users: Vec<User>| {
            let mut names: Vec<String> = users.into_iter().filter_map(|u| u.full_name).collect();
            names.sort();
            names
        };

        let delhi = UserFilter { city: Some("Delhi".into()), ..Default::default() };
        assert_eq!(names(service.list(&delhi, &Page::default()).await.unwrap()), ["Bharat Singh", "Chitra Nair"]);

        let senior = UserFilter { exp: Some("10+".into()), ..Default::default() };
        assert_eq!(names(service.list(&senior, &Page::default()).await.unwrap()), ["Bharat Singh"]);

        let family = UserFilter { category: Some("Family Matters".into()), ..Default::default() };
        assert_eq!(names(service.list(&family, &Page::default()).await.unwrap()), ["Asha Rao"]);

        let supreme = UserFilter { category: Some("Supreme Court Matters".into()), ..Default::default() };
        assert_eq!(names(service.list(&supreme, &Page::default()).await.unwrap()), ["Bharat Singh"]);

        let verified = UserFilter { verified: Some("Verified".into()), ..Default::default() };
        assert_eq!(names(service.list(&verified, &Page::default()).await.unwrap()), ["Asha Rao"]);

        let search = UserFilter { search: Some("  PROPERTY ".into()), ..Default::default() };
        assert_eq!(names(service.list(&search, &Page::default()).await.unwrap()), ["Chitra Nair"]);

        let one = service.list(&UserFilter::default(), &Page::new(1)).await.unwrap();
        assert_eq!(one.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_keeps_created_at() {
        let service = service().await;
        let created = service.create(user(json!({"email": "a@x"}))).await.unwrap();

        let replaced = service
            .replace(&created.id, user(json!({"email": "new@x", "bio": "Advocate"})))
            .await
            .unwrap();
        assert_eq!(replaced.created_at, created.created_at);
        assert_eq!(replaced.bio, "Advocate");

        let err = service.replace("missing", user(json!({}))).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
