//! Blogs, news posts and notifications
//!
//! All three follow the same shape: trimmed text fields, a couple of
//! boolean flags coerced from `true`/`"true"`, full replacement on update
//! and `createdAt` ordering for listings.

use serde::Deserialize;

use crate::db::{Collection, Direction, Document, DynDocumentStore, Filter, Query};
use crate::models::{lenient, now_timestamp, parse_flag, Blog, News, Notification};

use super::common::{eq_filter, required_trimmed, trimmed, Page};
use super::error::{ServiceError, ServiceResult};

/// Query-string filters shared by the content listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentFilter {
    pub category: Option<String>,
    pub source: Option<String>,
    pub published: Option<String>,
    pub trending: Option<String>,
    pub read: Option<String>,
}

/// A present flag parameter filters; unrecognised values fall back to `default`
fn flag_filter(field: &'static str, raw: Option<&str>, default: bool) -> Option<Filter> {
    raw.map(|v| Filter::eq(field, parse_flag(v).unwrap_or(default)))
}

fn trimmed_filter(field: &'static str, raw: Option<String>) -> Option<Filter> {
    eq_filter(field, raw.map(|v| v.trim().to_string()))
}

async fn get_or_404<T: Document>(collection: &Collection<T>, id: &str) -> ServiceResult<T> {
    collection
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Not found"))
}

async fn list_newest<T: Document>(
    collection: &Collection<T>,
    filters: impl IntoIterator<Item = Option<Filter>>,
    page: &Page,
) -> ServiceResult<Vec<T>> {
    let query = filters
        .into_iter()
        .fold(Query::new(), |query, filter| query.filter_opt(filter, |f| f))
        .order_by("createdAt", Direction::Desc);
    Ok(collection.find(&page.apply(query)).await?)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub subtitle: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub published: Option<bool>,
}

impl BlogInput {
    fn validate(self, created_at: String) -> ServiceResult<Blog> {
        Ok(Blog {
            id: String::new(),
            title: required_trimmed(self.title, "title")?,
            category: trimmed(self.category),
            subtitle: trimmed(self.subtitle),
            description: required_trimmed(self.description, "description")?,
            image: trimmed(self.image),
            published: self.published.unwrap_or(true),
            created_at,
            updated_at: now_timestamp(),
        })
    }
}

pub struct BlogService {
    blogs: Collection<Blog>,
}

impl BlogService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            blogs: Collection::new(store),
        }
    }

    pub async fn create(&self, input: BlogInput) -> ServiceResult<Blog> {
        let blog = input.validate(now_timestamp())?;
        Ok(self.blogs.create(blog).await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Blog> {
        get_or_404(&self.blogs, id).await
    }

    pub async fn list(&self, filter: ContentFilter, page: &Page) -> ServiceResult<Vec<Blog>> {
        let filters = [
            trimmed_filter("category", filter.category),
            flag_filter("published", filter.published.as_deref(), true),
        ];
        list_newest(&self.blogs, filters, page).await
    }

    pub async fn replace(&self, id: &str, input: BlogInput) -> ServiceResult<Blog> {
        let mut blog = input.validate(String::new())?;
        let existing = self.get(id).await?;
        blog.id = existing.id;
        blog.created_at = existing.created_at;
        self.blogs.set(&blog).await?;
        Ok(blog)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.blogs.delete(id).await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.blogs.delete_all().await?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub brief: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub live_link: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub views: Option<f64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_trending: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub published: Option<bool>,
}

impl NewsInput {
    fn validate(self, created_at: String) -> ServiceResult<News> {
        Ok(News {
            id: String::new(),
            title: required_trimmed(self.title, "title")?,
            image_url: required_trimmed(self.image_url, "imageUrl")?,
            description: trimmed(self.description),
            brief: trimmed(self.brief),
            source: trimmed(self.source),
            live_link: trimmed(self.live_link),
            category: trimmed(self.category),
            views: self.views.map(|v| v.floor() as i64).unwrap_or(0),
            is_trending: self.is_trending.unwrap_or(false),
            published: self.published.unwrap_or(true),
            created_at,
            updated_at: now_timestamp(),
        })
    }
}

pub struct NewsService {
    news: Collection<News>,
}

impl NewsService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            news: Collection::new(store),
        }
    }

    pub async fn create(&self, input: NewsInput) -> ServiceResult<News> {
        let post = input.validate(now_timestamp())?;
        Ok(self.news.create(post).await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<News> {
        get_or_404(&self.news, id).await
    }

    pub async fn list(&self, filter: ContentFilter, page: &Page) -> ServiceResult<Vec<News>> {
        let filters = [
            trimmed_filter("category", filter.category),
            trimmed_filter("source", filter.source),
            flag_filter("published", filter.published.as_deref(), true),
            flag_filter("isTrending", filter.trending.as_deref(), false),
        ];
        list_newest(&self.news, filters, page).await
    }

    pub async fn replace(&self, id: &str, input: NewsInput) -> ServiceResult<News> {
        let mut post = input.validate(String::new())?;
        let existing = self.get(id).await?;
        post.id = existing.id;
        post.created_at = existing.created_at;
        self.news.set(&post).await?;
        Ok(post)
    }

    /// Count one more view
    pub async fn increment_views(&self, id: &str) -> ServiceResult<News> {
        if !self.news.increment(id, "views", &now_timestamp()).await? {
            return Err(ServiceError::not_found("Not found"));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.news.delete(id).await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.news.delete_all().await?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub published: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub read: Option<bool>,
}

impl NotificationInput {
    fn validate(self, created_at: String) -> ServiceResult<Notification> {
        Ok(Notification {
            id: String::new(),
            title: required_trimmed(self.title, "title")?,
            description: required_trimmed(self.description, "description")?,
            image: trimmed(self.image),
            published: self.published.unwrap_or(true),
            read: self.read.unwrap_or(false),
            created_at,
            updated_at: now_timestamp(),
        })
    }
}

pub struct NotificationService {
    notifications: Collection<Notification>,
}

impl NotificationService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            notifications: Collection::new(store),
        }
    }

    pub async fn create(&self, input: NotificationInput) -> ServiceResult<Notification> {
        let notification = input.validate(now_timestamp())?;
        Ok(self.notifications.create(notification).await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Notification> {
        get_or_404(&self.notifications, id).await
    }

    pub async fn list(
        &self,
        filter: ContentFilter,
        page: &Page,
    ) -> ServiceResult<Vec<Notification>> {
        let filters = [
            flag_filter("published", filter.published.as_deref(), true),
            flag_filter("read", filter.read.as_deref(), false),
        ];
        list_newest(&self.notifications, filters, page).await
    }

    pub async fn replace(&self, id: &str, input: NotificationInput) -> ServiceResult<Notification> {
        let mut notification = input.validate(String::new())?;
        let existing = self.get(id).await?;
        notification.id = existing.id;
        notification.created_at = existing.created_at;
        self.notifications.set(&notification).await?;
        Ok(notification)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.notifications.delete(id).await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.notifications.delete_all().await?)
    }
}
