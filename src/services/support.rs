//! Support tickets and the staff replies threaded onto them

use serde::Deserialize;
use serde_json::Value;

use crate::db::{Collection, Direction, DynDocumentStore, Filter, Query};
use crate::models::{lenient, now_timestamp, Support, SupportAnswer, SupportStatus, UserType};

use super::common::{present, required, Page};
use super::error::{ServiceError, ServiceResult};

fn invalid_status() -> ServiceError {
    ServiceError::validation(format!(
        "Invalid status. Must be one of: {}",
        SupportStatus::choices()
    ))
}

fn parse_status(raw: &str) -> ServiceResult<SupportStatus> {
    SupportStatus::parse_loose(raw).ok_or_else(invalid_status)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub answers: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
}

impl SupportInput {
    fn validate(self, id: String, created_at: String) -> ServiceResult<Support> {
        let user_id = required(self.user_id, "userId")?;
        let user_type = required(self.user_type, "userType")?;
        let purpose = required(self.purpose, "purpose")?;
        let category = required(self.category, "category")?;
        let title = required(self.title, "title")?;
        let description = required(self.description, "description")?;
        let user_type = UserType::parse_loose(&user_type).ok_or_else(|| {
            ServiceError::validation(format!(
                "Invalid userType. Must be one of: {}",
                UserType::choices()
            ))
        })?;
        let status = match self.status.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => parse_status(raw)?,
            None => SupportStatus::Pending,
        };
        Ok(Support {
            id,
            user_id,
            user_type,
            purpose,
            category,
            title,
            description,
            status,
            answers: self.answers.unwrap_or_default(),
            created_at,
            updated_at: now_timestamp(),
        })
    }
}

/// Listing filters; unknown status or user type values are ignored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportFilter {
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub user_type: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub answered_by: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub answered_by_type: Option<String>,
}

impl ReplyInput {
    fn validate(self) -> ServiceResult<SupportAnswer> {
        let answer = present(self.answer)
            .map(|a| a.trim().to_string())
            .ok_or_else(|| ServiceError::validation("Answer is required"))?;
        let answered_by = required(self.answered_by, "answeredBy")?;
        let answered_by_type = self
            .answered_by_type
            .as_deref()
            .and_then(UserType::parse_loose)
            .filter(|t| matches!(t, UserType::Admin | UserType::Subadmin))
            .ok_or_else(|| {
                ServiceError::validation("Valid answeredByType is required (ADMIN or SUBADMIN)")
            })?;
        Ok(SupportAnswer {
            id: uuid::Uuid::new_v4().simple().to_string(),
            answer,
            answered_by,
            answered_by_type,
            answered_at: now_timestamp(),
        })
    }
}

pub struct SupportService {
    tickets: Collection<Support>,
}

impl SupportService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            tickets: Collection::new(store),
        }
    }

    pub async fn create(&self, input: SupportInput) -> ServiceResult<Support> {
        let ticket = input.validate(String::new(), now_timestamp())?;
        let ticket = self.tickets.create(ticket).await?;
        tracing::info!("Support ticket {} opened by {}", ticket.id, ticket.user_id);
        Ok(ticket)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Support> {
        self.tickets
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Not found"))
    }

    async fn ticket(&self, id: &str) -> ServiceResult<Support> {
        self.tickets
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Support ticket not found"))
    }

    pub async fn list(&self, filter: SupportFilter, page: &Page) -> ServiceResult<Vec<Support>> {
        let status = filter.status.as_deref().and_then(SupportStatus::parse_loose);
        let user_type = filter.user_type.as_deref().and_then(UserType::parse_loose);
        let query = Query::new()
            .filter_opt(status, |s| Filter::eq("status", s.as_str()))
            .filter_opt(present(filter.user_id), |v| Filter::eq("userId", v))
            .filter_opt(user_type, |t| Filter::eq("userType", t.as_str()))
            .filter_opt(present(filter.category), |v| Filter::eq("category", v))
            .order_by("createdAt", Direction::Desc);
        Ok(self.tickets.find(&page.apply(query)).await?)
    }

    pub async fn by_user(
        &self,
        user_id: &str,
        status: Option<&str>,
        limit: usize,
    ) -> ServiceResult<Vec<Support>> {
        let status = status.and_then(SupportStatus::parse_loose);
        let query = Query::new()
            .filter(Filter::eq("userId", user_id))
            .filter_opt(status, |s| Filter::eq("status", s.as_str()))
            .order_by("createdAt", Direction::Desc)
            .limit(limit);
        Ok(self.tickets.find(&query).await?)
    }

    pub async fn by_status(&self, status: &str, limit: usize) -> ServiceResult<Vec<Support>> {
        let status = parse_status(status)?;
        let query = Query::new()
            .filter(Filter::eq("status", status.as_str()))
            .order_by("createdAt", Direction::Desc)
            .limit(limit);
        Ok(self.tickets.find(&query).await?)
    }

    pub async fn replace(&self, id: &str, input: SupportInput) -> ServiceResult<Support> {
        let existing = self.get(id).await?;
        let created_at = present(input.created_at.clone()).unwrap_or(existing.created_at);
        let ticket = input.validate(id.to_string(), created_at)?;
        self.tickets.set(&ticket).await?;
        Ok(ticket)
    }

    pub async fn set_status(&self, id: &str, status: Option<&str>) -> ServiceResult<Support> {
        let status = status
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ServiceError::validation("Status is required"))?;
        let status = parse_status(status)?;
        let mut ticket = self.ticket(id).await?;
        ticket.status = status;
        ticket.updated_at = now_timestamp();
        self.tickets.set(&ticket).await?;
        Ok(ticket)
    }

    /// Append a staff reply to the ticket's thread
    pub async fn add_answer(&self, id: &str, input: ReplyInput) -> ServiceResult<Support> {
        let answer = input.validate()?;
        let mut ticket = self.ticket(id).await?;
        let answer = serde_json::to_value(&answer).map_err(anyhow::Error::from)?;
        ticket.answers.push(answer);
        ticket.updated_at = now_timestamp();
        self.tickets.set(&ticket).await?;
        Ok(ticket)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.tickets.delete(id).await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.tickets.delete_all().await?)
    }
}
