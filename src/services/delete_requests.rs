//! Account deletion requests and their admin review

use serde::Deserialize;

use crate::db::{Collection, Direction, DynDocumentStore, Filter, Query};
use crate::models::{
    lenient, now_timestamp, DeleteRequest, STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED,
};

use super::common::{present, required, Page};
use super::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequestInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub admin_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reviewed_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reviewed_by: Option<String>,
}

impl DeleteRequestInput {
    fn validate(self, requested_at: String) -> ServiceResult<DeleteRequest> {
        Ok(DeleteRequest {
            id: String::new(),
            user_id: required(self.user_id, "userId")?,
            user_name: self.user_name.unwrap_or_default(),
            user_email: self.user_email.unwrap_or_default(),
            user_phone: self.user_phone.unwrap_or_default(),
            reason: required(self.reason, "reason")?,
            status: present(self.status).unwrap_or_else(|| STATUS_PENDING.to_string()),
            admin_notes: self.admin_notes,
            requested_at,
            reviewed_at: present(self.reviewed_at),
            reviewed_by: present(self.reviewed_by),
        })
    }
}

/// Body of `PATCH /{id}/review`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecision {
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub admin_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reviewed_by: Option<String>,
}

pub struct DeleteRequestService {
    requests: Collection<DeleteRequest>,
}

impl DeleteRequestService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            requests: Collection::new(store),
        }
    }

    /// File a request; a user may only have one pending at a time
    pub async fn create(&self, input: DeleteRequestInput) -> ServiceResult<DeleteRequest> {
        let mut request = input.validate(now_timestamp())?;
        request.reviewed_at = None;
        request.reviewed_by = None;

        let pending = Query::new()
            .filter(Filter::eq("userId", request.user_id.as_str()))
            .filter(Filter::eq("status", STATUS_PENDING));
        if self.requests.find_one(pending).await?.is_some() {
            return Err(ServiceError::validation(
                "User already has a pending delete request",
            ));
        }

        let request = self.requests.create(request).await?;
        tracing::info!("Delete request {} filed for user {}", request.id, request.user_id);
        Ok(request)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<DeleteRequest> {
        self.requests
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Not found"))
    }

    pub async fn list(&self, status: Option<String>, page: &Page) -> ServiceResult<Vec<DeleteRequest>> {
        let query = Query::new()
            .filter_opt(present(status), |s| Filter::eq("status", s))
            .order_by("requestedAt", Direction::Desc);
        Ok(self.requests.find(&page.apply(query)).await?)
    }

    pub async fn by_user(&self, user_id: &str) -> ServiceResult<Vec<DeleteRequest>> {
        let query = Query::new()
            .filter(Filter::eq("userId", user_id))
            .order_by("requestedAt", Direction::Desc);
        Ok(self.requests.find(&query).await?)
    }

    pub async fn by_status(&self, status: &str) -> ServiceResult<Vec<DeleteRequest>> {
        let query = Query::new()
            .filter(Filter::eq("status", status))
            .order_by("requestedAt", Direction::Desc);
        Ok(self.requests.find(&query).await?)
    }

    pub async fn replace(&self, id: &str, input: DeleteRequestInput) -> ServiceResult<DeleteRequest> {
        let existing = self.get(id).await?;
        let mut request = input.validate(existing.requested_at)?;
        request.id = existing.id;
        request.reviewed_at = request.reviewed_at.or(existing.reviewed_at);
        request.reviewed_by = request.reviewed_by.or(existing.reviewed_by);
        self.requests.set(&request).await?;
        Ok(request)
    }

    /// Record an admin's approve/reject decision
    pub async fn review(&self, id: &str, decision: ReviewDecision) -> ServiceResult<DeleteRequest> {
        let status = decision
            .status
            .filter(|s| s == STATUS_APPROVED || s == STATUS_REJECTED)
            .ok_or_else(|| ServiceError::validation("status must be \"approved\" or \"rejected\""))?;
        let mut request = self.get(id).await?;
        request.status = status;
        request.admin_notes = present(decision.admin_notes);
        request.reviewed_at = Some(now_timestamp());
        request.reviewed_by = present(decision.reviewed_by);
        self.requests.set(&request).await?;
        tracing::info!("Delete request {} {}", request.id, request.status);
        Ok(request)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.requests.delete(id).await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.requests.delete_all().await?)
    }
}
