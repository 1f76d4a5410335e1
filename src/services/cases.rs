//! Case diary service
//!
//! Cases are created with a fixed set of required fields and updated by
//! merging whatever fields the caller sends. Hearing and reminder dates are
//! normalized to stored timestamps so they can be range-queried.

use serde::Deserialize;
use serde_json::Value;

use crate::db::{Cmp, Collection, Direction, DynDocumentStore, Filter, Query};
use crate::models::{lenient, now_timestamp, parse_date, Case, CaseStatus};

use super::common::{required, Page};
use super::error::{ServiceError, ServiceResult};

const INVALID_STATUS: &str = "status must be OPEN, CLOSED, or ADJOURNED";

/// Case fields as sent by the app; used for both create and update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_by_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub case_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub case_type_and_registration: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub fir_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub partitionar_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub client_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub respondent_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub second_party_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub court_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub room_number: Option<String>,
    #[serde(default)]
    pub amount_received: Option<Value>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub judge_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub judge_post: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub remarks: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default)]
    pub next_hearing_date: Option<Value>,
    #[serde(default)]
    pub last_hearing_date: Option<Value>,
    #[serde(default)]
    pub remind_me_date: Option<Value>,
}

fn parse_status(raw: &str) -> ServiceResult<CaseStatus> {
    raw.parse()
        .map_err(|_| ServiceError::validation(INVALID_STATUS))
}

/// `null` clears a date; strings must parse
fn parse_date_field(value: &Value, field: &str) -> ServiceResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| ServiceError::validation(format!("{} must be a valid date", field))),
        _ => Err(ServiceError::validation(format!("{} must be a valid date", field))),
    }
}

fn optional_date(value: &Option<Value>, field: &str) -> ServiceResult<Option<String>> {
    match value {
        Some(v) => parse_date_field(v, field),
        None => Ok(None),
    }
}

/// `Number(x)` semantics for the amount; `null` stays `null`
fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

impl CaseInput {
    fn into_new_case(self) -> ServiceResult<Case> {
        let created_by_id = required(self.created_by_id, "createdById")?;
        let case_number = required(self.case_number, "caseNumber")?;
        let case_type_and_registration =
            required(self.case_type_and_registration, "caseTypeAndRegistration")?;
        let partitionar_name = required(self.partitionar_name, "partitionarName")?;
        let respondent_name = required(self.respondent_name, "respondentName")?;
        let court_name = required(self.court_name, "courtName")?;
        let judge_name = required(self.judge_name, "judgeName")?;
        let judge_post = required(self.judge_post, "judgePost")?;
        let purpose = required(self.purpose, "purpose")?;
        let status = match self.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => CaseStatus::Open,
        };

        let now = now_timestamp();
        Ok(Case {
            id: String::new(),
            created_by_id,
            case_number,
            case_type_and_registration,
            fir_number: self.fir_number.unwrap_or_default(),
            partitionar_name,
            client_number: self.client_number.unwrap_or_default(),
            respondent_name,
            second_party_number: self.second_party_number.unwrap_or_default(),
            court_name,
            room_number: self.room_number.unwrap_or_default(),
            amount_received: self.amount_received.as_ref().and_then(parse_amount),
            judge_name,
            judge_post,
            remarks: self.remarks.unwrap_or_default(),
            purpose,
            status,
            next_hearing_date: optional_date(&self.next_hearing_date, "nextHearingDate")?,
            last_hearing_date: optional_date(&self.last_hearing_date, "lastHearingDate")?,
            remind_me_date: optional_date(&self.remind_me_date, "remindMeDate")?,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Apply the present fields to an existing case
    fn merge_into(self, case: &mut Case) -> ServiceResult<()> {
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            case.status = parse_status(status)?;
        }

        let texts = [
            (self.created_by_id, &mut case.created_by_id),
            (self.case_number, &mut case.case_number),
            (self.case_type_and_registration, &mut case.case_type_and_registration),
            (self.fir_number, &mut case.fir_number),
            (self.partitionar_name, &mut case.partitionar_name),
            (self.client_number, &mut case.client_number),
            (self.respondent_name, &mut case.respondent_name),
            (self.second_party_number, &mut case.second_party_number),
            (self.court_name, &mut case.court_name),
            (self.room_number, &mut case.room_number),
            (self.judge_name, &mut case.judge_name),
            (self.judge_post, &mut case.judge_post),
            (self.remarks, &mut case.remarks),
            (self.purpose, &mut case.purpose),
        ];
        for (value, slot) in texts {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if let Some(amount) = &self.amount_received {
            case.amount_received = parse_amount(amount);
        }
        if let Some(date) = &self.next_hearing_date {
            case.next_hearing_date = parse_date_field(date, "nextHearingDate")?;
        }
        if let Some(date) = &self.last_hearing_date {
            case.last_hearing_date = parse_date_field(date, "lastHearingDate")?;
        }
        if let Some(date) = &self.remind_me_date {
            case.remind_me_date = parse_date_field(date, "remindMeDate")?;
        }
        case.updated_at = now_timestamp();
        Ok(())
    }
}

pub struct CaseService {
    cases: Collection<Case>,
}

impl CaseService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            cases: Collection::new(store),
        }
    }

    pub async fn create(&self, input: CaseInput) -> ServiceResult<Case> {
        let case = self.cases.create(input.into_new_case()?).await?;
        tracing::info!("Case {} created by {}", case.id, case.created_by_id);
        Ok(case)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Case> {
        self.cases
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Not found"))
    }

    pub async fn list(&self, page: &Page) -> ServiceResult<Vec<Case>> {
        let query = page.apply(Query::new().order_by("createdAt", Direction::Desc));
        Ok(self.cases.find(&query).await?)
    }

    pub async fn update(&self, id: &str, input: CaseInput) -> ServiceResult<Case> {
        let mut case = self.get(id).await?;
        input.merge_into(&mut case)?;
        self.cases.set(&case).await?;
        Ok(case)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.cases.delete(id).await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.cases.delete_all().await?)
    }

    /// Cases opened by one lawyer, optionally narrowed to a status
    pub async fn by_creator(
        &self,
        created_by_id: &str,
        status: Option<&str>,
        limit: usize,
    ) -> ServiceResult<Vec<Case>> {
        let query = Query::new()
            .filter(Filter::eq("createdById", created_by_id))
            .filter_opt(status.filter(|s| !s.is_empty()), |s| {
                Filter::eq("status", s.to_uppercase())
            })
            .order_by("createdAt", Direction::Desc)
            .limit(limit);
        Ok(self.cases.find(&query).await?)
    }

    pub async fn by_status(&self, status: &str, limit: usize) -> ServiceResult<Vec<Case>> {
        let status: CaseStatus = status.to_uppercase().parse().map_err(|_| {
            ServiceError::validation("Invalid status. Must be OPEN, CLOSED, or ADJOURNED")
        })?;
        let query = Query::new()
            .filter(Filter::eq("status", status.as_str()))
            .order_by("createdAt", Direction::Desc)
            .limit(limit);
        Ok(self.cases.find(&query).await?)
    }

    /// Active cases with a hearing from now on, soonest first
    pub async fn upcoming_hearings(&self, limit: usize) -> ServiceResult<Vec<Case>> {
        let query = Query::new()
            .filter(Filter::range("nextHearingDate", Cmp::Gte, now_timestamp()))
            .filter(active_statuses())
            .order_by("nextHearingDate", Direction::Asc)
            .limit(limit);
        Ok(self.cases.find(&query).await?)
    }

    /// Active cases whose reminder date has passed, latest first
    pub async fn overdue_reminders(&self) -> ServiceResult<Vec<Case>> {
        let query = Query::new()
            .filter(Filter::range("remindMeDate", Cmp::Lte, now_timestamp()))
            .filter(active_statuses())
            .order_by("remindMeDate", Direction::Desc);
        Ok(self.cases.find(&query).await?)
    }
}

fn active_statuses() -> Filter {
    Filter::is_in("status", CaseStatus::ACTIVE.map(|s| s.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use chrono::{Duration, Utc};
    use serde_json::json;

    async fn service() -> CaseService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        CaseService::new(SqlxDocumentStore::shared(pool))
    }

    fn input(extra: Value) -> CaseInput {
        let mut body = json!({
            "createdById": "lawyer-1",
            "caseNumber": "CS/112/2024",
            "caseTypeAndRegistration": "Civil Suit",
            "partitionarName": "R. Sharma",
            "respondentName": "M. Gupta",
            "courtName": "District Court",
            "judgeName": "A. Verma",
            "judgePost": "Civil Judge",
            "purpose": "Evidence"
        });
        if let (Some(base), Value::Object(extra)) = (body.as_object_mut(), extra) {
            base.extend(extra);
        }
        serde_json::from_value(body).unwrap()
    }

    fn days_from_now(days: i64) -> String {
        (Utc::now() + Duration::days(days)).to_rfc3339()
    }

    #[tokio::test]
    async fn test_create_validation() {
        let service = service().await;
        let err = service.create(input(json!({"judgePost": ""}))).await.unwrap_err();
        assert_eq!(err.to_string(), "judgePost is required");

        let err = service.create(input(json!({"status": "open"}))).await.unwrap_err();
        assert_eq!(err.to_string(), INVALID_STATUS);

        let err = service.create(input(json!({"nextHearingDate": "someday"}))).await.unwrap_err();
        assert_eq!(err.to_string(), "nextHearingDate must be a valid date");

        let case = service
            .create(input(json!({"amountReceived": "2500", "nextHearingDate": "2030-01-15"})))
            .await
            .unwrap();
        assert_eq!(case.status, CaseStatus::Open);
        assert_eq!(case.amount_received, Some(2500.0));
        assert_eq!(case.next_hearing_date.as_deref(), Some("2030-01-15T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_update_merges() {
        let service = service().await;
        let case = service.create(input(json!({"remarks": "first"}))).await.unwrap();

        let patch: CaseInput =
            serde_json::from_value(json!({"status": "ADJOURNED", "remindMeDate": null})).unwrap();
        let updated = service.update(&case.id, patch).await.unwrap();
        assert_eq!(updated.status, CaseStatus::Adjourned);
        assert_eq!(updated.remarks, "first");

        let bad: CaseInput = serde_json::from_value(json!({"status": "PAUSED"})).unwrap();
        assert!(matches!(service.update(&case.id, bad).await, Err(ServiceError::Validation(_))));

        let missing = service.update("nope", CaseInput::default()).await.unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_status_queries() {
        let service = service().await;
        service.create(input(json!({}))).await.unwrap();
        service.create(input(json!({"status": "CLOSED"}))).await.unwrap();
        service
            .create(input(json!({"createdById": "lawyer-2", "status": "CLOSED"})))
            .await
            .unwrap();

        assert_eq!(service.by_creator("lawyer-1", None, 50).await.unwrap().len(), 2);
        assert_eq!(service.by_creator("lawyer-1", Some("closed"), 50).await.unwrap().len(), 1);
        assert_eq!(service.by_status("closed", 50).await.unwrap().len(), 2);
        assert_eq!(
            service.by_status("pending", 50).await.unwrap_err().to_string(),
            "Invalid status. Must be OPEN, CLOSED, or ADJOURNED"
        );
    }

    #[tokio::test]
    async fn test_hearings_and_reminders() {
        let service = service().await;
        let soon = service
            .create(input(json!({"nextHearingDate": days_from_now(2), "remindMeDate": days_from_now(-1)})))
            .await
            .unwrap();
        let later = service
            .create(input(json!({"nextHearingDate": days_from_now(9), "status": "ADJOURNED"})))
            .await
            .unwrap();
        service
            .create(input(json!({"nextHearingDate": days_from_now(1), "status": "CLOSED",
                                 "remindMeDate": days_from_now(-3)})))
            .await
            .unwrap();
        service
            .create(input(json!({"nextHearingDate": days_from_now(-5)})))
            .await
            .unwrap();

        let upcoming: Vec<String> = service
            .upcoming_hearings(20)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(upcoming, vec![soon.id.clone(), later.id]);
        assert_eq!(service.upcoming_hearings(1).await.unwrap().len(), 1);

        let overdue = service.overdue_reminders().await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, soon.id);
    }
}
