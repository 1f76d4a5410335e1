//! Community questions and the answers posted to them
//!
//! A question's `answersCount` is never trusted from storage: every read
//! recounts the `queryAnswers` pointing at it.

use futures::future::join_all;
use serde::Deserialize;

use crate::db::{Collection, Direction, DynDocumentStore, Filter, Query};
use crate::models::{lenient, now_timestamp, QueryAnswer, UserQuery, UserType};

use super::common::{present, required, Page};
use super::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub asked_by_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub asked_by_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub answers_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
}

impl QueryInput {
    fn into_query(self, created_at: String) -> UserQuery {
        UserQuery {
            id: String::new(),
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            asked_by_name: self.asked_by_name.unwrap_or_default(),
            asked_by_id: self.asked_by_id.unwrap_or_default(),
            answers_count: self
                .answers_count
                .filter(|n| *n > 0.0)
                .map(|n| n as u64)
                .unwrap_or(0),
            source: self.source.unwrap_or_default(),
            created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub query_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
}

impl AnswerInput {
    fn validate(self, id: String, created_at: String) -> ServiceResult<QueryAnswer> {
        let query_id = required(self.query_id, "queryId")?;
        let user_id = required(self.user_id, "userId")?;
        let user_type = required(self.user_type, "userType")?;
        let user_name = required(self.user_name, "userName")?;
        let answer = required(self.answer, "answer")?;
        let user_type = UserType::parse_loose(&user_type).ok_or_else(|| {
            ServiceError::validation(format!(
                "Invalid userType. Must be one of: {}",
                UserType::choices()
            ))
        })?;
        Ok(QueryAnswer {
            id,
            query_id,
            user_id,
            user_type,
            user_name,
            answer,
            created_at,
            updated_at: now_timestamp(),
        })
    }
}

/// Optional filters for the answer listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFilter {
    pub query_id: Option<String>,
    pub user_id: Option<String>,
    pub user_type: Option<String>,
}

pub struct QueryService {
    queries: Collection<UserQuery>,
    answers: Collection<QueryAnswer>,
}

impl QueryService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            queries: Collection::new(store.clone()),
            answers: Collection::new(store),
        }
    }

    async fn answer_count(&self, query_id: &str) -> u64 {
        match self.answers.count(&[Filter::eq("queryId", query_id)]).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!("Failed to count answers for query {}: {}", query_id, e);
                0
            }
        }
    }

    async fn with_counts(&self, queries: Vec<UserQuery>) -> Vec<UserQuery> {
        join_all(queries.into_iter().map(|mut query| async move {
            query.answers_count = self.answer_count(&query.id).await;
            query
        }))
        .await
    }

    pub async fn create(&self, input: QueryInput) -> ServiceResult<UserQuery> {
        if input.title.as_deref().map_or(true, str::is_empty) {
            return Err(ServiceError::validation("title is required"));
        }
        if input.asked_by_id.as_deref().map_or(true, str::is_empty) {
            return Err(ServiceError::validation("askedById is required"));
        }
        let query = input.into_query(now_timestamp());
        Ok(self.queries.create(query).await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<UserQuery> {
        let mut query = self
            .queries
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Not found"))?;
        query.answers_count = self.answer_count(id).await;
        Ok(query)
    }

    pub async fn list(&self, page: &Page) -> ServiceResult<Vec<UserQuery>> {
        let query = page.apply(Query::new().order_by("createdAt", Direction::Desc));
        let queries = self.queries.find(&query).await?;
        Ok(self.with_counts(queries).await)
    }

    pub async fn by_asker(&self, user_id: &str) -> ServiceResult<Vec<UserQuery>> {
        let query = Query::new()
            .filter(Filter::eq("askedById", user_id))
            .order_by("createdAt", Direction::Desc);
        let queries = self.queries.find(&query).await?;
        Ok(self.with_counts(queries).await)
    }

    /// Replace every field; `createdAt` falls back to the stored value
    pub async fn replace(&self, id: &str, input: QueryInput) -> ServiceResult<UserQuery> {
        let existing = self
            .queries
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Not found"))?;
        let created_at = present(input.created_at.clone()).unwrap_or(existing.created_at);
        let mut query = input.into_query(created_at);
        query.id = id.to_string();
        self.queries.set(&query).await?;
        Ok(query)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.queries.delete(id).await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> ServiceResult<u64> {
        Ok(self.queries.delete_all().await?)
    }

    pub async fn create_answer(&self, input: AnswerInput) -> ServiceResult<QueryAnswer> {
        let answer = input.validate(String::new(), now_timestamp())?;
        let answer = self.answers.create(answer).await?;
        tracing::debug!("Answer {} posted to query {}", answer.id, answer.query_id);
        Ok(answer)
    }

    pub async fn get_answer(&self, id: &str) -> ServiceResult<QueryAnswer> {
        self.answers
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Not found"))
    }

    pub async fn list_answers(
        &self,
        filter: AnswerFilter,
        page: &Page,
    ) -> ServiceResult<Vec<QueryAnswer>> {
        let user_type = filter
            .user_type
            .as_deref()
            .and_then(UserType::parse_loose);
        let query = Query::new()
            .filter_opt(present(filter.query_id), |v| Filter::eq("queryId", v))
            .filter_opt(present(filter.user_id), |v| Filter::eq("userId", v))
            .filter_opt(user_type, |t| Filter::eq("userType", t.as_str()))
            .order_by("createdAt", Direction::Desc);
        Ok(self.answers.find(&page.apply(query)).await?)
    }

    /// Answers to one question in the order they were posted
    pub async fn answers_for(&self, query_id: &str, limit: usize) -> ServiceResult<Vec<QueryAnswer>> {
        let query = Query::new()
            .filter(Filter::eq("queryId", query_id))
            .order_by("createdAt", Direction::Asc)
            .limit(limit);
        Ok(self.answers.find(&query).await?)
    }

    pub async fn answers_by(&self, user_id: &str, limit: usize) -> ServiceResult<Vec<QueryAnswer>> {
        let query = Query::new()
            .filter(Filter::eq("userId", user_id))
            .order_by("createdAt", Direction::Desc)
            .limit(limit);
        Ok(self.answers.find(&query).await?)
    }

    pub async fn replace_answer(&self, id: &str, input: AnswerInput) -> ServiceResult<QueryAnswer> {
        let existing = self.get_answer(id).await?;
        let created_at = present(input.created_at.clone()).unwrap_or(existing.created_at);
        let answer = input.validate(id.to_string(), created_at)?;
        self.answers.set(&answer).await?;
        Ok(answer)
    }

    pub async fn delete_answer(&self, id: &str) -> ServiceResult<()> {
        self.answers.delete(id).await?;
        Ok(())
    }

    pub async fn delete_all_answers(&self) -> ServiceResult<u64> {
        Ok(self.answers.delete_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use serde_json::json;

    async fn service() -> QueryService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        QueryService::new(SqlxDocumentStore::shared(pool))
    }

    fn answer(query_id: &str, user_type: &str) -> AnswerInput {
        serde_json::from_value(json!({
            "queryId": query_id,
            "userId": "lawyer-1",
            "userType": user_type,
            "userName": "Adv. Rao",
            "answer": "File a caveat before the hearing."
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_answers_count_is_recomputed() {
        let service = service().await;
        let input: QueryInput = serde_json::from_value(json!({
            "title": "Can I contest a will?",
            "askedById": "client-1",
            "answersCount": 42
        }))
        .unwrap();
        let query = service.create(input).await.unwrap();
        assert_eq!(query.answers_count, 42);
        assert_eq!(service.get(&query.id).await.unwrap().answers_count, 0);

        service.create_answer(answer(&query.id, "lawyer")).await.unwrap();
        service.create_answer(answer(&query.id, "ADMIN")).await.unwrap();
        assert_eq!(service.get(&query.id).await.unwrap().answers_count, 2);

        let listed = service.by_asker("client-1").await.unwrap();
        assert_eq!(listed[0].answers_count, 2);
    }

    #[tokio::test]
    async fn test_create_query_requires_fields() {
        let service = service().await;
        let err = service.create(QueryInput::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "title is required");

        let input: QueryInput = serde_json::from_value(json!({"title": "t"})).unwrap();
        let err = service.create(input).await.unwrap_err();
        assert_eq!(err.to_string(), "askedById is required");
    }

    #[tokio::test]
    async fn test_replace_keeps_created_at() {
        let service = service().await;
        let input: QueryInput =
            serde_json::from_value(json!({"title": "old", "askedById": "c"})).unwrap();
        let query = service.create(input).await.unwrap();

        let input: QueryInput = serde_json::from_value(json!({"title": "new"})).unwrap();
        let replaced = service.replace(&query.id, input).await.unwrap();
        assert_eq!(replaced.title, "new");
        assert_eq!(replaced.asked_by_id, "");
        assert_eq!(replaced.created_at, query.created_at);

        let missing = service.replace("nope", QueryInput::default()).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_answer_validation_and_filters() {
        let service = service().await;
        let err = service.create_answer(answer("q1", "guest")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid userType. Must be one of: CLIENT, LAWYER, ADMIN, SUBADMIN"
        );

        let mut missing = answer("q1", "lawyer");
        missing.user_name = None;
        assert_eq!(
            service.create_answer(missing).await.unwrap_err().to_string(),
            "userName is required"
        );

        let first = service.create_answer(answer("q1", "lawyer")).await.unwrap();
        assert_eq!(first.user_type, UserType::Lawyer);
        service.create_answer(answer("q2", "client")).await.unwrap();

        let filter = AnswerFilter {
            user_type: Some("client".into()),
            ..Default::default()
        };
        assert_eq!(service.list_answers(filter, &Page::default()).await.unwrap().len(), 1);

        let filter = AnswerFilter {
            user_type: Some("nobody".into()),
            ..Default::default()
        };
        assert_eq!(service.list_answers(filter, &Page::default()).await.unwrap().len(), 2);

        assert_eq!(service.answers_for("q1", 50).await.unwrap().len(), 1);
        assert_eq!(service.answers_by("lawyer-1", 1).await.unwrap().len(), 1);
    }
}
