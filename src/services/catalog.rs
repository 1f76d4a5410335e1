//! Offered services and client bookings

use serde::Deserialize;
use serde_json::Value;

use crate::db::{Collection, Direction, DynDocumentStore, Filter, Query};
use crate::models::{lenient, now_timestamp, Service, ServiceBooked};

use super::common::{required_trimmed, trimmed};
use super::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub categories: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub number: Option<String>,
}

impl ServiceInput {
    fn validate(self, created_at: String) -> ServiceResult<Service> {
        Ok(Service {
            id: String::new(),
            name: required_trimmed(self.name, "name")?,
            description: required_trimmed(self.description, "description")?,
            categories: self.categories.unwrap_or_default(),
            number: trimmed(self.number),
            created_at,
            updated_at: now_timestamp(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub services_booked: Option<Vec<Value>>,
}

impl BookingInput {
    fn validate(self, created_at: String) -> ServiceResult<ServiceBooked> {
        Ok(ServiceBooked {
            id: String::new(),
            client_id: required_trimmed(self.client_id, "clientId")?,
            phone_number: required_trimmed(self.phone_number, "phoneNumber")?,
            title: required_trimmed(self.title, "title")?,
            description: trimmed(self.description),
            services_booked: self.services_booked.unwrap_or_default(),
            created_at,
            updated_at: now_timestamp(),
        })
    }
}

pub struct CatalogService {
    services: Collection<Service>,
    bookings: Collection<ServiceBooked>,
}

impl CatalogService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            services: Collection::new(store.clone()),
            bookings: Collection::new(store),
        }
    }

    pub async fn create_service(&self, input: ServiceInput) -> ServiceResult<Service> {
        let service = input.validate(now_timestamp())?;
        Ok(self.services.create(service).await?)
    }

    pub async fn get_service(&self, id: &str) -> ServiceResult<Service> {
        self.services
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service not found"))
    }

    pub async fn list_services(&self, limit: usize) -> ServiceResult<Vec<Service>> {
        let query = Query::new()
            .order_by("createdAt", Direction::Desc)
            .limit(limit);
        Ok(self.services.find(&query).await?)
    }

    pub async fn replace_service(&self, id: &str, input: ServiceInput) -> ServiceResult<Service> {
        let mut service = input.validate(String::new())?;
        let existing = self.get_service(id).await?;
        service.id = existing.id;
        service.created_at = existing.created_at;
        self.services.set(&service).await?;
        Ok(service)
    }

    pub async fn delete_service(&self, id: &str) -> ServiceResult<()> {
        if !self.services.delete(id).await? {
            return Err(ServiceError::not_found("Service not found"));
        }
        Ok(())
    }

    pub async fn delete_all_services(&self) -> ServiceResult<u64> {
        Ok(self.services.delete_all().await?)
    }

    pub async fn create_booking(&self, input: BookingInput) -> ServiceResult<ServiceBooked> {
        let booking = input.validate(now_timestamp())?;
        let booking = self.bookings.create(booking).await?;
        tracing::info!("Client {} booked {}", booking.client_id, booking.id);
        Ok(booking)
    }

    pub async fn get_booking(&self, id: &str) -> ServiceResult<ServiceBooked> {
        self.bookings
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service booking not found"))
    }

    pub async fn list_bookings(&self, limit: usize) -> ServiceResult<Vec<ServiceBooked>> {
        let query = Query::new()
            .order_by("createdAt", Direction::Desc)
            .limit(limit);
        Ok(self.bookings.find(&query).await?)
    }

    pub async fn bookings_for(&self, client_id: &str) -> ServiceResult<Vec<ServiceBooked>> {
        let query = Query::new()
            .filter(Filter::eq("clientId", client_id))
            .order_by("createdAt", Direction::Desc);
        Ok(self.bookings.find(&query).await?)
    }

    pub async fn replace_booking(&self, id: &str, input: BookingInput) -> ServiceResult<ServiceBooked> {
        let mut booking = input.validate(String::new())?;
        let existing = self.get_booking(id).await?;
        booking.id = existing.id;
        booking.created_at = existing.created_at;
        self.bookings.set(&booking).await?;
        Ok(booking)
    }

    pub async fn delete_booking(&self, id: &str) -> ServiceResult<()> {
        if !self.bookings.delete(id).await? {
            return Err(ServiceError::not_found("Service booking not found"));
        }
        Ok(())
    }

    pub async fn delete_all_bookings(&self) -> ServiceResult<u64> {
        Ok(self.bookings.delete_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use serde_json::json;

    async fn service() -> CatalogService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        CatalogService::new(SqlxDocumentStore::shared(pool))
    }

    #[tokio::test]
    async fn test_service_fields_are_trimmed() {
        let catalog = service().await;
        let input: ServiceInput = serde_json::from_value(json!({
            "name": "  Property Registration ",
            "description": " Sale deed drafting ",
            "categories": "not-a-list",
            "number": 9876543210u64
        }))
        .unwrap();
        let created = catalog.create_service(input).await.unwrap();
        assert_eq!(created.name, "Property Registration");
        assert!(created.categories.is_empty());
        assert_eq!(created.number, "9876543210");

        let blank: ServiceInput = serde_json::from_value(json!({"name": "   "})).unwrap();
        assert_eq!(
            catalog.create_service(blank).await.unwrap_err().to_string(),
            "name is required"
        );
    }

    #[tokio::test]
    async fn test_replace_and_delete_service() {
        let catalog = service().await;
        let input: ServiceInput =
            serde_json::from_value(json!({"name": "Notary", "description": "Attestation"})).unwrap();
        let created = catalog.create_service(input.clone()).await.unwrap();

        let replaced = catalog.replace_service(&created.id, input.clone()).await.unwrap();
        assert_eq!(replaced.created_at, created.created_at);
        assert!(matches!(
            catalog.replace_service("missing", input).await,
            Err(ServiceError::NotFound(_))
        ));

        catalog.delete_service(&created.id).await.unwrap();
        assert_eq!(
            catalog.delete_service(&created.id).await.unwrap_err().to_string(),
            "Service not found"
        );
    }

    #[tokio::test]
    async fn test_bookings_by_client() {
        let catalog = service().await;
        for title in ["Will drafting", "Consultation"] {
            let input: BookingInput = serde_json::from_value(json!({
                "clientId": "client-7",
                "phoneNumber": "99999",
                "title": title,
                "servicesBooked": [{"id": "svc-1"}]
            }))
            .unwrap();
            catalog.create_booking(input).await.unwrap();
        }
        let missing: BookingInput =
            serde_json::from_value(json!({"clientId": "c", "title": "t"})).unwrap();
        assert_eq!(
            catalog.create_booking(missing).await.unwrap_err().to_string(),
            "phoneNumber is required"
        );

        let bookings = catalog.bookings_for("client-7").await.unwrap();
        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[0].services_booked, vec![json!({"id": "svc-1"})]);
        assert!(catalog.bookings_for("other").await.unwrap().is_empty());
    }
}
