//! Records of clients reaching out to lawyers
//!
//! A (client, lawyer) pair has one live contact record: a repeat contact
//! refreshes the latest record instead of creating another.

use serde::Deserialize;

use crate::db::{Collection, Direction, DynDocumentStore, Filter, Query};
use crate::models::{lenient, now_timestamp, ClientContact, ContactStatus, DEFAULT_CONTACT_TYPE};

use super::common::present;
use super::error::{ServiceError, ServiceResult};

const NOT_FOUND: &str = "Client contact not found";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub lawyer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub contact_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: Option<String>,
}

/// Outcome of recording a contact
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Created(ClientContact),
    /// The pair already had a record; it holds the state before the refresh
    Refreshed(ClientContact),
}

fn parse_status(raw: Option<&str>) -> ServiceResult<ContactStatus> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::validation("Status is required"))?;
    raw.parse().map_err(|_| {
        ServiceError::validation(format!(
            "Invalid status. Must be one of: {}",
            ContactStatus::choices()
        ))
    })
}

pub struct ClientContactService {
    contacts: Collection<ClientContact>,
}

impl ClientContactService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            contacts: Collection::new(store),
        }
    }

    async fn latest_for_pair(&self, client_id: &str, lawyer_id: &str) -> ServiceResult<Option<ClientContact>> {
        let query = Query::new()
            .filter(Filter::eq("clientId", client_id))
            .filter(Filter::eq("lawyerId", lawyer_id))
            .order_by("contactDate", Direction::Desc);
        Ok(self.contacts.find_one(query).await?)
    }

    pub async fn record(&self, input: ContactInput) -> ServiceResult<Recorded> {
        let (Some(client_id), Some(lawyer_id)) = (present(input.client_id), present(input.lawyer_id))
        else {
            return Err(ServiceError::validation("clientId and lawyerId are required"));
        };

        if let Some(existing) = self.latest_for_pair(&client_id, &lawyer_id).await? {
            let mut refreshed = existing.clone();
            if refreshed.status == ContactStatus::Initiated {
                refreshed.status = ContactStatus::Responded;
            }
            if let Some(conversation_id) = present(input.conversation_id) {
                refreshed.conversation_id = Some(conversation_id);
            }
            if let Some(notes) = present(input.notes) {
                refreshed.notes = notes;
            }
            refreshed.last_activity = now_timestamp();
            self.contacts.set(&refreshed).await?;
            return Ok(Recorded::Refreshed(existing));
        }

        let now = now_timestamp();
        let contact = ClientContact {
            id: String::new(),
            client_id,
            lawyer_id,
            contact_type: present(input.contact_type)
                .unwrap_or_else(|| DEFAULT_CONTACT_TYPE.to_string()),
            status: ContactStatus::Initiated,
            conversation_id: present(input.conversation_id),
            contact_date: now.clone(),
            last_activity: now,
            notes: input.notes.unwrap_or_default(),
        };
        let contact = self.contacts.create(contact).await?;
        tracing::info!(
            "Client {} contacted lawyer {} ({})",
            contact.client_id,
            contact.lawyer_id,
            contact.contact_type
        );
        Ok(Recorded::Created(contact))
    }

    pub async fn get(&self, id: &str) -> ServiceResult<ClientContact> {
        self.contacts
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(NOT_FOUND))
    }

    async fn newest_by(&self, field: &'static str, value: &str) -> ServiceResult<Vec<ClientContact>> {
        let query = Query::new()
            .filter(Filter::eq(field, value))
            .order_by("contactDate", Direction::Desc);
        Ok(self.contacts.find(&query).await?)
    }

    pub async fn for_client(&self, client_id: &str) -> ServiceResult<Vec<ClientContact>> {
        self.newest_by("clientId", client_id).await
    }

    pub async fn for_lawyer(&self, lawyer_id: &str) -> ServiceResult<Vec<ClientContact>> {
        self.newest_by("lawyerId", lawyer_id).await
    }

    pub async fn for_conversation(&self, conversation_id: &str) -> ServiceResult<ClientContact> {
        self.contacts
            .find_one(Query::new().filter(Filter::eq("conversationId", conversation_id)))
            .await?
            .ok_or_else(|| ServiceError::not_found("No contact found for this conversation"))
    }

    pub async fn set_status(&self, id: &str, status: Option<&str>) -> ServiceResult<ClientContact> {
        let status = parse_status(status)?;
        let mut contact = self.get(id).await?;
        contact.status = status;
        contact.last_activity = now_timestamp();
        self.contacts.set(&contact).await?;
        Ok(contact)
    }

    /// Change contact type, status, conversation or notes
    pub async fn update(&self, id: &str, input: ContactInput) -> ServiceResult<ClientContact> {
        let contact_type = present(input.contact_type);
        let status = present(input.status);
        let conversation_id = present(input.conversation_id);
        if contact_type.is_none() && status.is_none() && conversation_id.is_none() && input.notes.is_none() {
            return Err(ServiceError::validation(
                "At least one field must be provided for update",
            ));
        }
        let status = status.as_deref().map(|s| parse_status(Some(s))).transpose()?;

        let mut contact = self.get(id).await?;
        if let Some(contact_type) = contact_type {
            contact.contact_type = contact_type;
        }
        if let Some(status) = status {
            contact.status = status;
        }
        if conversation_id.is_some() {
            contact.conversation_id = conversation_id;
        }
        if let Some(notes) = input.notes {
            contact.notes = notes;
        }
        contact.last_activity = now_timestamp();
        self.contacts.set(&contact).await?;
        Ok(contact)
    }
}
