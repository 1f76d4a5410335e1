//! Typed collections
//!
//! [`Collection<T>`] wraps the raw document store for one model type. The
//! model's `id` is kept out of the stored JSON and put back on read.

use std::marker::PhantomData;

use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::query::{Filter, Query};
use super::store::{DynDocumentStore, JsonObject, StoredDocument};

/// A model stored in a named collection
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Collection name
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

/// Typed access to one collection
pub struct Collection<T> {
    store: DynDocumentStore,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(from_stored)
            .transpose()
    }

    /// Store a new document under a generated id and return it with the id set
    pub async fn create(&self, mut doc: T) -> Result<T> {
        let id = self.store.create(T::COLLECTION, &to_object(&doc)?).await?;
        doc.set_id(id);
        Ok(doc)
    }

    /// Replace the document stored under `doc.id()`
    pub async fn set(&self, doc: &T) -> Result<()> {
        self.store
            .set(T::COLLECTION, doc.id(), &to_object(doc)?)
            .await
    }

    /// Merge raw fields into a stored document
    pub async fn update(&self, id: &str, fields: &JsonObject) -> Result<bool> {
        self.store.update(T::COLLECTION, id, fields).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.store.delete(T::COLLECTION, id).await
    }

    pub async fn find(&self, query: &Query) -> Result<Vec<T>> {
        self.store
            .query(T::COLLECTION, query)
            .await?
            .into_iter()
            .map(from_stored)
            .collect()
    }

    /// First document matching the query, if any
    pub async fn find_one(&self, query: Query) -> Result<Option<T>> {
        Ok(self.find(&query.limit(1)).await?.into_iter().next())
    }

    pub async fn count(&self, filters: &[Filter]) -> Result<u64> {
        self.store.count(T::COLLECTION, filters).await
    }

    pub async fn increment(&self, id: &str, field: &'static str, updated_at: &str) -> Result<bool> {
        self.store
            .increment(T::COLLECTION, id, field, updated_at)
            .await
    }

    pub async fn delete_all(&self) -> Result<u64> {
        self.store.delete_all(T::COLLECTION).await
    }
}

/// Serialize a model into its stored form, without the id
fn to_object<T: Serialize>(doc: &T) -> Result<JsonObject> {
    match serde_json::to_value(doc).context("Failed to serialize document")? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        _ => Err(anyhow!("document did not serialize to a JSON object")),
    }
}

fn from_stored<T: DeserializeOwned>(stored: StoredDocument) -> Result<T> {
    let StoredDocument { id, mut data } = stored;
    data.insert("id".to_string(), Value::String(id.clone()));
    serde_json::from_value(Value::Object(data))
        .with_context(|| format!("Failed to decode document {}", id))
}
