use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{StoreError, StoreResult};

/// A stored document: system id and creation time plus the attribute map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn value(&self, field: &str) -> Value {
        self.data.get(field).cloned().unwrap_or(Value::Null)
    }

    pub fn str_field(&self, field: &str) -> StoreResult<String> {
        self.opt_str(field)
            .ok_or_else(|| StoreError::Decode(format!("{}: missing string '{}'", self.id, field)))
    }

    pub fn opt_str(&self, field: &str) -> Option<String> {
        self.data
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn f64_field(&self, field: &str) -> StoreResult<f64> {
        self.data
            .get(field)
            .and_then(Value::as_f64)
            .ok_or_else(|| StoreError::Decode(format!("{}: missing number '{}'", self.id, field)))
    }

    pub fn enum_field<T>(&self, field: &str) -> StoreResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.str_field(field)?;
        T::from_str(&raw).map_err(|e| StoreError::Decode(format!("{}: {}", self.id, e)))
    }

    pub fn time_field(&self, field: &str) -> StoreResult<Option<DateTime<Utc>>> {
        match self.data.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|e| StoreError::Decode(format!("{}: bad timestamp '{}': {}", self.id, field, e))),
            Some(other) => Err(StoreError::Decode(format!(
                "{}: '{}' is not a timestamp: {}",
                self.id, field, other
            ))),
        }
    }

    /// The `created_at` attribute, falling back to the system creation time.
    pub fn created_at(&self) -> StoreResult<DateTime<Utc>> {
        Ok(self.time_field("created_at")?.unwrap_or(self.created_at))
    }
}

/// Filter and ordering for a collection listing.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub equal: Vec<(String, String)>,
    pub newest_first: bool,
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equal(mut self, field: &str, value: &str) -> Self {
        self.equal.push((field.to_string(), value.to_string()));
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.equal
            .iter()
            .all(|(field, value)| document.data.get(field).and_then(Value::as_str) == Some(value.as_str()))
    }
}

/// The collection/document API of the hosted database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document; `document_id = None` lets the store generate one.
    async fn create_document(
        &self,
        collection: &str,
        document_id: Option<&str>,
        data: Map<String, Value>,
    ) -> StoreResult<Document>;

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Merge `data` into an existing document.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> StoreResult<Document>;

    async fn list_documents(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<Document>>;
}
