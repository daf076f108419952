use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{Document, DocumentStore, ListQuery};
use crate::error::{StoreError, StoreResult};

/// Process-local document store for development and tests.
#[derive(Default)]
pub struct MemoryDocumentStore {
    // collection -> documents in insertion order
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create_document(
        &self,
        collection: &str,
        document_id: Option<&str>,
        data: Map<String, Value>,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();

        let id = match document_id {
            Some(id) if documents.iter().any(|d| d.id == id) => {
                return Err(StoreError::Conflict {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
            Some(id) => id.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };

        let document = Document {
            id,
            created_at: Utc::now(),
            data,
        };
        documents.push(document.clone());
        Ok(document)
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        document.data.extend(data);
        Ok(document.clone())
    }

    async fn list_documents(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = if query.newest_first {
            documents.iter().rev().filter(|d| query.matches(d)).cloned().collect()
        } else {
            documents.iter().filter(|d| query.matches(d)).cloned().collect()
        };
        if query.newest_first {
            // stable: equal timestamps keep reverse insertion order
            matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let store = MemoryDocumentStore::new();
        let doc = store
            .create_document("bookings", None, data(json!({"user_id": "u1", "payment_status": "pending"})))
            .await
            .unwrap();

        let fetched = store.get_document("bookings", &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched, doc);

        let updated = store
            .update_document("bookings", &doc.id, data(json!({"payment_status": "confirmed"})))
            .await
            .unwrap();
        assert_eq!(updated.data["payment_status"], "confirmed");
        assert_eq!(updated.data["user_id"], "u1");

        assert!(store.get_document("bookings", "missing").await.unwrap().is_none());
        assert!(matches!(
            store.update_document("bookings", "missing", Map::new()).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_explicit_ids_conflict() {
        let store = MemoryDocumentStore::new();
        store.create_document("users", Some("user_01"), Map::new()).await.unwrap();
        assert!(matches!(
            store.create_document("users", Some("user_01"), Map::new()).await,
            Err(StoreError::Conflict { .. })
        ));
        assert_eq!(store.count("users").await, 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let store = MemoryDocumentStore::new();
        for (user, n) in [("u1", 1), ("u2", 2), ("u1", 3)] {
            store
                .create_document("plans", None, data(json!({"user_id": user, "n": n})))
                .await
                .unwrap();
        }

        let query = ListQuery::new().equal("user_id", "u1").newest_first();
        let docs = store.list_documents("plans", &query).await.unwrap();
        let ns: Vec<i64> = docs.iter().map(|d| d.data["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![3, 1]);

        let docs = store
            .list_documents("plans", &ListQuery::new().limit(1))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert!(store.list_documents("empty", &ListQuery::new()).await.unwrap().is_empty());
    }
}
