use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::app_config::AppwriteConfig;
use crate::document::{Document, DocumentStore, ListQuery};
use crate::error::{StoreError, StoreResult};

/// Appwrite caps a page at 5000 documents.
const MAX_PAGE: u32 = 5000;
/// Page size when walking a whole listing.
const PAGE_SIZE: u32 = 100;

/// Client for the Appwrite REST API (databases and account endpoints).
#[derive(Clone)]
pub struct AppwriteClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
    database_id: String,
}

impl AppwriteClient {
    pub fn new(config: &AppwriteConfig) -> StoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            database_id: config.database_id.clone(),
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        )
    }

    fn server_request(&self, method: Method, url: String) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
    }

    async fn send(request: RequestBuilder) -> StoreResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Value>().await?);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body["message"]
            .as_str()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error"))
            .to_string();
        Err(StoreError::Appwrite {
            status: status.as_u16(),
            message,
        })
    }

    /// Resolve a client session JWT to its account (`GET /account`).
    /// Sent without the API key so the JWT alone decides who the caller is.
    pub async fn get_account(&self, jwt: &str) -> StoreResult<Value> {
        let request = self
            .http
            .get(format!("{}/account", self.endpoint))
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-JWT", jwt);
        Self::send(request).await
    }
}

#[async_trait]
impl DocumentStore for AppwriteClient {
    async fn create_document(
        &self,
        collection: &str,
        document_id: Option<&str>,
        data: Map<String, Value>,
    ) -> StoreResult<Document> {
        let body = json!({
            "documentId": document_id.unwrap_or("unique()"),
            "data": data,
        });
        let request = self
            .server_request(Method::POST, self.documents_url(collection))
            .json(&body);

        match Self::send(request).await {
            Ok(value) => {
                let document = document_from_json(value)?;
                debug!("Created {}/{}", collection, document.id);
                Ok(document)
            }
            Err(StoreError::Appwrite { status: 409, .. }) => Err(StoreError::Conflict {
                collection: collection.to_string(),
                id: document_id.unwrap_or_default().to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        match Self::send(self.server_request(Method::GET, url)).await {
            Ok(value) => Ok(Some(document_from_json(value)?)),
            Err(StoreError::Appwrite { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> StoreResult<Document> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        let request = self
            .server_request(Method::PATCH, url)
            .json(&json!({ "data": data }));

        match Self::send(request).await {
            Ok(value) => document_from_json(value),
            Err(StoreError::Appwrite { status: 404, .. }) => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// An explicit `limit` is one request; otherwise every page is fetched.
    async fn list_documents(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<Document>> {
        if query.limit.is_some() {
            return self.list_page(collection, query, None).await;
        }

        let documents = collect_pages(PAGE_SIZE as usize, |cursor| async move {
            self.list_page(collection, query, cursor.as_deref()).await
        })
        .await?;
        debug!("Listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }
}

impl AppwriteClient {
    async fn list_page(
        &self,
        collection: &str,
        query: &ListQuery,
        cursor_after: Option<&str>,
    ) -> StoreResult<Vec<Document>> {
        let request = self
            .server_request(Method::GET, self.documents_url(collection))
            .query(&query_params(query, cursor_after));
        let value = Self::send(request).await?;

        let documents = match value.get("documents").and_then(Value::as_array) {
            Some(docs) => docs,
            None => {
                warn!("Appwrite list for {} returned no 'documents' array", collection);
                return Ok(Vec::new());
            }
        };
        documents.iter().cloned().map(document_from_json).collect()
    }
}

/// Follows `cursorAfter` from the last id of each page until a page comes back short.
async fn collect_pages<F, Fut>(page_size: usize, mut fetch: F) -> StoreResult<Vec<Document>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = StoreResult<Vec<Document>>>,
{
    let mut documents = Vec::new();
    let mut cursor = None;
    loop {
        let page = fetch(cursor.take()).await?;
        let short = page.len() < page_size;
        cursor = page.last().map(|d| d.id.clone());
        documents.extend(page);
        if short || cursor.is_none() {
            return Ok(documents);
        }
    }
}

/// Splits Appwrite's `$`-prefixed system attributes from the user data.
pub fn document_from_json(value: Value) -> StoreResult<Document> {
    let Value::Object(mut map) = value else {
        return Err(StoreError::Decode("document is not an object".to_string()));
    };

    let id = match map.remove("$id") {
        Some(Value::String(id)) => id,
        _ => return Err(StoreError::Decode("document without $id".to_string())),
    };
    let created_at = map
        .get("$createdAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| StoreError::Decode(format!("{}: missing or bad $createdAt", id)))?;

    map.retain(|key, _| !key.starts_with('$'));
    Ok(Document {
        id,
        created_at,
        data: map,
    })
}

/// Appwrite 1.5+ JSON query syntax, one `queries[]` entry per clause.
pub fn query_params(query: &ListQuery, cursor_after: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = query
        .equal
        .iter()
        .map(|(field, value)| {
            let clause = json!({"method": "equal", "attribute": field, "values": [value]});
            ("queries[]", clause.to_string())
        })
        .collect();

    if query.newest_first {
        let clause = json!({"method": "orderDesc", "attribute": "$createdAt"});
        params.push(("queries[]", clause.to_string()));
    }

    if let Some(cursor) = cursor_after {
        let clause = json!({"method": "cursorAfter", "values": [cursor]});
        params.push(("queries[]", clause.to_string()));
    }

    let limit = query.limit.unwrap_or(PAGE_SIZE).min(MAX_PAGE);
    params.push(("queries[]", json!({"method": "limit", "values": [limit]}).to_string()));
    params
}
