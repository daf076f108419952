pub mod app_config;
pub mod appwrite;
pub mod document;
pub mod error;
pub mod events;
pub mod json_fields;
pub mod memory;
pub mod redis_repo;
pub mod repositories;

pub use appwrite::AppwriteClient;
pub use document::{Document, DocumentStore, ListQuery};
pub use error::{StoreError, StoreResult};
pub use events::TracingEventSink;
pub use json_fields::JsonFieldMode;
pub use memory::MemoryDocumentStore;
pub use redis_repo::RedisClient;
pub use repositories::DocumentRepositories;
