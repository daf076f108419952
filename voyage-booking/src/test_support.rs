use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use voyage_core::events::EventSink;
use voyage_core::models::{Role, User};
use voyage_core::repository::UserRepository;
use voyage_shared::models::events::DomainEvent;
use voyage_shared::Masked;
use voyage_store::app_config::CollectionIds;
use voyage_store::{DocumentRepositories, JsonFieldMode, MemoryDocumentStore};

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<DomainEvent>>,
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn repositories(mode: JsonFieldMode) -> Arc<DocumentRepositories> {
    Arc::new(DocumentRepositories::new(
        Arc::new(MemoryDocumentStore::new()),
        CollectionIds::default(),
        mode,
    ))
}

pub async fn seed_user(repos: &DocumentRepositories, id: &str) {
    repos
        .create_user(&User {
            id: id.to_string(),
            name: "Asha".to_string(),
            email: Masked(format!("{}@example.com", id)),
            role: Role::User,
            avatar: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
}
