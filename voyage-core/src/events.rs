use async_trait::async_trait;
use voyage_shared::models::events::DomainEvent;

/// Destination for domain events. Publishing is best-effort: a failed
/// publish is logged by the sink and never fails the write that caused it.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: DomainEvent);
}
