use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingSavedEvent {
    pub booking_id: String,
    pub user_id: String,
    pub booking_type: String,
    pub fare_total: f64,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaymentRecordedEvent {
    pub payment_id: String,
    pub booking_id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    /// Booking payment status after the payment was applied.
    pub booking_payment_status: String,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TripPlanSavedEvent {
    pub plan_id: String,
    pub user_id: String,
    pub title: String,
    pub timestamp: i64,
}

/// Everything the recorder announces after a successful write.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    BookingSaved(BookingSavedEvent),
    PaymentRecorded(PaymentRecordedEvent),
    TripPlanSaved(TripPlanSavedEvent),
}

impl DomainEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            DomainEvent::BookingSaved(_) => "booking.saved",
            DomainEvent::PaymentRecorded(_) => "payment.recorded",
            DomainEvent::TripPlanSaved(_) => "trip_plan.saved",
        }
    }

    /// Partition key: the document the event is about.
    pub fn key(&self) -> &str {
        match self {
            DomainEvent::BookingSaved(e) => &e.booking_id,
            DomainEvent::PaymentRecorded(e) => &e.booking_id,
            DomainEvent::TripPlanSaved(e) => &e.plan_id,
        }
    }
}

/// Wire envelope for published events.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EventEnvelope {
    pub id: Uuid,
    #[serde(flatten)]
    pub event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
        }
    }
}
