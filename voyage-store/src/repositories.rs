use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use voyage_core::models::{
    Booking, BookingPaymentStatus, NewBooking, NewPayment, NewTripPlan, Payment, Role, SavedTripPlan,
    User,
};
use voyage_core::repository::{BookingRepository, PaymentRepository, TripPlanRepository, UserRepository};
use voyage_core::CoreResult;
use voyage_shared::Masked;

use crate::app_config::CollectionIds;
use crate::document::{Document, DocumentStore, ListQuery};
use crate::error::StoreResult;
use crate::json_fields::JsonFieldMode;

/// Typed repositories over any document store.
#[derive(Clone)]
pub struct DocumentRepositories {
    store: Arc<dyn DocumentStore>,
    collections: CollectionIds,
    json: JsonFieldMode,
}

impl DocumentRepositories {
    pub fn new(store: Arc<dyn DocumentStore>, collections: CollectionIds, json: JsonFieldMode) -> Self {
        Self {
            store,
            collections,
            json,
        }
    }

    fn by_owner(user_id: &str) -> ListQuery {
        ListQuery::new().equal("user_id", user_id).newest_first()
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn put_opt(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.clone()));
    }
}

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

fn user_from_document(doc: Document) -> StoreResult<User> {
    Ok(User {
        name: doc.opt_str("name").unwrap_or_default(),
        email: Masked(doc.opt_str("email").unwrap_or_default()),
        role: match doc.opt_str("role") {
            Some(_) => doc.enum_field("role")?,
            None => Role::default(),
        },
        avatar: doc.opt_str("avatar"),
        created_at: doc.created_at()?,
        id: doc.id,
    })
}

#[async_trait]
impl UserRepository for DocumentRepositories {
    async fn get_user(&self, id: &str) -> CoreResult<Option<User>> {
        let doc = self.store.get_document(&self.collections.users, id).await?;
        Ok(doc.map(user_from_document).transpose()?)
    }

    async fn create_user(&self, user: &User) -> CoreResult<()> {
        let mut data = object(json!({
            "name": user.name,
            "email": user.email.expose(),
            "role": user.role.as_str(),
            "created_at": user.created_at.to_rfc3339(),
        }));
        put_opt(&mut data, "avatar", &user.avatar);

        self.store
            .create_document(&self.collections.users, Some(&user.id), data)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// bookings
// ---------------------------------------------------------------------------

fn booking_from_document(doc: Document, json: JsonFieldMode) -> StoreResult<Booking> {
    Ok(Booking {
        user_id: doc.str_field("user_id")?,
        booking_type: doc.enum_field("type")?,
        status: doc.opt_str("status"),
        fare_total: doc.f64_field("fare_total")?,
        currency: doc.str_field("currency")?,
        payment_status: doc.enum_field("payment_status")?,
        contact_info: json.decode(doc.value("contact_info")),
        details: json.decode(doc.value("details")),
        provider: doc.opt_str("provider"),
        reference: doc.opt_str("reference"),
        created_at: doc.created_at()?,
        id: doc.id,
    })
}

#[async_trait]
impl BookingRepository for DocumentRepositories {
    async fn create_booking(&self, booking: &NewBooking) -> CoreResult<Booking> {
        let mut data = object(json!({
            "user_id": booking.user_id,
            "type": booking.booking_type.as_str(),
            "fare_total": booking.fare_total,
            "currency": booking.currency,
            "payment_status": booking.payment_status.as_str(),
            "contact_info": self.json.encode(&booking.contact_info),
            "details": self.json.encode(&booking.details),
            "created_at": booking.created_at.to_rfc3339(),
        }));
        put_opt(&mut data, "status", &booking.status);
        put_opt(&mut data, "provider", &booking.provider);
        put_opt(&mut data, "reference", &booking.reference);

        let doc = self
            .store
            .create_document(&self.collections.bookings, None, data)
            .await?;
        Ok(booking_from_document(doc, self.json)?)
    }

    async fn get_booking(&self, id: &str) -> CoreResult<Option<Booking>> {
        let doc = self.store.get_document(&self.collections.bookings, id).await?;
        Ok(doc.map(|d| booking_from_document(d, self.json)).transpose()?)
    }

    async fn update_payment_status(&self, id: &str, status: BookingPaymentStatus) -> CoreResult<()> {
        let data = object(json!({ "payment_status": status.as_str() }));
        self.store
            .update_document(&self.collections.bookings, id, data)
            .await?;
        Ok(())
    }

    async fn list_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>> {
        let docs = self
            .store
            .list_documents(&self.collections.bookings, &Self::by_owner(user_id))
            .await?;
        Ok(docs
            .into_iter()
            .map(|d| booking_from_document(d, self.json))
            .collect::<StoreResult<Vec<_>>>()?)
    }
}

// ---------------------------------------------------------------------------
// payments
// ---------------------------------------------------------------------------

fn payment_from_document(doc: Document) -> StoreResult<Payment> {
    Ok(Payment {
        booking_id: doc.str_field("booking_id")?,
        user_id: doc.str_field("user_id")?,
        amount: doc.f64_field("amount")?,
        currency: doc.str_field("currency")?,
        method: doc.enum_field("method")?,
        status: doc.enum_field("status")?,
        transaction_id: doc.opt_str("transaction_id"),
        paid_at: doc.time_field("paid_at")?,
        created_at: doc.created_at()?,
        id: doc.id,
    })
}

#[async_trait]
impl PaymentRepository for DocumentRepositories {
    async fn create_payment(&self, payment: &NewPayment) -> CoreResult<Payment> {
        let mut data = object(json!({
            "booking_id": payment.booking_id,
            "user_id": payment.user_id,
            "amount": payment.amount,
            "currency": payment.currency,
            "method": payment.method.as_str(),
            "status": payment.status.as_str(),
            "created_at": payment.created_at.to_rfc3339(),
        }));
        put_opt(&mut data, "transaction_id", &payment.transaction_id);
        put_opt(&mut data, "paid_at", &payment.paid_at.map(|t| t.to_rfc3339()));

        let doc = self
            .store
            .create_document(&self.collections.payments, None, data)
            .await?;
        Ok(payment_from_document(doc)?)
    }

    async fn list_payments(&self, user_id: &str) -> CoreResult<Vec<Payment>> {
        let docs = self
            .store
            .list_documents(&self.collections.payments, &Self::by_owner(user_id))
            .await?;
        Ok(docs
            .into_iter()
            .map(payment_from_document)
            .collect::<StoreResult<Vec<_>>>()?)
    }
}

// ---------------------------------------------------------------------------
// saved trip plans
// ---------------------------------------------------------------------------

fn plan_from_document(doc: Document, json: JsonFieldMode) -> StoreResult<SavedTripPlan> {
    let metadata = match doc.value("metadata") {
        Value::Null => None,
        stored => Some(json.decode(stored)),
    };
    Ok(SavedTripPlan {
        user_id: doc.str_field("user_id")?,
        title: doc.str_field("title")?,
        trip_plan: json.decode(doc.value("trip_plan")),
        metadata,
        created_at: doc.created_at()?,
        id: doc.id,
    })
}

#[async_trait]
impl TripPlanRepository for DocumentRepositories {
    async fn create_plan(&self, plan: &NewTripPlan) -> CoreResult<SavedTripPlan> {
        let mut data = object(json!({
            "user_id": plan.user_id,
            "title": plan.title,
            "trip_plan": self.json.encode(&plan.trip_plan),
            "created_at": plan.created_at.to_rfc3339(),
        }));
        if let Some(metadata) = &plan.metadata {
            data.insert("metadata".to_string(), self.json.encode(metadata));
        }

        let doc = self
            .store
            .create_document(&self.collections.saved_trip_plans, None, data)
            .await?;
        Ok(plan_from_document(doc, self.json)?)
    }

    async fn list_plans(&self, user_id: &str) -> CoreResult<Vec<SavedTripPlan>> {
        let docs = self
            .store
            .list_documents(&self.collections.saved_trip_plans, &Self::by_owner(user_id))
            .await?;
        Ok(docs
            .into_iter()
            .map(|d| plan_from_document(d, self.json))
            .collect::<StoreResult<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocumentStore;
    use chrono::Utc;
    use voyage_core::models::{BookingType, PaymentMethod, PaymentStatus};

    fn repos(mode: JsonFieldMode) -> (Arc<MemoryDocumentStore>, DocumentRepositories) {
        let store = Arc::new(MemoryDocumentStore::new());
        let repos = DocumentRepositories::new(store.clone(), CollectionIds::default(), mode);
        (store, repos)
    }

    fn new_booking() -> NewBooking {
        NewBooking {
            user_id: "user_01".to_string(),
            booking_type: BookingType::Hotel,
            status: None,
            fare_total: 12500.0,
            currency: "INR".to_string(),
            payment_status: BookingPaymentStatus::Pending,
            contact_info: json!({"email": "asha@example.com"}),
            details: json!({"hotel": "Taj", "nights": 2}),
            provider: Some("serpapi".to_string()),
            reference: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_booking_blobs_are_serialized_by_default() {
        let (store, repos) = repos(JsonFieldMode::Serialized);
        let booking = repos.create_booking(&new_booking()).await.unwrap();

        let raw = store.get_document("bookings", &booking.id).await.unwrap().unwrap();
        assert!(raw.data["details"].is_string());
        assert!(raw.data.get("reference").is_none());

        let fetched = repos.get_booking(&booking.id).await.unwrap().unwrap();
        assert_eq!(fetched.details["nights"], 2);
        assert_eq!(fetched.payment_status, BookingPaymentStatus::Pending);
        assert_eq!(fetched.provider.as_deref(), Some("serpapi"));
    }

    #[tokio::test]
    async fn test_payment_status_update() {
        let (_, repos) = repos(JsonFieldMode::Native);
        let booking = repos.create_booking(&new_booking()).await.unwrap();
        repos
            .update_payment_status(&booking.id, BookingPaymentStatus::Confirmed)
            .await
            .unwrap();
        let fetched = repos.get_booking(&booking.id).await.unwrap().unwrap();
        assert_eq!(fetched.payment_status, BookingPaymentStatus::Confirmed);
        assert_eq!(fetched.details["hotel"], "Taj");
    }

    #[tokio::test]
    async fn test_payment_round_trip() {
        let (_, repos) = repos(JsonFieldMode::Serialized);
        let now = Utc::now();
        let payment = repos
            .create_payment(&NewPayment {
                booking_id: "b1".to_string(),
                user_id: "user_01".to_string(),
                amount: 12500.0,
                currency: "INR".to_string(),
                method: PaymentMethod::Upi,
                status: PaymentStatus::Paid,
                transaction_id: Some("txn_1".to_string()),
                paid_at: Some(now),
                created_at: now,
            })
            .await
            .unwrap();
        assert_eq!(payment.paid_at.map(|t| t.timestamp()), Some(now.timestamp()));

        let listed = repos.list_payments("user_01").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].method, PaymentMethod::Upi);
        assert!(repos.list_payments("someone_else").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_created_under_provider_id() {
        let (_, repos) = repos(JsonFieldMode::Serialized);
        let user = User {
            id: "user_01".to_string(),
            name: "Asha".to_string(),
            email: Masked("asha@example.com".to_string()),
            role: Role::Staff,
            avatar: None,
            created_at: Utc::now(),
        };
        repos.create_user(&user).await.unwrap();
        let fetched = repos.get_user("user_01").await.unwrap().unwrap();
        assert_eq!(fetched.role, Role::Staff);
        assert_eq!(fetched.email.expose(), "asha@example.com");
        assert!(repos.create_user(&user).await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_enum_is_internal_error() {
        let (store, repos) = repos(JsonFieldMode::Serialized);
        let booking = repos.create_booking(&new_booking()).await.unwrap();
        store
            .update_document("bookings", &booking.id, object(json!({"payment_status": "lost"})))
            .await
            .unwrap();
        assert!(matches!(
            repos.get_booking(&booking.id).await,
            Err(voyage_core::CoreError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_native_plan_text_round_trips_unchanged() {
        let (_, repos) = repos(JsonFieldMode::Native);
        let text = json!(r#"{"destination": "Goa", "days": 3}"#);
        repos
            .create_plan(&NewTripPlan {
                user_id: "user_01".to_string(),
                title: "Pasted itinerary".to_string(),
                trip_plan: text.clone(),
                metadata: Some(json!({"source": "clipboard"})),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let plans = repos.list_plans("user_01").await.unwrap();
        assert_eq!(plans[0].trip_plan, text);
        assert_eq!(plans[0].metadata, Some(json!({"source": "clipboard"})));
    }

    #[tokio::test]
    async fn test_list_plans_returns_more_than_one_page() {
        let (_, repos) = repos(JsonFieldMode::Serialized);
        for day in 0..150 {
            repos
                .create_plan(&NewTripPlan {
                    user_id: "user_01".to_string(),
                    title: format!("Day trip {}", day),
                    trip_plan: json!({"day": day}),
                    metadata: None,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let plans = repos.list_plans("user_01").await.unwrap();
        assert_eq!(plans.len(), 150);
        assert!(plans.iter().any(|p| p.trip_plan["day"] == 149));
    }
}
