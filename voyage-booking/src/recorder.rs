use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use voyage_core::events::EventSink;
use voyage_core::models::{
    Booking, BookingDraft, BookingPaymentStatus, Payment, PaymentDraft, PaymentStatus,
};
use voyage_core::repository::{BookingRepository, PaymentRepository, UserRepository};
use voyage_core::{CoreError, CoreResult};
use voyage_shared::models::events::{BookingSavedEvent, DomainEvent, PaymentRecordedEvent};

/// What the caller gets back after a payment is recorded.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub status: PaymentStatus,
    /// The booking's payment state after this payment was applied.
    pub booking_payment_status: BookingPaymentStatus,
    #[serde(skip)]
    pub payment: Payment,
}

/// Records bookings and the payments made against them.
pub struct BookingRecorder {
    users: Arc<dyn UserRepository>,
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    events: Arc<dyn EventSink>,
}

impl BookingRecorder {
    pub fn new(
        users: Arc<dyn UserRepository>,
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            users,
            bookings,
            payments,
            events,
        }
    }

    async fn require_user(&self, user_id: &str) -> CoreResult<()> {
        match self.users.get_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::validation(format!("Unknown user '{}'", user_id))),
        }
    }

    /// Persist a new booking for `user_id`. Bookings always start `pending`.
    pub async fn save_booking(&self, user_id: &str, draft: BookingDraft) -> CoreResult<Booking> {
        let new_booking = draft.validate(user_id, Utc::now())?;
        self.require_user(user_id).await?;

        let booking = self.bookings.create_booking(&new_booking).await?;
        info!(
            booking_id = %booking.id,
            booking_type = %booking.booking_type,
            "Saved booking {} {:.2}",
            booking.currency,
            booking.fare_total
        );

        self.events
            .publish(DomainEvent::BookingSaved(BookingSavedEvent {
                booking_id: booking.id.clone(),
                user_id: booking.user_id.clone(),
                booking_type: booking.booking_type.to_string(),
                fare_total: booking.fare_total,
                currency: booking.currency.clone(),
                timestamp: booking.created_at.timestamp(),
            }))
            .await;

        Ok(booking)
    }

    /// Record a payment against one of the caller's bookings and move the
    /// booking's `payment_status` accordingly.
    pub async fn save_payment(&self, user_id: &str, draft: PaymentDraft) -> CoreResult<PaymentReceipt> {
        let booking_id = draft.booking_id()?;
        let booking = match self.bookings.get_booking(&booking_id).await? {
            Some(b) if b.user_id == user_id => b,
            Some(_) => {
                warn!(booking_id = %booking_id, "Payment attempted on another user's booking");
                return Err(CoreError::validation(format!("Booking '{}' not found", booking_id)));
            }
            None => return Err(CoreError::validation(format!("Booking '{}' not found", booking_id))),
        };

        let new_payment = draft.validate(user_id, &booking, Utc::now())?;
        let payment = self.payments.create_payment(&new_payment).await?;

        let booking_payment_status = match payment.status.booking_effect() {
            Some(next) if next != booking.payment_status => {
                // The payment is already written; a failed update leaves the booking at its old status.
                if let Err(e) = self.bookings.update_payment_status(&booking.id, next).await {
                    warn!(
                        payment_id = %payment.id,
                        booking_id = %booking.id,
                        "Payment recorded but booking status update to {} failed: {}",
                        next,
                        e
                    );
                    return Err(e);
                }
                info!(
                    booking_id = %booking.id,
                    "Booking payment status {} -> {}",
                    booking.payment_status,
                    next
                );
                next
            }
            _ => booking.payment_status,
        };

        self.events
            .publish(DomainEvent::PaymentRecorded(PaymentRecordedEvent {
                payment_id: payment.id.clone(),
                booking_id: booking.id.clone(),
                user_id: user_id.to_string(),
                amount: payment.amount,
                currency: payment.currency.clone(),
                status: payment.status.to_string(),
                booking_payment_status: booking_payment_status.to_string(),
                timestamp: payment.created_at.timestamp(),
            }))
            .await;

        Ok(PaymentReceipt {
            payment_id: payment.id.clone(),
            status: payment.status,
            booking_payment_status,
            payment,
        })
    }

    pub async fn list_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>> {
        self.bookings.list_bookings(user_id).await
    }
}
