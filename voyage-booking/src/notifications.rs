use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use voyage_core::models::{Booking, Payment, PaymentStatus};
use voyage_core::repository::{BookingRepository, PaymentRepository};
use voyage_core::CoreResult;

pub const FEED_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingCreated,
    PaymentInitiated,
    PaymentPaid,
    PaymentFailed,
    PaymentRefunded,
}

impl From<PaymentStatus> for NotificationKind {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Initiated => NotificationKind::PaymentInitiated,
            PaymentStatus::Paid => NotificationKind::PaymentPaid,
            PaymentStatus::Failed => NotificationKind::PaymentFailed,
            PaymentStatus::Refunded => NotificationKind::PaymentRefunded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub booking_id: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn for_booking(booking: &Booking) -> Self {
        Self {
            id: format!("booking-{}", booking.id),
            kind: NotificationKind::BookingCreated,
            title: format!("{} booking created", capitalize(booking.booking_type.as_str())),
            message: format!(
                "Your {} booking for {} {:.2} is {}.",
                booking.booking_type, booking.currency, booking.fare_total, booking.payment_status
            ),
            booking_id: booking.id.clone(),
            created_at: booking.created_at,
        }
    }

    fn for_payment(payment: &Payment) -> Self {
        let amount = format!("{} {:.2}", payment.currency, payment.amount);
        let (title, message) = match payment.status {
            PaymentStatus::Initiated => (
                "Payment started",
                format!("A {} payment of {} was started.", payment.method, amount),
            ),
            PaymentStatus::Paid => ("Payment received", format!("We received your payment of {}.", amount)),
            PaymentStatus::Failed => (
                "Payment failed",
                format!("Your payment of {} did not go through.", amount),
            ),
            PaymentStatus::Refunded => ("Payment refunded", format!("{} has been refunded.", amount)),
        };

        Self {
            id: format!("payment-{}", payment.id),
            kind: payment.status.into(),
            title: title.to_string(),
            message,
            booking_id: payment.booking_id.clone(),
            created_at: payment.paid_at.unwrap_or(payment.created_at),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Merge bookings and payments into one feed, newest first, at most `limit` entries.
pub fn build_feed(bookings: &[Booking], payments: &[Payment], limit: usize) -> Vec<Notification> {
    let mut feed: Vec<Notification> = bookings
        .iter()
        .map(Notification::for_booking)
        .chain(payments.iter().map(Notification::for_payment))
        .collect();

    feed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    feed.truncate(limit);
    feed
}

/// Per-user activity feed derived from stored bookings and payments.
pub struct NotificationFeed {
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl NotificationFeed {
    pub fn new(bookings: Arc<dyn BookingRepository>, payments: Arc<dyn PaymentRepository>) -> Self {
        Self { bookings, payments }
    }

    pub async fn for_user(&self, user_id: &str) -> CoreResult<Vec<Notification>> {
        let bookings = self.bookings.list_bookings(user_id).await?;
        let payments = self.payments.list_payments(user_id).await?;
        Ok(build_feed(&bookings, &payments, FEED_LIMIT))
    }
}
