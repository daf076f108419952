use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::booking::{blank_to_none, Booking, BookingPaymentStatus};
use crate::validation::{lenient_f64, normalize_currency, positive_amount, required_str};
use crate::CoreResult;

closed_enum! {
    pub enum PaymentMethod ("method") {
        Card => "card",
        Upi => "upi",
        Netbanking => "netbanking",
        Wallet => "wallet",
        Cash => "cash",
    }
}

closed_enum! {
    pub enum PaymentStatus ("status") {
        Initiated => "initiated",
        Paid => "paid",
        Failed => "failed",
        Refunded => "refunded",
    }
}

impl PaymentStatus {
    /// How recording a payment in this state moves the booking.
    pub fn booking_effect(&self) -> Option<BookingPaymentStatus> {
        match self {
            PaymentStatus::Initiated => None,
            PaymentStatus::Paid => Some(BookingPaymentStatus::Confirmed),
            PaymentStatus::Failed => Some(BookingPaymentStatus::Failed),
            PaymentStatus::Refunded => Some(BookingPaymentStatus::Refunded),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentDraft {
    pub booking_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: Option<f64>,
    pub currency: Option<String>,
    #[serde(alias = "payment_method")]
    pub method: Option<String>,
    pub status: Option<String>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub booking_id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PaymentDraft {
    pub fn booking_id(&self) -> CoreResult<String> {
        required_str(self.booking_id.as_deref(), "booking_id")
    }

    /// Validates against the booking being paid for. Amount and currency fall
    /// back to the booking's fare.
    pub fn validate(self, user_id: &str, booking: &Booking, now: DateTime<Utc>) -> CoreResult<NewPayment> {
        let method = PaymentMethod::from_str(&required_str(self.method.as_deref(), "method")?)?;
        let status = match blank_to_none(self.status) {
            Some(s) => PaymentStatus::from_str(&s)?,
            None => PaymentStatus::Initiated,
        };
        let amount = positive_amount(self.amount.unwrap_or(booking.fare_total), "amount")?;
        let currency = match blank_to_none(self.currency) {
            Some(c) => normalize_currency(&c)?,
            None => booking.currency.clone(),
        };

        Ok(NewPayment {
            booking_id: booking.id.clone(),
            user_id: user_id.to_string(),
            amount,
            currency,
            method,
            status,
            transaction_id: blank_to_none(self.transaction_id),
            paid_at: (status == PaymentStatus::Paid).then_some(now),
            created_at: now,
        })
    }
}
