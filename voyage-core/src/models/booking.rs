use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::validation::{lenient_f64, non_negative_amount, normalize_currency, opaque_json, required_str};
use crate::{CoreError, CoreResult};

closed_enum! {
    pub enum BookingType ("type") {
        Flight => "flight",
        Hotel => "hotel",
        Train => "train",
        Bus => "bus",
        Car => "car",
        Package => "package",
    }
}

closed_enum! {
    /// Payment state tracked on the booking itself.
    pub enum BookingPaymentStatus ("payment_status") {
        Pending => "pending",
        Confirmed => "confirmed",
        Failed => "failed",
        Refunded => "refunded",
    }
}

/// A reservation request as stored in `bookings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub booking_type: BookingType,
    pub status: Option<String>,
    pub fare_total: f64,
    pub currency: String,
    pub payment_status: BookingPaymentStatus,
    pub contact_info: Value,
    pub details: Value,
    pub provider: Option<String>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Unvalidated save-booking input, straight from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingDraft {
    #[serde(rename = "type", alias = "booking_type")]
    pub booking_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fare_total: Option<f64>,
    pub currency: Option<String>,
    pub contact_info: Option<Value>,
    pub details: Option<Value>,
    pub status: Option<String>,
    pub provider: Option<String>,
    pub reference: Option<String>,
}

/// A validated booking, ready to be written.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: String,
    pub booking_type: BookingType,
    pub status: Option<String>,
    pub fare_total: f64,
    pub currency: String,
    pub payment_status: BookingPaymentStatus,
    pub contact_info: Value,
    pub details: Value,
    pub provider: Option<String>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookingDraft {
    pub fn validate(self, user_id: &str, now: DateTime<Utc>) -> CoreResult<NewBooking> {
        let booking_type = BookingType::from_str(&required_str(self.booking_type.as_deref(), "type")?)?;
        let fare_total = self
            .fare_total
            .ok_or_else(|| CoreError::validation("'fare_total' is required"))?;
        let fare_total = non_negative_amount(fare_total, "fare_total")?;
        let currency = normalize_currency(&required_str(self.currency.as_deref(), "currency")?)?;

        Ok(NewBooking {
            user_id: user_id.to_string(),
            booking_type,
            status: blank_to_none(self.status),
            fare_total,
            currency,
            payment_status: BookingPaymentStatus::Pending,
            contact_info: opaque_json(self.contact_info),
            details: opaque_json(self.details),
            provider: blank_to_none(self.provider),
            reference: blank_to_none(self.reference),
            created_at: now,
        })
    }
}

pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(json: &str) -> BookingDraft {
        serde_json::from_str(json).expect("Failed to deserialize")
    }

    #[test]
    fn test_hotel_booking_starts_pending() {
        let booking = draft(
            r#"{
                "type": "hotel",
                "fare_total": 12500.0,
                "currency": "inr",
                "contact_info": {"email": "asha@example.com"},
                "details": "{\"hotel\": \"Taj\", \"nights\": 2}"
            }"#,
        )
        .validate("user_01", Utc::now())
        .unwrap();

        assert_eq!(booking.booking_type, BookingType::Hotel);
        assert_eq!(booking.payment_status, BookingPaymentStatus::Pending);
        assert_eq!(booking.currency, "INR");
        assert_eq!(booking.details["nights"], 2);
        assert_eq!(booking.user_id, "user_01");
    }

    #[test]
    fn test_missing_required_fields() {
        for json in [
            r#"{"fare_total": 10, "currency": "USD"}"#,
            r#"{"type": "bus", "currency": "USD"}"#,
            r#"{"type": "bus", "fare_total": 10}"#,
        ] {
            let err = draft(json).validate("user_01", Utc::now()).unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)), "{} -> {:?}", json, err);
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = draft(r#"{"type": "cruise", "fare_total": 10, "currency": "USD"}"#)
            .validate("user_01", Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("flight|hotel|train|bus|car|package"));
    }

    #[test]
    fn test_booking_serializes_type_field() {
        let booking = draft(r#"{"type": "flight", "fare_total": "4999", "currency": "INR"}"#)
            .validate("user_01", Utc::now())
            .unwrap();
        let stored = Booking {
            id: "b1".to_string(),
            user_id: booking.user_id,
            booking_type: booking.booking_type,
            status: booking.status,
            fare_total: booking.fare_total,
            currency: booking.currency,
            payment_status: booking.payment_status,
            contact_info: booking.contact_info,
            details: booking.details,
            provider: booking.provider,
            reference: booking.reference,
            created_at: booking.created_at,
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["type"], "flight");
        assert_eq!(json["payment_status"], "pending");
        assert_eq!(json["fare_total"], 4999.0);
    }
}
