use async_trait::async_trait;

use crate::models::{
    Booking, BookingPaymentStatus, NewBooking, NewPayment, NewTripPlan, Payment, SavedTripPlan, User,
};
use crate::CoreResult;

/// Repository trait for the `users` collection
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: &str) -> CoreResult<Option<User>>;

    /// Insert a user document under the identity provider's id.
    async fn create_user(&self, user: &User) -> CoreResult<()>;
}

/// Repository trait for the `bookings` collection
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, booking: &NewBooking) -> CoreResult<Booking>;

    async fn get_booking(&self, id: &str) -> CoreResult<Option<Booking>>;

    async fn update_payment_status(&self, id: &str, status: BookingPaymentStatus) -> CoreResult<()>;

    /// Newest first.
    async fn list_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>>;
}

/// Repository trait for the `payments` collection
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create_payment(&self, payment: &NewPayment) -> CoreResult<Payment>;

    /// Newest first.
    async fn list_payments(&self, user_id: &str) -> CoreResult<Vec<Payment>>;
}

/// Repository trait for the `saved_trip_plans` collection
#[async_trait]
pub trait TripPlanRepository: Send + Sync {
    async fn create_plan(&self, plan: &NewTripPlan) -> CoreResult<SavedTripPlan>;

    /// Newest first.
    async fn list_plans(&self, user_id: &str) -> CoreResult<Vec<SavedTripPlan>>;
}
