use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use tracing::info;
use voyage_booking::{Notification, PaymentReceipt};
use voyage_core::identity::AuthUser;
use voyage_core::models::{Booking, BookingDraft, BookingPaymentStatus, PaymentDraft};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Routes that need an authenticated caller; layered with `require_auth`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/save-booking", post(save_booking))
        .route("/api/save-payment", post(save_payment))
        .route("/api/my-bookings", get(my_bookings))
        .route("/api/notifications", get(notifications))
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking_id: String,
    payment_status: BookingPaymentStatus,
}

async fn save_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(draft): ApiJson<BookingDraft>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let booking = state.recorder.save_booking(&user.id, draft).await?;
    info!("Booking {} saved for {}", booking.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            booking_id: booking.id,
            payment_status: booking.payment_status,
        }),
    ))
}

async fn save_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(draft): ApiJson<PaymentDraft>,
) -> Result<(StatusCode, Json<PaymentReceipt>), AppError> {
    let receipt = state.recorder.save_payment(&user.id, draft).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[derive(Debug, Serialize)]
struct BookingsResponse {
    bookings: Vec<Booking>,
}

async fn my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<BookingsResponse>, AppError> {
    let bookings = state.recorder.list_bookings(&user.id).await?;
    Ok(Json(BookingsResponse { bookings }))
}

#[derive(Debug, Serialize)]
struct NotificationsResponse {
    notifications: Vec<Notification>,
}

async fn notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<NotificationsResponse>, AppError> {
    let notifications = state.notifications.for_user(&user.id).await?;
    Ok(Json(NotificationsResponse { notifications }))
}
