pub mod booking;
pub mod payment;
pub mod trip_plan;
pub mod user;

pub use booking::{Booking, BookingDraft, BookingPaymentStatus, BookingType, NewBooking};
pub use payment::{NewPayment, Payment, PaymentDraft, PaymentMethod, PaymentStatus};
pub use trip_plan::{NewTripPlan, SavedTripPlan, TripPlanDraft, DEFAULT_TITLE};
pub use user::{Role, User};
