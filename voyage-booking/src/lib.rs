pub mod accounts;
pub mod notifications;
pub mod recorder;
pub mod trip_plans;

#[cfg(test)]
mod test_support;

pub use accounts::UserDirectory;
pub use notifications::{Notification, NotificationFeed, NotificationKind};
pub use recorder::{BookingRecorder, PaymentReceipt};
pub use trip_plans::TripPlanStore;
