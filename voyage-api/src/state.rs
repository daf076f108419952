use std::sync::Arc;
use voyage_booking::{BookingRecorder, NotificationFeed, TripPlanStore, UserDirectory};
use voyage_core::events::EventSink;
use voyage_core::identity::SessionVerifier;
use voyage_core::providers::{
    ChatAssistant, FlightSearch, Geocoder, HotelSearch, SpeechSynthesizer, Transcriber, Translator,
};
use voyage_core::repository::{BookingRepository, PaymentRepository, TripPlanRepository, UserRepository};
use voyage_store::RedisClient;

/// External services the handlers call out to.
#[derive(Clone)]
pub struct Providers {
    pub chat: Arc<dyn ChatAssistant>,
    pub translator: Arc<dyn Translator>,
    pub flights: Arc<dyn FlightSearch>,
    pub hotels: Arc<dyn HotelSearch>,
    pub geocoder: Arc<dyn Geocoder>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
}

#[derive(Clone)]
pub struct AppState {
    pub recorder: Arc<BookingRecorder>,
    pub trip_plans: Arc<TripPlanStore>,
    pub notifications: Arc<NotificationFeed>,
    pub users: Arc<UserDirectory>,
    pub verifier: Arc<dyn SessionVerifier>,
    pub providers: Providers,
    pub redis: Option<Arc<RedisClient>>,
    pub search_cache_ttl: u64,
}

impl AppState {
    /// Wires the booking services over one repository implementation.
    pub fn new<R>(
        repos: Arc<R>,
        events: Arc<dyn EventSink>,
        verifier: Arc<dyn SessionVerifier>,
        providers: Providers,
    ) -> Self
    where
        R: UserRepository + BookingRepository + PaymentRepository + TripPlanRepository + 'static,
    {
        Self {
            recorder: Arc::new(BookingRecorder::new(
                repos.clone(),
                repos.clone(),
                repos.clone(),
                events.clone(),
            )),
            trip_plans: Arc::new(TripPlanStore::new(repos.clone(), repos.clone(), events)),
            notifications: Arc::new(NotificationFeed::new(repos.clone(), repos.clone())),
            users: Arc::new(UserDirectory::new(repos)),
            verifier,
            providers,
            redis: None,
            search_cache_ttl: 300,
        }
    }

    pub fn with_search_cache(mut self, redis: Arc<RedisClient>, ttl_seconds: u64) -> Self {
        self.redis = Some(redis);
        self.search_cache_ttl = ttl_seconds;
        self
    }
}
